use alloc::boxed::Box;
use alloc::collections::VecDeque;

use audiopipe_core::{AudioConfig, Frame, PlanarBuffers};
use audiopipe_graph::{Arg, ControlCommand, ControlResult, Filter, FilterRuntimeError, OpenError};

use crate::args;
use crate::dsp;

/// `format` — forces a specific sample format (e.g. `format=s16`),
/// leaving channel layout and rate untouched. Aliased from `force` by the
/// registry. Detaches itself if the requested format already matches
/// what the predecessor produces, so adding one redundantly is a no-op.
pub struct FormatFilter {
    target_format: Option<audiopipe_core::SampleFormat>,
    fmt_out: AudioConfig,
}

pub fn open(args: &[Arg]) -> Result<Box<dyn Filter>, OpenError> {
    let target_format = match args::find(args, "format") {
        Some(s) => Some(
            args::parse_sample_format(s)
                .ok_or_else(|| OpenError::BadOptions(alloc::format!("unknown format {s:?}")))?,
        ),
        None => None,
    };
    Ok(Box::new(FormatFilter {
        target_format,
        fmt_out: AudioConfig::null(),
    }))
}

impl Filter for FormatFilter {
    fn control(&mut self, cmd: ControlCommand<'_>) -> ControlResult {
        match cmd {
            ControlCommand::Reinit { input, .. } => {
                if !input.is_valid() || input.format.is_spdif() {
                    return ControlResult::False;
                }
                let mut out = input.clone();
                if let Some(target) = self.target_format {
                    out.format = target;
                }
                if out == *input {
                    return ControlResult::Detach;
                }
                self.fmt_out = out;
                ControlResult::Ok
            }
            ControlCommand::Reset => ControlResult::Ok,
            _ => ControlResult::Unknown,
        }
    }

    fn fmt_out(&self) -> AudioConfig {
        self.fmt_out.clone()
    }

    fn filter_frame(
        &mut self,
        out_queue: &mut VecDeque<Frame>,
        frame: Option<Frame>,
    ) -> Result<(), FilterRuntimeError> {
        let Some(frame) = frame else {
            return Ok(());
        };
        let PlanarBuffers::Interleaved(bytes) = &frame.data else {
            return Err(FilterRuntimeError::new(
                "format",
                "planar and compressed buffers are not supported by this filter",
            ));
        };
        let samples = dsp::to_f32_interleaved(bytes, frame.config.format);
        let converted = dsp::from_f32_interleaved(&samples, self.fmt_out.format);
        out_queue.push_back(Frame::new(
            self.fmt_out.clone(),
            frame.samples,
            frame.pts,
            PlanarBuffers::Interleaved(converted),
        ));
        Ok(())
    }
}
