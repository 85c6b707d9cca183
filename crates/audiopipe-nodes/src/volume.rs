use alloc::boxed::Box;
use alloc::collections::VecDeque;

use audiopipe_core::{AudioConfig, Frame, PlanarBuffers};
use audiopipe_graph::{Arg, ControlCommand, ControlResult, Filter, FilterRuntimeError, OpenError};

use crate::args;
use crate::dsp;

/// `volume` — linear gain applied to PCM samples. Inserted by the volume
/// controller under the label `"softvol"` when nothing else in the
/// chain accepts `SetVolume`; may also be added by the user directly, in
/// which case `SetVolume` finds it first (tail-to-head dispatch).
pub struct VolumeFilter {
    gain: f32,
    fmt: AudioConfig,
}

pub fn open(args: &[Arg]) -> Result<Box<dyn Filter>, OpenError> {
    let gain = match args::find(args, "volume") {
        Some(s) => args::parse_f32(s)
            .ok_or_else(|| OpenError::BadOptions(alloc::format!("invalid volume {s:?}")))?,
        None => 1.0,
    };
    Ok(Box::new(VolumeFilter {
        gain,
        fmt: AudioConfig::null(),
    }))
}

impl Filter for VolumeFilter {
    fn control(&mut self, cmd: ControlCommand<'_>) -> ControlResult {
        match cmd {
            ControlCommand::Reinit { input, .. } => {
                if !input.is_valid() {
                    return ControlResult::Error;
                }
                self.fmt = input.clone();
                ControlResult::Ok
            }
            ControlCommand::SetVolume(gain) => {
                self.gain = gain;
                ControlResult::Ok
            }
            ControlCommand::Reset => ControlResult::Ok,
            _ => ControlResult::Unknown,
        }
    }

    fn fmt_out(&self) -> AudioConfig {
        self.fmt.clone()
    }

    fn filter_frame(
        &mut self,
        out_queue: &mut VecDeque<Frame>,
        frame: Option<Frame>,
    ) -> Result<(), FilterRuntimeError> {
        let Some(frame) = frame else {
            return Ok(());
        };
        if self.gain == 1.0 {
            out_queue.push_back(frame);
            return Ok(());
        }
        let PlanarBuffers::Interleaved(bytes) = &frame.data else {
            return Err(FilterRuntimeError::new(
                "volume",
                "planar and compressed buffers are not supported by this filter",
            ));
        };
        let mut samples = dsp::to_f32_interleaved(bytes, frame.config.format);
        dsp::apply_gain(&mut samples, self.gain);
        let bytes_out = dsp::from_f32_interleaved(&samples, frame.config.format);
        out_queue.push_back(Frame::new(
            frame.config,
            frame.samples,
            frame.pts,
            PlanarBuffers::Interleaved(bytes_out),
        ));
        Ok(())
    }
}
