use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

use audiopipe_core::{AudioConfig, Frame, PlanarBuffers};
use audiopipe_graph::{Arg, ControlCommand, ControlResult, Filter, FilterRuntimeError, OpenError};

use crate::args;
use crate::dsp;

/// `scaletempo` — pitch-preserving playback speed change, selected by
/// the speed controller when pitch correction is enabled. This is a
/// frame-selection time compressor (drop frames to speed up, repeat
/// frames to slow down), not the windowed overlap-add a production
/// tempo scaler would use — sample rate is untouched, so pitch is
/// unaffected, but the output will sound choppier than a real WSOLA
/// implementation at large speed ratios.
pub struct ScaletempoFilter {
    speed: f64,
    fmt: AudioConfig,
    /// Fractional read position carried across `filter_frame` calls so
    /// frame boundaries don't introduce a periodic click.
    frac_pos: f64,
}

pub fn open(args: &[Arg]) -> Result<Box<dyn Filter>, OpenError> {
    let speed = match args::find(args, "speed") {
        Some(s) => args::parse_f64(s)
            .ok_or_else(|| OpenError::BadOptions(alloc::format!("invalid speed {s:?}")))?,
        None => 1.0,
    };
    Ok(Box::new(ScaletempoFilter {
        speed,
        fmt: AudioConfig::null(),
        frac_pos: 0.0,
    }))
}

impl Filter for ScaletempoFilter {
    fn control(&mut self, cmd: ControlCommand<'_>) -> ControlResult {
        match cmd {
            ControlCommand::Reinit { input, .. } => {
                if !input.is_valid() {
                    return ControlResult::Error;
                }
                self.fmt = input.clone();
                ControlResult::Ok
            }
            ControlCommand::SetPlaybackSpeed(speed) => {
                self.speed = speed;
                ControlResult::Ok
            }
            ControlCommand::Reset => {
                self.frac_pos = 0.0;
                ControlResult::Ok
            }
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
        if self.speed == 1.0 {
            out_queue.push_back(frame);
            return Ok(());
        }
        let PlanarBuffers::Interleaved(bytes) = &frame.data else {
            return Err(FilterRuntimeError::new(
                "scaletempo",
                "planar and compressed buffers are not supported by this filter",
            ));
        };
        let channels = frame.config.channels.num_channels();
        if channels == 0 {
            return Ok(());
        }
        let samples = dsp::to_f32_interleaved(bytes, frame.config.format);
        let frames_in = samples.len() / channels;

        let mut out: Vec<f32> = Vec::new();
        let mut pos = self.frac_pos;
        while (pos as usize) < frames_in {
            let idx = pos as usize;
            out.extend_from_slice(&samples[idx * channels..(idx + 1) * channels]);
            pos += self.speed;
        }
        self.frac_pos = pos - frames_in as f64;

        let out_samples = (out.len() / channels) as u32;
        let bytes_out = dsp::from_f32_interleaved(&out, frame.config.format);
        out_queue.push_back(Frame::new(
            frame.config,
            out_samples,
            frame.pts,
            PlanarBuffers::Interleaved(bytes_out),
        ));
        Ok(())
    }
}
