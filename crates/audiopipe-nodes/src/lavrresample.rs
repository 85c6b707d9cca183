use alloc::boxed::Box;
use alloc::collections::VecDeque;

use audiopipe_core::{AudioConfig, Frame, PlanarBuffers};
use audiopipe_graph::{Arg, ControlCommand, ControlResult, Filter, FilterRuntimeError, OpenError};

use crate::dsp;

/// `lavrresample` — the chain's workhorse format/rate/channel converter.
/// Used both as a user-addable filter and as the auto-inserted
/// conversion the negotiation algorithm reaches for whenever an adjacent
/// pair disagrees on config.
///
/// Accepts whatever input its predecessor produces unchanged (it never
/// mutates the `input` side of a `Reinit`); what it *produces* is driven
/// entirely by `desired_output`. With no hint at all (a user adding it
/// with no further negotiation pressure) it detaches as redundant.
pub struct ResampleFilter {
    fmt_in: AudioConfig,
    fmt_out: AudioConfig,
}

pub fn open(_args: &[Arg]) -> Result<Box<dyn Filter>, OpenError> {
    Ok(Box::new(ResampleFilter {
        fmt_in: AudioConfig::null(),
        fmt_out: AudioConfig::null(),
    }))
}

impl Filter for ResampleFilter {
    fn control(&mut self, cmd: ControlCommand<'_>) -> ControlResult {
        match cmd {
            ControlCommand::Reinit {
                input,
                desired_output,
            } => {
                if !input.is_valid() {
                    return ControlResult::Error;
                }
                let target = desired_output.cloned().unwrap_or_else(|| input.clone());
                if !target.is_valid() {
                    return ControlResult::Error;
                }
                self.fmt_in = input.clone();
                if target == *input {
                    self.fmt_out = target;
                    return ControlResult::Detach;
                }
                self.fmt_out = target;
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
                "lavrresample",
                "planar and compressed buffers are not supported by this filter",
            ));
        };

        let mut samples = dsp::to_f32_interleaved(bytes, frame.config.format);
        let in_channels = frame.config.channels.num_channels();
        let out_channels = self.fmt_out.channels.num_channels();

        if frame.config.rate != self.fmt_out.rate {
            samples = dsp::resample_linear(&samples, in_channels, frame.config.rate, self.fmt_out.rate);
        }
        if in_channels != out_channels {
            samples = dsp::remix_channels(&samples, in_channels, out_channels);
        }

        let out_samples = if out_channels > 0 {
            (samples.len() / out_channels) as u32
        } else {
            0
        };
        let bytes_out = dsp::from_f32_interleaved(&samples, self.fmt_out.format);
        out_queue.push_back(Frame::new(
            self.fmt_out.clone(),
            out_samples,
            frame.pts,
            PlanarBuffers::Interleaved(bytes_out),
        ));
        Ok(())
    }
}
