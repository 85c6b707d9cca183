use alloc::boxed::Box;
use alloc::collections::VecDeque;

use audiopipe_core::{AudioConfig, ChannelMap, Frame, PlanarBuffers, SampleFormat};
use audiopipe_graph::{Arg, ControlCommand, ControlResult, Filter, FilterRuntimeError, OpenError};

/// `lavcac3enc` — wraps PCM into a compressed spdif passthrough stream
/// for an AC3-capable output device. Real AC3 encoding is out of scope;
/// this stub frames the PCM payload as an opaque compressed buffer so
/// the rest of the pipeline exercises the spdif path end to end.
pub struct Lavcac3encFilter {
    fmt_out: AudioConfig,
}

pub fn open(_args: &[Arg]) -> Result<Box<dyn Filter>, OpenError> {
    Ok(Box::new(Lavcac3encFilter {
        fmt_out: AudioConfig::null(),
    }))
}

impl Filter for Lavcac3encFilter {
    fn control(&mut self, cmd: ControlCommand<'_>) -> ControlResult {
        match cmd {
            ControlCommand::Reinit { input, .. } => {
                if !input.is_valid() || input.format.is_spdif() {
                    return ControlResult::Error;
                }
                self.fmt_out = AudioConfig::new(
                    SampleFormat::SpdifAc3,
                    ChannelMap::stereo(),
                    input.rate,
                );
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
        let PlanarBuffers::Interleaved(bytes) = frame.data else {
            return Err(FilterRuntimeError::new(
                "lavcac3enc",
                "planar and already-compressed buffers are not supported by this filter",
            ));
        };
        out_queue.push_back(Frame::new(
            self.fmt_out.clone(),
            frame.samples,
            frame.pts,
            PlanarBuffers::Compressed(bytes),
        ));
        Ok(())
    }
}
