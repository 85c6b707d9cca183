use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

use audiopipe_core::{AudioConfig, Frame, PlanarBuffers};
use audiopipe_graph::{Arg, ControlCommand, ControlResult, Filter, FilterRuntimeError, OpenError};

use crate::dsp;

/// `pan` — per-output-channel mix levels from every input channel, plus
/// a convenience stereo balance control. Inserted by the balance
/// controller under the label `"autopan"`; a user may also add one
/// directly to build a custom downmix matrix.
pub struct PanFilter {
    fmt: AudioConfig,
    /// `levels[out_ch][in_ch]`. Starts as an identity-ish passthrough
    /// (channel `i` of the input feeds channel `i` of the output) sized
    /// once the input channel count is known.
    levels: Vec<Vec<f32>>,
}

pub fn open(_args: &[Arg]) -> Result<Box<dyn Filter>, OpenError> {
    Ok(Box::new(PanFilter {
        fmt: AudioConfig::null(),
        levels: Vec::new(),
    }))
}

impl PanFilter {
    fn ensure_identity(&mut self, channels: usize) {
        if self.levels.len() != channels {
            self.levels = (0..channels)
                .map(|out_ch| {
                    (0..channels)
                        .map(|in_ch| if in_ch == out_ch { 1.0 } else { 0.0 })
                        .collect()
                })
                .collect();
        }
    }

    /// Balances between the first two channels, leaving any further
    /// channels (3..N) passed through untouched. `balance` in `[-1, 1]`:
    /// negative favors the left channel, positive the right.
    fn set_balance(&mut self, balance: f32) {
        if self.levels.len() < 2 {
            return;
        }
        let balance = balance.clamp(-1.0, 1.0);
        let (left_gain, right_gain) = if balance <= 0.0 {
            (1.0, 1.0 + balance)
        } else {
            (1.0 - balance, 1.0)
        };
        self.levels[0][0] = left_gain;
        self.levels[0][1] = 0.0;
        self.levels[1][1] = right_gain;
        self.levels[1][0] = 0.0;
    }
}

impl Filter for PanFilter {
    fn control(&mut self, cmd: ControlCommand<'_>) -> ControlResult {
        match cmd {
            ControlCommand::Reinit { input, .. } => {
                if !input.is_valid() {
                    return ControlResult::Error;
                }
                self.fmt = input.clone();
                self.ensure_identity(input.channels.num_channels());
                ControlResult::Ok
            }
            ControlCommand::SetPanBalance(balance) => {
                self.set_balance(balance);
                ControlResult::Ok
            }
            ControlCommand::SetPanLevel { channel, levels } => {
                let Some(row) = self.levels.get_mut(channel as usize) else {
                    return ControlResult::Error;
                };
                if row.len() != levels.len() {
                    return ControlResult::Error;
                }
                row.copy_from_slice(levels);
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
        let PlanarBuffers::Interleaved(bytes) = &frame.data else {
            return Err(FilterRuntimeError::new(
                "pan",
                "planar and compressed buffers are not supported by this filter",
            ));
        };
        let channels = frame.config.channels.num_channels();
        let samples = dsp::to_f32_interleaved(bytes, frame.config.format);
        let frames = if channels > 0 { samples.len() / channels } else { 0 };

        let mut mixed = alloc::vec![0.0_f32; frames * channels];
        for frame_idx in 0..frames {
            let input_frame = &samples[frame_idx * channels..(frame_idx + 1) * channels];
            for out_ch in 0..channels {
                let row = &self.levels[out_ch];
                let mut acc = 0.0;
                for (in_ch, &level) in row.iter().enumerate() {
                    acc += input_frame[in_ch] * level;
                }
                mixed[frame_idx * channels + out_ch] = acc;
            }
        }

        let bytes_out = dsp::from_f32_interleaved(&mixed, frame.config.format);
        out_queue.push_back(Frame::new(
            frame.config,
            frame.samples,
            frame.pts,
            PlanarBuffers::Interleaved(bytes_out),
        ));
        Ok(())
    }
}
