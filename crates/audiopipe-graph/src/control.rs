use audiopipe_core::AudioConfig;

/// The closed set of control commands the coordinator (and the negotiation
/// algorithm itself, for `Reinit`) may send to a filter.
///
/// Modelled as a tagged enum rather than an open trait hierarchy: filters
/// that don't understand a variant answer [`ControlResult::Unknown`],
/// the same way an unhandled `case` falls through to a default.
pub enum ControlCommand<'a> {
    /// Negotiate input config. The filter may mutate `input` in place to
    /// describe the input it actually accepts. `desired_output`, when
    /// present, is a hint about what the next filter wants — the
    /// mechanism a resampler uses to pick its target rate/channel layout
    /// when the negotiation algorithm is trying to satisfy a downstream
    /// filter's request (`filter_reinit_with_conversion` step 1).
    Reinit {
        input: &'a mut AudioConfig,
        desired_output: Option<&'a AudioConfig>,
    },
    /// Flush internal state for a seek.
    Reset,
    /// Linear gain, already converted from dB/normalized volume.
    SetVolume(f32),
    /// Target speed for a tempo-scaling (pitch-preserving) filter.
    SetPlaybackSpeed(f64),
    /// Target speed for a resampling (pitch-shifting) filter.
    SetPlaybackSpeedResample(f64),
    /// Stereo balance in `[-1, 1]`.
    SetPanBalance(f32),
    /// One output channel's mix levels from every input channel.
    SetPanLevel { channel: u32, levels: &'a [f32] },
    /// A label-addressed runtime command: `{cmd, arg}`.
    Command { cmd: &'a str, arg: &'a str },
}

/// A filter's answer to a [`ControlCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlResult {
    /// Command handled; for `Reinit`, the filter accepted the given input
    /// unchanged and `fmt_out` is now valid.
    Ok,
    /// For `Reinit`: the input needs conversion before this filter can
    /// accept it. Never a valid answer to any other command.
    False,
    /// The filter is redundant for the negotiated config and requests its
    /// own removal.
    Detach,
    /// The filter failed to handle the command.
    Error,
    /// The filter does not recognize this command.
    Unknown,
}
