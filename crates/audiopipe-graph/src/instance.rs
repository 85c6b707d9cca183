use alloc::collections::VecDeque;
use alloc::string::String;

use audiopipe_core::{AudioConfig, Frame};

use crate::control::{ControlCommand, ControlResult};
use crate::error::FilterRuntimeError;

/// The behavior a filter stage contributes to the chain. Every non-sentinel
/// filter in `audiopipe-nodes` implements this; the chain only ever talks
/// to `dyn Filter`, never to a concrete filter type, keeping the registry
/// the one source of filter construction rather than baking inheritance
/// into the chain itself.
///
/// `filter_out` defaults to a no-op: most filters are push-only and never
/// produce output without new input.
pub trait Filter: Send {
    fn control(&mut self, cmd: ControlCommand<'_>) -> ControlResult;

    /// The config this filter will actually produce, valid immediately
    /// after a `Reinit` control call that returned `Ok`. Queried
    /// separately from `control` because a filter decides its output as
    /// a side effect of negotiating its input, not as a mutation visible
    /// through the same parameter.
    fn fmt_out(&self) -> AudioConfig;

    /// Consume one input frame (or `None` to signal EOF drain), appending
    /// zero or more frames to `out_queue`. Ownership of `frame` transfers
    /// to the callee unconditionally, including on error.
    fn filter_frame(
        &mut self,
        out_queue: &mut VecDeque<Frame>,
        frame: Option<Frame>,
    ) -> Result<(), FilterRuntimeError>;

    /// Produce additional output with no new input, for filters that
    /// buffer internally (e.g. a resampler holding a partial window).
    fn filter_out(&mut self, _out_queue: &mut VecDeque<Frame>) -> Result<(), FilterRuntimeError> {
        Ok(())
    }

    /// Release any resources the filter holds. Called exactly once, when
    /// the filter is removed from the chain or the chain is destroyed.
    fn uninit(&mut self) {}

    /// Clears any state a filter accumulated from a previous negotiation
    /// attempt, called on every non-sentinel filter (and the tail
    /// sentinel) at the start of `do_reinit`. Most filters have nothing
    /// to clear; the tail sentinel uses this to forget the previous
    /// pass's pinned output config.
    fn reset_negotiation_state(&mut self) {}

    /// Whether this filter can accept a compressed passthrough (spdif)
    /// input at all. Almost every filter operates on PCM only; a filter
    /// that answers `false` here is dropped outright (never asked to
    /// negotiate) when its predecessor's output is spdif, the
    /// spdif-mismatch exception from the negotiation algorithm.
    fn handles_compressed(&self) -> bool {
        false
    }

    /// Called once per negotiation pass, before the walk starts, with the
    /// chain's currently-requested output config. Only the tail sentinel
    /// overrides this: it seeds the pinned output target a `Reinit` call
    /// compares and fills unset axes of, so the pin survives however many
    /// times the tail's own `control` is re-invoked within one pass. Every
    /// other filter ignores it.
    fn seed_output_target(&mut self, _target: &AudioConfig) {}
}

/// One stage in the chain: a filter's negotiated configuration, its output
/// queue, and the behavior object itself.
pub struct FilterInstance {
    pub name: &'static str,
    pub label: Option<String>,
    pub fmt_in: AudioConfig,
    pub fmt_out: AudioConfig,
    /// Seconds of latency this filter reports it introduces, excluding
    /// queued output (accounted separately by `calc_delay`).
    pub delay: f64,
    pub out_queued: VecDeque<Frame>,
    /// True if the negotiation algorithm, not the user, added this
    /// filter. Auto-inserted filters are removed wholesale at the start
    /// of every reinit and never carry a label.
    pub auto_inserted: bool,
    pub(crate) filter: alloc::boxed::Box<dyn Filter>,
}

impl FilterInstance {
    pub fn new(
        name: &'static str,
        label: Option<String>,
        auto_inserted: bool,
        filter: alloc::boxed::Box<dyn Filter>,
    ) -> Self {
        Self {
            name,
            label,
            fmt_in: AudioConfig::null(),
            fmt_out: AudioConfig::null(),
            delay: 0.0,
            out_queued: VecDeque::new(),
            auto_inserted,
            filter,
        }
    }

    /// Text used in the rendered chain snapshot a `NegotiationError`
    /// carries, e.g. `"volume [softvol]"` or `"lavrresample (auto)"`.
    pub fn debug_label(&self) -> alloc::string::String {
        match (&self.label, self.auto_inserted) {
            (Some(label), _) => alloc::format!("{} [{}]", self.name, label),
            (None, true) => alloc::format!("{} (auto)", self.name),
            (None, false) => alloc::string::String::from(self.name),
        }
    }
}
