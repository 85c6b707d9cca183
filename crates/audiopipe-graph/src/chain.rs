use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::string::{String, ToString};

use thunderdome::{Arena, Index};

use audiopipe_core::{AudioConfig, Frame};

use crate::control::{ControlCommand, ControlResult};
use crate::descriptor::{Arg, Registry};
use crate::error::{ChainError, FilterRuntimeError, OpenError};
use crate::instance::{Filter, FilterInstance};

/// Stable handle to a filter inside a [`Chain`]. Thin wrapper over
/// `thunderdome::Index` — the arena-plus-indices realization of the
/// doubly linked list this chain exposes to callers, without raw pointer
/// chasing or lifetimes tangled through the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterId(pub(crate) Index);

struct FilterNode {
    instance: FilterInstance,
    prev: Option<Index>,
    next: Option<Index>,
}

/// `chain.initialized`: whether the chain has a negotiated, usable
/// format agreement end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Uninit,
    Ok,
    Err,
}

struct HeadSentinel;

impl Filter for HeadSentinel {
    fn control(&mut self, cmd: ControlCommand<'_>) -> ControlResult {
        match cmd {
            ControlCommand::Reinit { .. } | ControlCommand::Reset => ControlResult::Ok,
            _ => ControlResult::Unknown,
        }
    }

    fn fmt_out(&self) -> AudioConfig {
        // Never consulted: the head's fmt_out is pinned directly to
        // `chain.input` by the negotiation algorithm, not negotiated.
        AudioConfig::null()
    }

    fn filter_frame(
        &mut self,
        out_queue: &mut VecDeque<Frame>,
        frame: Option<Frame>,
    ) -> Result<(), FilterRuntimeError> {
        if let Some(frame) = frame {
            out_queue.push_back(frame);
        }
        Ok(())
    }
}

/// The tail sentinel pins `chain.output`'s unset axes from whatever the
/// filters actually produced, across however many times `REINIT` is
/// called during one `do_reinit` pass. `pinned` is reset to null at the
/// start of each pass (step 2 of `do_reinit`) alongside every other
/// non-sentinel filter's config.
struct TailSentinel {
    pinned: AudioConfig,
}

impl Filter for TailSentinel {
    fn control(&mut self, cmd: ControlCommand<'_>) -> ControlResult {
        match cmd {
            ControlCommand::Reinit { input, .. } => {
                self.pinned.copy_unset_fields(input);
                let changed = *input != self.pinned;
                *input = self.pinned.clone();
                if changed {
                    ControlResult::False
                } else {
                    ControlResult::Ok
                }
            }
            ControlCommand::Reset => ControlResult::Ok,
            _ => ControlResult::Unknown,
        }
    }

    fn fmt_out(&self) -> AudioConfig {
        self.pinned.clone()
    }

    fn reset_negotiation_state(&mut self) {
        self.pinned = AudioConfig::null();
    }

    fn seed_output_target(&mut self, target: &AudioConfig) {
        self.pinned = target.clone();
    }

    fn filter_frame(
        &mut self,
        out_queue: &mut VecDeque<Frame>,
        frame: Option<Frame>,
    ) -> Result<(), FilterRuntimeError> {
        if let Some(frame) = frame {
            out_queue.push_back(frame);
        }
        Ok(())
    }
}

/// The filter chain: a doubly linked pipeline with fixed head (`"in"`)
/// and tail (`"out"`) sentinels, negotiated end to end by
/// [`crate::negotiation`].
pub struct Chain {
    pub(crate) arena: Arena<FilterNode>,
    pub(crate) head: Index,
    pub(crate) tail: Index,
    pub(crate) registry: &'static Registry,
    pub input: AudioConfig,
    pub output: AudioConfig,
    pub state: ChainState,
    pub replaygain_data: Option<crate::replaygain::ReplayGain>,
}

impl Chain {
    /// Initial arena capacity: sentinels plus room for a handful of user
    /// filters and their auto-inserted conversion partners before a
    /// reallocation is needed.
    const INITIAL_CAPACITY: usize = 8;

    pub fn new(registry: &'static Registry, input: AudioConfig, output: AudioConfig) -> Self {
        let mut arena = Arena::with_capacity(Self::INITIAL_CAPACITY);
        let head = arena.insert(FilterNode {
            instance: FilterInstance::new("in", None, false, Box::new(HeadSentinel)),
            prev: None,
            next: None,
        });
        let tail = arena.insert(FilterNode {
            instance: FilterInstance::new(
                "out",
                None,
                false,
                Box::new(TailSentinel {
                    pinned: AudioConfig::null(),
                }),
            ),
            prev: Some(head),
            next: None,
        });
        arena[head].next = Some(tail);

        Self {
            arena,
            head,
            tail,
            registry,
            input,
            output,
            state: ChainState::Uninit,
            replaygain_data: None,
        }
    }

    pub fn head_id(&self) -> FilterId {
        FilterId(self.head)
    }

    pub fn tail_id(&self) -> FilterId {
        FilterId(self.tail)
    }

    pub fn get(&self, id: FilterId) -> &FilterInstance {
        &self.arena[id.0].instance
    }

    pub fn get_mut(&mut self, id: FilterId) -> &mut FilterInstance {
        &mut self.arena[id.0].instance
    }

    pub fn prev(&self, id: FilterId) -> Option<FilterId> {
        self.arena[id.0].prev.map(FilterId)
    }

    pub fn next(&self, id: FilterId) -> Option<FilterId> {
        self.arena[id.0].next.map(FilterId)
    }

    pub fn is_sentinel(&self, id: FilterId) -> bool {
        id.0 == self.head || id.0 == self.tail
    }

    /// Walks head to tail, yielding every filter including both
    /// sentinels.
    pub fn iter(&self) -> impl Iterator<Item = FilterId> + '_ {
        let mut cur = Some(self.head);
        core::iter::from_fn(move || {
            let id = cur?;
            cur = self.arena[id].next;
            Some(FilterId(id))
        })
    }

    /// `prepend(before, name, args)` — insert a new, non-auto-inserted
    /// filter immediately before `before`. `before == None` targets
    /// `last`; `before == first` redirects to `first.next` so nothing is
    /// ever inserted ahead of the head sentinel.
    pub fn prepend(
        &mut self,
        before: Option<FilterId>,
        name: &str,
        args: &[Arg],
    ) -> Result<FilterId, OpenError> {
        self.insert(before, name, None, false, args)
    }

    /// Internal insertion primitive shared by `prepend` and the
    /// negotiation algorithm's auto-insertion path.
    pub(crate) fn insert(
        &mut self,
        before: Option<FilterId>,
        name: &str,
        label: Option<String>,
        auto_inserted: bool,
        args: &[Arg],
    ) -> Result<FilterId, OpenError> {
        let before = before.map(|id| id.0).unwrap_or(self.tail);
        let before = if before == self.head {
            self.arena[self.head].next.unwrap()
        } else {
            before
        };

        let (descriptor, resolved_args) = self
            .registry
            .resolve(name, args)
            .ok_or_else(|| OpenError::UnknownFilter(name.to_string()))?;
        let filter = self.registry.create(descriptor, &resolved_args)?;

        let prev = self.arena[before].prev;
        let instance = FilterInstance::new(descriptor.name, label, auto_inserted, filter);
        let new_id = self.arena.insert(FilterNode {
            instance,
            prev,
            next: Some(before),
        });
        if let Some(prev) = prev {
            self.arena[prev].next = Some(new_id);
        }
        self.arena[before].prev = Some(new_id);

        Ok(FilterId(new_id))
    }

    /// `remove(f)` — no-op on a sentinel. Uninits the filter, drops its
    /// queued frames, unlinks it.
    pub fn remove(&mut self, id: FilterId) {
        if self.is_sentinel(id) {
            return;
        }
        let Some(mut node) = self.arena.remove(id.0) else {
            return;
        };
        node.instance.filter.uninit();
        if let Some(prev) = node.prev {
            self.arena[prev].next = node.next;
        }
        if let Some(next) = node.next {
            self.arena[next].prev = node.prev;
        }
    }

    pub fn find_by_label(&self, label: &str) -> Option<FilterId> {
        self.iter()
            .find(|&id| self.get(id).label.as_deref() == Some(label))
    }

    /// `add(name, label, args)` — `prepend(last, ...)`, sets the label,
    /// triggers `reinit`; on failure the filter is removed and the error
    /// propagated.
    pub fn add(
        &mut self,
        name: &str,
        label: Option<String>,
        args: &[Arg],
    ) -> Result<FilterId, ChainError> {
        if let Some(label) = &label {
            if self.find_by_label(label).is_some() {
                return Err(ChainError::DuplicateLabel(label.clone()));
            }
        }
        let id = self.insert(None, name, label, false, args)?;
        match crate::negotiation::reinit(self) {
            Ok(()) => Ok(id),
            Err(err) => {
                self.remove(id);
                Err(err.into())
            }
        }
    }

    /// `remove_by_label(label)` — removes the first match and
    /// renegotiates. If renegotiation fails, the whole chain is uninit'd
    /// and rebuilt from scratch (the caller sees a distinct error from
    /// "label not found").
    pub fn remove_by_label(&mut self, label: &str) -> Result<(), ChainError> {
        let id = self
            .find_by_label(label)
            .ok_or_else(|| ChainError::LabelNotFound(label.to_string()))?;
        self.remove(id);
        if let Err(source) = crate::negotiation::reinit(self) {
            self.hard_reset();
            return Err(ChainError::RemoveReinitFailed {
                label: label.to_string(),
                source,
            });
        }
        Ok(())
    }

    /// Uninits every non-sentinel filter and drops it, leaving only the
    /// sentinels. Used as the recovery path when `remove_by_label`'s
    /// renegotiation fails outright.
    fn hard_reset(&mut self) {
        let mut cur = self.arena[self.head].next;
        while let Some(id) = cur {
            if id == self.tail {
                break;
            }
            let next = self.arena[id].next;
            self.remove(FilterId(id));
            cur = next;
        }
        self.state = ChainState::Uninit;
    }

    /// Renders a one-line-per-filter snapshot of the chain, with a marker
    /// on the failing filter, for `NegotiationError::chain_snapshot`.
    pub(crate) fn render_snapshot(&self, failing: Option<FilterId>) -> String {
        let mut out = String::new();
        for id in self.iter() {
            if !out.is_empty() {
                out.push_str(" -> ");
            }
            if Some(id) == failing {
                out.push('*');
            }
            out.push_str(&self.get(id).debug_label());
        }
        out
    }

    /// Broadcasts `Reset` to every filter and drops every queued frame,
    /// for a seek.
    pub fn seek_reset(&mut self) {
        let ids: alloc::vec::Vec<_> = self.iter().collect();
        for id in ids {
            let node = &mut self.arena[id.0].instance;
            node.out_queued.clear();
            let _ = node.filter.control(ControlCommand::Reset);
        }
    }
}
