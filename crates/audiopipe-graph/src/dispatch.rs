//! Whole-chain control dispatch: broadcast, tail-to-head "first taker
//! wins", and label-addressed routing.

use crate::chain::{Chain, FilterId};
use crate::control::{ControlCommand, ControlResult};

impl Chain {
    /// Dispatches `cmd` from tail to head, stopping at the first filter
    /// that answers `Ok`. Used by the speed/volume/balance controllers to
    /// prefer a user's own filter over inserting a new one.
    pub fn control_any_rev<F>(&mut self, mut build: F) -> bool
    where
        F: for<'a> FnMut() -> ControlCommand<'a>,
    {
        let ids: alloc::vec::Vec<FilterId> = self.iter().collect();
        for &id in ids.iter().rev() {
            if self.is_sentinel(id) {
                continue;
            }
            if self.get_mut(id).filter.control(build()) == ControlResult::Ok {
                return true;
            }
        }
        false
    }

    /// Dispatches `cmd` to every non-sentinel filter, regardless of
    /// individual results.
    pub fn control_all<F>(&mut self, mut build: F)
    where
        F: for<'a> FnMut() -> ControlCommand<'a>,
    {
        let ids: alloc::vec::Vec<FilterId> = self.iter().collect();
        for id in ids {
            if self.is_sentinel(id) {
                continue;
            }
            let _ = self.get_mut(id).filter.control(build());
        }
    }

    /// Routes a command to the filter labelled `label`, or to every
    /// filter when `label == "all"`.
    pub fn control_by_label<F>(&mut self, label: &str, mut build: F) -> ControlResult
    where
        F: for<'a> FnMut() -> ControlCommand<'a>,
    {
        if label == "all" {
            self.control_all(build);
            return ControlResult::Ok;
        }
        match self.find_by_label(label) {
            Some(id) => self.get_mut(id).filter.control(build()),
            None => ControlResult::Unknown,
        }
    }
}
