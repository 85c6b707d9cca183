//! The pull/push frame-propagation engine: drives frames from head to
//! tail on demand, stages EOF flushing, and accounts for buffered delay.

use audiopipe_core::Frame;

use crate::chain::{Chain, FilterId};
use crate::error::FilterRuntimeError;

impl Chain {
    /// If `f`'s output queue is empty and it has buffered state to flush,
    /// gives it one chance to produce something with no new input.
    /// Returns whether the queue is non-empty afterward.
    fn has_output_frame(&mut self, id: FilterId) -> Result<bool, FilterRuntimeError> {
        if self.get(id).out_queued.is_empty() {
            let label = self.get(id).debug_label();
            let inst = self.get_mut(id);
            inst.filter
                .filter_out(&mut inst.out_queued)
                .map_err(|e| FilterRuntimeError::new(label, e.reason))?;
        }
        Ok(!self.get(id).out_queued.is_empty())
    }

    fn dequeue_output_frame(&mut self, id: FilterId) -> Option<Frame> {
        let frame = self.get_mut(id).out_queued.pop_front()?;
        debug_assert_eq!(frame.config, self.get(id).fmt_out);
        Some(frame)
    }

    /// Repeatedly calls `filter_out` while the queue keeps growing,
    /// draining a pull-side filter to its fixpoint.
    fn read_remaining(&mut self, id: FilterId) -> Result<(), FilterRuntimeError> {
        loop {
            let before = self.get(id).out_queued.len();
            let label = self.get(id).debug_label();
            let inst = self.get_mut(id);
            inst.filter
                .filter_out(&mut inst.out_queued)
                .map_err(|e| FilterRuntimeError::new(label, e.reason))?;
            if self.get(id).out_queued.len() <= before {
                return Ok(());
            }
        }
    }

    fn filter_frame_at(
        &mut self,
        id: FilterId,
        frame: Option<Frame>,
    ) -> Result<(), FilterRuntimeError> {
        let label = self.get(id).debug_label();
        let inst = self.get_mut(id);
        inst.filter
            .filter_frame(&mut inst.out_queued, frame)
            .map_err(|e| FilterRuntimeError::new(label, e.reason))
    }

    /// Advances the chain until the tail has a queued frame, returns
    /// nothing more to give (`Ok(false)`), or a filter errors.
    ///
    /// `eof`: once every filter ahead of the first one still holding
    /// output has been drained to its fixpoint, an EOF marker
    /// (`filter_frame(None)`) is pushed through it to flush internal
    /// state — staged one filter at a time as the loop advances, so a
    /// filter only sees EOF after everything upstream of it is empty.
    pub fn output_frame(&mut self, eof: bool) -> Result<bool, FilterRuntimeError> {
        let tail = self.tail_id();
        if !self.get(tail).out_queued.is_empty() {
            return Ok(true);
        }

        loop {
            let mut last_with_output: Option<FilterId> = None;
            let mut cur = Some(self.head_id());
            while let Some(id) = cur {
                if eof && last_with_output.is_none() {
                    self.read_remaining(id)?;
                    self.filter_frame_at(id, None)?;
                }
                if self.has_output_frame(id)? {
                    last_with_output = Some(id);
                }
                cur = self.next(id);
            }

            let Some(producer) = last_with_output else {
                return Ok(false);
            };
            if producer == tail {
                return Ok(true);
            }

            let frame = self.dequeue_output_frame(producer);
            let next = self
                .next(producer)
                .expect("a non-tail filter always has a successor");
            self.filter_frame_at(next, frame)?;
        }
    }

    /// Pulls one frame off the tail, running the propagation loop as
    /// needed to produce it.
    pub fn read_output_frame(&mut self) -> Result<Option<Frame>, FilterRuntimeError> {
        if !self.output_frame(false)? {
            return Ok(None);
        }
        Ok(self.dequeue_output_frame(self.tail_id()))
    }

    /// Pushes a frame back onto the front of the tail's queue, for a
    /// caller that pulled one but couldn't use it yet (e.g. it would
    /// cross an end-pts cap).
    pub fn unread_output_frame(&mut self, frame: Frame) {
        let tail = self.tail_id();
        self.get_mut(tail).out_queued.push_front(frame);
    }

    /// Feeds a frame into the chain's head, where it is simply enqueued
    /// for the propagation loop to pick up lazily on the next
    /// `output_frame` call.
    pub fn filter_frame_into_chain(&mut self, frame: Frame) -> Result<(), FilterRuntimeError> {
        let head = self.head_id();
        self.filter_frame_at(head, Some(frame))
    }

    /// Total buffered delay across the chain: every filter's reported
    /// processing delay, plus the playback duration of everything
    /// currently queued in its output.
    pub fn calc_delay(&self) -> f64 {
        let mut total = 0.0;
        for id in self.iter() {
            let inst = self.get(id);
            total += inst.delay;
            if inst.fmt_out.rate > 0 {
                let queued_samples: u32 = inst.out_queued.iter().map(|f| f.samples).sum();
                total += queued_samples as f64 / inst.fmt_out.rate as f64;
            }
        }
        total
    }
}
