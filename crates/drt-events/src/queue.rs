//! `EventQueue` — ordered multiset of pending events.
//!
//! # Layout
//!
//! Events are bucketed by `(SimTime, EventKind)` in a `BTreeMap`; each bucket
//! is a FIFO `VecDeque`.  Insert is O(log B) and pop-earliest is O(log B)
//! where B is the number of distinct `(time, kind)` keys pending, so events
//! appended while another event is being handled are visible to the next
//! `pop_earliest` without any re-sort.

use std::collections::{BTreeMap, VecDeque};

use drt_core::SimTime;

use crate::{Event, EventKind, EventPayload, QueueError, QueueResult};

/// Forward-only pending-event log.
#[derive(Default)]
pub struct EventQueue {
    buckets:      BTreeMap<(SimTime, EventKind), VecDeque<Event>>,
    /// Cached total event count for O(1) `len()`.
    total:        usize,
    next_seq:     u64,
    /// Time of the most recently popped event.
    last_handled: Option<SimTime>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` at `time` and return its insertion sequence.
    ///
    /// Fails with [`QueueError::PastEvent`] when `time` is earlier than the
    /// last popped event.  Inserting at exactly that time is allowed.
    pub fn insert(&mut self, time: SimTime, payload: EventPayload) -> QueueResult<u64> {
        let kind = payload.kind();
        if let Some(last) = self.last_handled {
            if time < last {
                return Err(QueueError::PastEvent { kind, time, last_handled: last });
            }
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.buckets
            .entry((time, kind))
            .or_default()
            .push_back(Event::new(time, seq, payload));
        self.total += 1;
        Ok(seq)
    }

    /// Remove and return the earliest event by `(time, kind, seq)`.
    pub fn pop_earliest(&mut self) -> Option<Event> {
        let mut entry = self.buckets.first_entry()?;
        let event = entry.get_mut().pop_front();
        if entry.get().is_empty() {
            entry.remove();
        }
        let event = event?;
        self.total -= 1;
        self.last_handled = Some(event.time);
        Some(event)
    }

    /// Time of the earliest pending event.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.buckets.keys().next().map(|(t, _)| *t)
    }

    /// Time of the last popped event, `None` before the first pop.
    pub fn last_handled_time(&self) -> Option<SimTime> {
        self.last_handled
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of pending events of `kind`.
    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.buckets
            .iter()
            .filter(|((_, k), _)| *k == kind)
            .map(|(_, b)| b.len())
            .sum()
    }

    /// `true` when something other than a `DynamicCheck` is pending.  The
    /// batching check uses this to stop rescheduling itself once the run has
    /// nothing left to do.
    pub fn has_work_besides(&self, kind: EventKind) -> bool {
        self.count_kind(kind) < self.total
    }
}
