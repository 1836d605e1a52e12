//! Deadline-ordered one-shot timer queue.
//!
//! # Responsibility
//! - Keep armed timers in a min-heap keyed by `(deadline, handle)`.
//! - Expose the earliest live deadline so a single wake primitive can sleep
//!   until it.
//!
//! # Invariants
//! - A handle is yielded by `pop_due` at most once.
//! - Cancelling an unknown, fired or already cancelled handle is a no-op.
//! - Cancelled entries are dropped lazily when they reach the heap top.

use crate::model::event::EventId;
use crate::model::reminder::EpochMs;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

const COMPACT_MIN_HEAP_LEN: usize = 64;

/// Opaque identity of one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<(EpochMs, TimerHandle, EventId)>>,
    live: HashSet<TimerHandle>,
    next_handle: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot timer for `event_id` at `deadline`.
    pub fn arm(&mut self, deadline: EpochMs, event_id: EventId) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.heap.push(Reverse((deadline, handle, event_id)));
        self.live.insert(handle);
        handle
    }

    /// Cancels a timer. Returns whether it was still live.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let was_live = self.live.remove(&handle);
        if was_live {
            self.compact_if_sparse();
        }
        was_live
    }

    /// Earliest live deadline, if any.
    pub fn next_deadline(&mut self) -> Option<EpochMs> {
        self.discard_dead_top();
        self.heap.peek().map(|Reverse((deadline, _, _))| *deadline)
    }

    /// Pops the earliest live timer whose deadline is `<= now`.
    pub fn pop_due(&mut self, now: EpochMs) -> Option<(TimerHandle, EventId)> {
        self.discard_dead_top();
        let Reverse((deadline, _, _)) = self.heap.peek()?;
        if *deadline > now {
            return None;
        }
        let Reverse((_, handle, event_id)) = self.heap.pop()?;
        self.live.remove(&handle);
        Some((handle, event_id))
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Drops every timer.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }

    fn discard_dead_top(&mut self) {
        while let Some(Reverse((_, handle, _))) = self.heap.peek() {
            if self.live.contains(handle) {
                break;
            }
            self.heap.pop();
        }
    }

    fn compact_if_sparse(&mut self) {
        if self.heap.len() < COMPACT_MIN_HEAP_LEN || self.heap.len() < self.live.len() * 2 {
            return;
        }
        let live = &self.live;
        self.heap.retain(|Reverse((_, handle, _))| live.contains(handle));
    }
}
