//! Deadline scheduler polled by the tick loop
//!
//! Replaces engine-style timer handles with an explicit min-heap of
//! deadlines. Time is simulation time accumulated from tick deltas,
//! not wall clock, so scheduled work is deterministic under replay.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::core::types::Seconds;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry<T> {
    deadline: f64,
    seq: u64,
    token: T,
}

impl<T: PartialEq> Eq for Entry<T> {}

impl<T: PartialEq> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.deadline
            .total_cmp(&other.deadline)
            .then(self.seq.cmp(&other.seq))
    }
}

impl<T: PartialEq> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of deadlines carrying an opaque token type
///
/// Deadlines that tie fire in scheduling order.
#[derive(Debug, Default)]
pub struct Scheduler<T> {
    now: f64,
    seq: u64,
    heap: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T: PartialEq> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            seq: 0,
            heap: BinaryHeap::new(),
        }
    }

    /// Current simulation time in seconds
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Advance simulation time by one tick delta
    pub fn advance(&mut self, dt: Seconds) {
        self.now += dt as f64;
    }

    /// Schedule a token to fire `delay` seconds from now
    pub fn schedule_in(&mut self, delay: Seconds, token: T) {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Reverse(Entry {
            deadline: self.now + delay as f64,
            seq,
            token,
        }));
    }

    /// Pop the next token whose deadline has passed, if any
    pub fn pop_due(&mut self) -> Option<T> {
        if let Some(Reverse(entry)) = self.heap.peek() {
            if entry.deadline <= self.now {
                return self.heap.pop().map(|Reverse(e)| e.token);
            }
        }
        None
    }

    /// Drop every pending deadline
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
