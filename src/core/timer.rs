//! Timers and deferred tasks for the single-threaded event loop
//!
//! Nothing here sleeps or spawns threads. The loop asks for the next deadline,
//! polls input until then, and pops whatever is due.

use std::collections::VecDeque;
use std::time::Instant;

/// Handle for cancelling a scheduled task
pub type TimerId = u64;

struct Entry<T> {
    id: TimerId,
    due: Instant,
    task: T,
}

/// Tasks scheduled for a point in time
pub struct TimerQueue<T> {
    entries: Vec<Entry<T>>,
    next_id: TimerId,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Schedule `task` to run once `due` has passed
    pub fn schedule(&mut self, due: Instant, task: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry { id, due, task });
        id
    }

    /// Drop a pending task. Returns false if it already ran or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Remove and return the earliest task due at `now`.
    /// Tasks with the same deadline come out in scheduling order.
    pub fn pop_due(&mut self, now: Instant) -> Option<T> {
        let pos = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.id))
            .map(|(i, _)| i)?;
        Some(self.entries.remove(pos).task)
    }

    /// Earliest pending deadline
    pub fn next_due(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.due).min()
    }

}

/// Work that must run after the current event has been fully dispatched
pub struct DeferredQueue<T> {
    tasks: VecDeque<T>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    pub fn push(&mut self, task: T) {
        self.tasks.push_back(task);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.tasks.pop_front()
    }
}
