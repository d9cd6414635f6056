//! Deferred actions: a cancellable list of tasks realized by a host timer.
//!
//! The sequencer decides *what* runs later; a [`Timer`] decides *how* the
//! delay is realized (`setTimeout` in the browser, [`ManualTimer`] in
//! tests). When the timer fires it hands the [`TaskId`] back and the owner
//! takes the action out with [`Sequencer::take`]. Timing is best effort
//! and runs on the page clock, not the audio clock.

use std::collections::BTreeMap;

use crate::engine::ToneRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Deferred {
    Tone(ToneRequest),
    /// Clear the visual highlight of the key labeled with this note.
    ClearActive(String),
}

pub trait Timer {
    fn set_timeout(&mut self, id: TaskId, delay_ms: u32);
    fn clear_timeout(&mut self, id: TaskId);
}

#[derive(Debug, Default)]
pub struct Sequencer {
    next_id: u64,
    pending: BTreeMap<TaskId, Deferred>,
}

impl Sequencer {
    pub fn new() -> Self {
        Sequencer::default()
    }

    pub fn schedule(&mut self, timer: &mut dyn Timer, delay_ms: u32, action: Deferred) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id, action);
        timer.set_timeout(id, delay_ms);
        id
    }

    /// Schedule a list of `(offset_ms, action)` pairs.
    pub fn schedule_all<I>(&mut self, timer: &mut dyn Timer, steps: I) -> Vec<TaskId>
    where
        I: IntoIterator<Item = (u32, Deferred)>,
    {
        let mut ids = Vec::new();
        for (offset, action) in steps {
            ids.push(self.schedule(timer, offset, action));
        }
        ids
    }

    /// Remove a due task. `None` if it was cancelled or already taken.
    pub fn take(&mut self, id: TaskId) -> Option<Deferred> {
        self.pending.remove(&id)
    }

    pub fn cancel(&mut self, timer: &mut dyn Timer, id: TaskId) -> bool {
        if self.pending.remove(&id).is_some() {
            timer.clear_timeout(id);
            true
        } else {
            false
        }
    }

    pub fn cancel_all(&mut self, timer: &mut dyn Timer) {
        for id in std::mem::take(&mut self.pending).into_keys() {
            timer.clear_timeout(id);
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Virtual-clock timer. Time only moves when [`advance`](Self::advance) is called.
#[derive(Debug, Default)]
pub struct ManualTimer {
    now_ms: u64,
    /// (due time, insertion order, id)
    queue: Vec<(u64, u64, TaskId)>,
    seq: u64,
}

impl ManualTimer {
    pub fn new() -> Self {
        ManualTimer::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Due time of every scheduled timeout, relative to the clock's origin.
    pub fn scheduled(&self) -> Vec<(u64, TaskId)> {
        let mut out = self.queue.clone();
        out.sort();
        out.into_iter().map(|(due, _, id)| (due, id)).collect()
    }

    /// Move the clock forward and return the timeouts that fired, in due
    /// order. Timeouts due at the same time fire in scheduling order.
    pub fn advance(&mut self, ms: u64) -> Vec<TaskId> {
        self.now_ms += ms;
        let now = self.now_ms;
        let mut due: Vec<_> = self.queue.iter().copied().filter(|&(t, _, _)| t <= now).collect();
        self.queue.retain(|&(t, _, _)| t > now);
        due.sort();
        due.into_iter().map(|(_, _, id)| id).collect()
    }
}

impl Timer for ManualTimer {
    fn set_timeout(&mut self, id: TaskId, delay_ms: u32) {
        self.queue.push((self.now_ms + delay_ms as u64, self.seq, id));
        self.seq += 1;
    }

    fn clear_timeout(&mut self, id: TaskId) {
        self.queue.retain(|&(_, _, queued)| queued != id);
    }
}
