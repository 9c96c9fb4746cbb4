//! Cancellable timers on simulation time
//!
//! Every timed wait in the session (rain steps, grace period, demo replay,
//! demo clicks) is an entry here. The owner advances the clock once per tick
//! and pops due entries one at a time, so a handler that cancels another
//! entry prevents it from firing even when both fell due in the same tick.

use crate::consts::TIME_EPSILON;

/// Identifies a scheduled entry; doubles as its cancellation token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// A timer that fell due
#[derive(Debug, Clone, PartialEq)]
pub struct Due<T> {
    pub handle: TaskHandle,
    /// When it was scheduled to fire (not when it was popped)
    pub deadline: f64,
    pub payload: T,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    handle: TaskHandle,
    deadline: f64,
    payload: T,
}

/// Timer queue keyed on simulated seconds
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: f64,
    next_id: u64,
    pending: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    /// Current simulated time (seconds)
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Fire `payload` after `delay` seconds (negative delays fire on the next pop)
    pub fn schedule_in(&mut self, delay: f32, payload: T) -> TaskHandle {
        let deadline = self.now + f64::from(delay.max(0.0));
        self.schedule_at(deadline, payload)
    }

    /// Fire `payload` at an absolute time
    pub fn schedule_at(&mut self, deadline: f64, payload: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Entry {
            handle,
            deadline,
            payload,
        });
        handle
    }

    /// Cancel a pending entry; `false` if it already fired or was cancelled
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|e| e.handle != handle);
        self.pending.len() != before
    }

    /// Cancel every entry whose payload matches
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|e| !pred(&e.payload));
        before - self.pending.len()
    }

    /// Cancel everything
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|e| e.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Move the clock forward
    pub fn advance(&mut self, dt: f32) {
        if dt > 0.0 {
            self.now += f64::from(dt);
        }
    }

    /// Earliest due entry (ties broken by scheduling order)
    pub fn pop_due(&mut self) -> Option<Due<T>> {
        let horizon = self.now + TIME_EPSILON;
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= horizon)
            .min_by(|(_, a), (_, b)| {
                a.deadline
                    .total_cmp(&b.deadline)
                    .then(a.handle.cmp(&b.handle))
            })
            .map(|(i, _)| i)?;
        let entry = self.pending.swap_remove(idx);
        Some(Due {
            handle: entry.handle,
            deadline: entry.deadline,
            payload: entry.payload,
        })
    }
}
