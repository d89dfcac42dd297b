//! Cooperative delayed-task queue.
//!
//! One timeline per session.  Tasks are plain data ([`Task`]) with a due
//! time on the session's monotonic millisecond clock; nothing runs on its
//! own.  The session pops due tasks in [`Session::poll`] and dispatches
//! them, so every lamp write happens on the caller's thread.
//!
//! ```text
//!  schedule(delay, task) ──▶ ┌──────────────────────────┐
//!  cancel(handle)        ──▶ │ pending: [due, handle,   │ ──▶ pop_due(until)
//!                            │           task] × N      │
//!                            └──────────────────────────┘
//! ```
//!
//! While popping, `now_ms` jumps to the popped task's due time, so a
//! task rescheduled from inside its own dispatch is timed from when it
//! *should* have run, not from when the poll happened.  Late polls
//! therefore never accumulate drift.  Pattern ticks use that due time to
//! skip ahead rather than replay every missed step.
//!
//! [`Session::poll`]: crate::app::session::Session::poll

use core::cmp::Reverse;

use heapless::Vec;

/// Maximum number of tasks waiting at once.  A session never needs more
/// than one pattern tick plus one auto-off check.
pub const MAX_PENDING: usize = 8;

/// Cancellation token for one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u32);

/// Work items the session knows how to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Flip the strobe lamp state.
    StrobeFlip,
    /// Apply SOS step `n`.
    SosStep(usize),
    /// Compare wall-clock time to the auto-off deadline.
    AutoOffCheck,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    due_ms: u64,
    handle: TaskHandle,
    task: Task,
}

/// The session's single logical timeline.
#[derive(Debug)]
pub struct Timeline {
    now_ms: u64,
    next_handle: u32,
    pending: Vec<Entry, MAX_PENDING>,
}

impl Timeline {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms,
            next_handle: 0,
            pending: Vec::new(),
        }
    }

    /// Current position of the timeline.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `task` to run `delay_ms` after the current position.
    /// Returns `None` if the queue is full.
    pub fn schedule(&mut self, delay_ms: u32, task: Task) -> Option<TaskHandle> {
        let handle = TaskHandle(self.next_handle);
        let entry = Entry {
            due_ms: self.now_ms.saturating_add(u64::from(delay_ms)),
            handle,
            task,
        };
        if self.pending.push(entry).is_err() {
            log::error!("Timeline: queue full, dropping {:?}", task);
            return None;
        }
        self.next_handle = self.next_handle.wrapping_add(1);
        Some(handle)
    }

    /// Remove a pending task.  Returns `false` if it already ran or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.pending.iter().position(|e| e.handle == handle) {
            Some(idx) => {
                self.pending.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    /// Pop the earliest task due at or before `until_ms`.
    ///
    /// Ties run in scheduling order.  The timeline position moves to the
    /// popped task's due time.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TaskHandle, Task)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= until_ms)
            .min_by_key(|(_, e)| (e.due_ms, Reverse(self.age_of(e.handle))))
            .map(|(idx, _)| idx)?;

        let entry = self.pending.swap_remove(idx);
        self.now_ms = self.now_ms.max(entry.due_ms);
        Some((entry.handle, entry.task))
    }

    /// Move the timeline position forward without running anything.
    pub fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Due time of the next pending task.
    pub fn next_due(&self) -> Option<u64> {
        self.pending.iter().map(|e| e.due_ms).min()
    }

    /// Number of pending tasks matching `pred`.
    pub fn count_pending(&self, pred: impl Fn(&Task) -> bool) -> usize {
        self.pending.iter().filter(|e| pred(&e.task)).count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Scheduling age (larger = older), robust to handle wrap-around.
    fn age_of(&self, handle: TaskHandle) -> u32 {
        self.next_handle.wrapping_sub(handle.0)
    }
}
