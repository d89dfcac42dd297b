//! Auto-off deadline.
//!
//! Holds an optional wall-clock deadline and a periodic check task on the
//! session timeline.  The timer only *reports* expiry; the session runs
//! the shutdown path, so this module never touches the lamp.

use log::{debug, info};

use crate::timeline::{Task, TaskHandle, Timeline};

const MS_PER_MINUTE: u64 = 60_000;

/// Result of one deadline check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The check belonged to a replaced or disarmed deadline.
    Stale,
    /// Deadline not reached; the next check is scheduled.
    Pending,
    /// Deadline reached or passed.  No further checks are scheduled.
    Expired,
}

pub struct AutoOffTimer {
    deadline_epoch_ms: Option<u64>,
    check: Option<TaskHandle>,
    check_ms: u32,
}

impl AutoOffTimer {
    /// `check_ms` is raised to at least 1 so a check never reschedules
    /// itself at the same instant.
    pub fn new(check_ms: u32) -> Self {
        Self {
            deadline_epoch_ms: None,
            check: None,
            check_ms: check_ms.max(1),
        }
    }

    /// Arm (or re-arm) for an absolute deadline, replacing any previous one.
    pub fn arm(&mut self, deadline_epoch_ms: u64, timeline: &mut Timeline) {
        self.cancel_check(timeline);
        self.deadline_epoch_ms = Some(deadline_epoch_ms);
        self.check = timeline.schedule(self.check_ms, Task::AutoOffCheck);
        info!("AutoOff: armed for epoch {} ms", deadline_epoch_ms);
    }

    /// Arm `minutes` from `now_epoch_ms`.  Zero minutes disarms.
    /// Returns the new deadline, if armed.
    pub fn arm_minutes(
        &mut self,
        minutes: u32,
        now_epoch_ms: u64,
        timeline: &mut Timeline,
    ) -> Option<u64> {
        if minutes == 0 {
            self.disarm(timeline);
            return None;
        }
        let deadline = now_epoch_ms.saturating_add(u64::from(minutes) * MS_PER_MINUTE);
        self.arm(deadline, timeline);
        Some(deadline)
    }

    /// Clear the deadline and its pending check.
    pub fn disarm(&mut self, timeline: &mut Timeline) {
        self.cancel_check(timeline);
        if self.deadline_epoch_ms.take().is_some() {
            info!("AutoOff: disarmed");
        }
    }

    /// Timeline entry point for [`Task::AutoOffCheck`].
    pub fn on_check(
        &mut self,
        handle: TaskHandle,
        now_epoch_ms: u64,
        timeline: &mut Timeline,
    ) -> CheckOutcome {
        if self.check != Some(handle) {
            return CheckOutcome::Stale;
        }
        let Some(deadline) = self.deadline_epoch_ms else {
            self.check = None;
            return CheckOutcome::Stale;
        };

        if now_epoch_ms >= deadline {
            self.check = None;
            info!("AutoOff: deadline reached");
            return CheckOutcome::Expired;
        }

        debug!("AutoOff: {} ms remaining", deadline - now_epoch_ms);
        self.check = timeline.schedule(self.check_ms, Task::AutoOffCheck);
        CheckOutcome::Pending
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline_epoch_ms
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_epoch_ms.is_some()
    }

    fn cancel_check(&mut self, timeline: &mut Timeline) {
        if let Some(handle) = self.check.take() {
            timeline.cancel(handle);
        }
    }
}
