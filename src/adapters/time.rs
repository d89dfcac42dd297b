//! Clock adapters.
//!
//! - [`SystemClock`] — `std::time::Instant` for the monotonic timeline,
//!   `SystemTime` for the wall-clock auto-off deadline.
//! - [`ManualClock`] — a shared, hand-advanced clock for tests and
//!   deterministic simulation.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::app::ports::Clock;

/// Host clock.
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn epoch_ms(&self) -> u64 {
        // A wall clock before 1970 reads as the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}

/// Manually advanced clock.  Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Rc<Cell<u64>>,
    epoch_offset_ms: u64,
}

impl ManualClock {
    /// Start at monotonic `0`, with the wall clock reading `epoch_start_ms`.
    pub fn new(epoch_start_ms: u64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(0)),
            epoch_offset_ms: epoch_start_ms,
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get().saturating_add(ms));
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn epoch_ms(&self) -> u64 {
        self.epoch_offset_ms.saturating_add(self.now_ms.get())
    }
}
