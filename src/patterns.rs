//! Blink pattern timing.
//!
//! ## Pattern types
//!
//! | Pattern | Description                                 | Timing             |
//! |---------|---------------------------------------------|--------------------|
//! | Strobe  | On/off square wave at a user speed          | 1000 / speed ms    |
//! | SOS     | `... --- ...` then a word gap, repeating    | 200/600/1200 ms    |
//!
//! Both are pure data here; the
//! [`PatternScheduler`](crate::scheduler::PatternScheduler) walks them on
//! the session timeline.

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;

// ── Strobe ────────────────────────────────────────────────────

/// Strobe timing derived from a user-facing speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrobeConfig {
    /// Speed after clamping to the configured range.
    pub speed: u8,
    /// Full on+off period in milliseconds, never below the floor.
    pub interval_ms: u32,
    /// Delay between consecutive flips.
    pub flip_delay_ms: u32,
}

impl StrobeConfig {
    /// Map `speed` onto an interval: `max(floor, round(1000 / speed))`.
    ///
    /// An inverted speed range collapses onto its lower bound.
    pub fn from_speed(speed: u8, config: &SessionConfig) -> Self {
        let min = config.strobe_min_speed.max(1);
        let max = config.strobe_max_speed.max(min);
        let speed = speed.clamp(min, max);
        let floor = config.strobe_floor_ms.max(1);
        let interval_ms = strobe_interval_ms(speed).max(floor);
        Self {
            speed,
            interval_ms,
            flip_delay_ms: (interval_ms / 2).max(floor),
        }
    }
}

/// `round(1000 / speed)` with integer arithmetic.
fn strobe_interval_ms(speed: u8) -> u32 {
    let speed = u32::from(speed.max(1));
    (1000 + speed / 2) / speed
}

// ── SOS ───────────────────────────────────────────────────────

/// One step of the SOS sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SosStep {
    pub on: bool,
    pub duration_ms: u32,
}

const DOT_MS: u32 = 200;
const DASH_MS: u32 = 600;
const GAP_MS: u32 = 200;
const WORD_GAP_MS: u32 = 1200;

const fn lit(duration_ms: u32) -> SosStep {
    SosStep { on: true, duration_ms }
}

const fn dark(duration_ms: u32) -> SosStep {
    SosStep { on: false, duration_ms }
}

/// `... --- ...` followed by a silent word gap.
pub const SOS_PATTERN: [SosStep; 19] = [
    // S
    lit(DOT_MS),
    dark(GAP_MS),
    lit(DOT_MS),
    dark(GAP_MS),
    lit(DOT_MS),
    dark(GAP_MS),
    // O
    lit(DASH_MS),
    dark(GAP_MS),
    lit(DASH_MS),
    dark(GAP_MS),
    lit(DASH_MS),
    dark(GAP_MS),
    // S
    lit(DOT_MS),
    dark(GAP_MS),
    lit(DOT_MS),
    dark(GAP_MS),
    lit(DOT_MS),
    dark(GAP_MS),
    // word gap
    dark(WORD_GAP_MS),
];

/// Index that follows `index` in the cyclic SOS traversal.
pub const fn next_sos_index(index: usize) -> usize {
    (index + 1) % SOS_PATTERN.len()
}

/// Length of one full SOS cycle in milliseconds.
pub fn sos_cycle_ms() -> u32 {
    SOS_PATTERN.iter().map(|s| s.duration_ms).sum()
}
