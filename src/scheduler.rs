//! Pattern scheduler and torch-state controller.
//!
//! Owns the authoritative lamp state: which [`Mode`] is active and whether
//! the lamp is currently lit.  Strobe and SOS are driven by self-
//! rescheduling ticks on the session [`Timeline`]; the handle of the one
//! pending tick lives inside the active mode's state.
//!
//! ```text
//!                  ┌──────────── start_* ─────────────┐
//!                  │                                  ▼
//!   ┌─────┐   teardown: cancel tick ─▶ lamp off ─▶ apply new mode
//!   │ Off │◀── stop_* / shutdown                      │
//!   └─────┘                                           ▼
//!              Torch ─ update_torch_level      Strobe / Sos ─┐
//!                                                   ▲        │ tick
//!                                                   └────────┘
//! ```
//!
//! A tick whose handle does not match the handle stored in the active
//! mode is stale and does nothing.  That check, plus cancel-before-apply
//! on every switch, is what keeps two patterns from ever interleaving
//! lamp writes.
//!
//! A failed lamp write never stops a pattern: bookkeeping and the clock
//! keep running, and the next tick writes again.
//!
//! A tick handled late never replays the flips it missed.  The pattern
//! jumps forward by whole steps to where it would be now, writes once and
//! schedules the next step on the original phase.

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::app::ports::LampHardware;
use crate::config::SessionConfig;
use crate::lamp::{LampCapability, LampDriver};
use crate::patterns::{SOS_PATTERN, StrobeConfig, next_sos_index, sos_cycle_ms};
use crate::timeline::{Task, TaskHandle, Timeline};

// ═══════════════════════════════════════════════════════════════
//  Mode
// ═══════════════════════════════════════════════════════════════

/// Externally visible lamp mode.  Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Off,
    /// Steady light; `None` means plain on without an intensity.
    Torch { level: Option<u8> },
    Strobe { speed: u8, interval_ms: u32 },
    Sos,
}

impl Mode {
    /// True for the timed modes that own a pending tick.
    pub fn is_pattern(self) -> bool {
        matches!(self, Self::Strobe { .. } | Self::Sos)
    }
}

/// Internal mode state, including the pending tick handle.
#[derive(Debug, Clone, Copy)]
enum Active {
    Off,
    Torch {
        level: Option<u8>,
    },
    Strobe {
        timing: StrobeConfig,
        pending: Option<TaskHandle>,
    },
    Sos {
        index: usize,
        pending: Option<TaskHandle>,
    },
}

impl Active {
    fn mode(self) -> Mode {
        match self {
            Self::Off => Mode::Off,
            Self::Torch { level } => Mode::Torch { level },
            Self::Strobe { timing, .. } => Mode::Strobe {
                speed: timing.speed,
                interval_ms: timing.interval_ms,
            },
            Self::Sos { .. } => Mode::Sos,
        }
    }

    fn pending(self) -> Option<TaskHandle> {
        match self {
            Self::Strobe { pending, .. } | Self::Sos { pending, .. } => pending,
            Self::Off | Self::Torch { .. } => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// Mode state machine plus the blink loops.  Sole caller of the driver.
pub struct PatternScheduler<H: LampHardware> {
    driver: LampDriver<H>,
    config: SessionConfig,
    active: Active,
    /// Authoritative "lamp is lit" flag; never read back from hardware.
    lamp_lit: bool,
    /// Last requested strobe speed, used when restarting without one.
    strobe_speed: u8,
}

impl<H: LampHardware> PatternScheduler<H> {
    pub fn new(driver: LampDriver<H>, config: SessionConfig) -> Self {
        let strobe_speed = config.strobe_default_speed;
        Self {
            driver,
            config,
            active: Active::Off,
            lamp_lit: false,
            strobe_speed,
        }
    }

    // ── Torch ─────────────────────────────────────────────────

    /// Enter Torch, tearing down whatever ran before.
    ///
    /// Returns whether the lamp write was confirmed; the mode changes
    /// either way.
    pub fn start_torch(&mut self, level: Option<u8>, timeline: &mut Timeline) -> bool {
        self.teardown(timeline);

        let level = level
            .or(self.config.torch_default_level)
            .map(|l| self.supported_level(l));
        let ok = match level {
            Some(level) => self.driver.set_level(level),
            None => self.driver.set_on(true),
        };
        self.lamp_lit = true;
        self.set_active(Active::Torch { level });
        ok
    }

    /// Leave Torch.  No-op in any other mode.
    pub fn stop_torch(&mut self, timeline: &mut Timeline) -> bool {
        if !matches!(self.active, Active::Torch { .. }) {
            debug!("Scheduler: stop_torch ignored in {:?}", self.mode());
            return false;
        }
        self.teardown(timeline);
        true
    }

    /// Change the torch intensity in place.  Ignored outside Torch.
    pub fn update_torch_level(&mut self, level: u8) -> bool {
        if !matches!(self.active, Active::Torch { .. }) {
            debug!("Scheduler: torch level {} ignored in {:?}", level, self.mode());
            return false;
        }
        let level = self.supported_level(level);
        let ok = self.driver.set_level(level);
        self.set_active(Active::Torch { level: Some(level) });
        ok
    }

    // ── Strobe ────────────────────────────────────────────────

    /// Enter Strobe at `speed` and flip the lamp on immediately.
    pub fn start_strobe(&mut self, speed: u8, timeline: &mut Timeline) {
        self.teardown(timeline);

        let timing = StrobeConfig::from_speed(speed, &self.config);
        self.strobe_speed = timing.speed;
        self.set_active(Active::Strobe {
            timing,
            pending: None,
        });
        let now_ms = timeline.now_ms();
        self.strobe_flip(now_ms, timeline);
    }

    /// Change the strobe speed.
    ///
    /// While running, the pending flip is cancelled and the alternation
    /// restarts now at the new interval.  Otherwise the speed is only
    /// remembered.  Returns whether a running strobe was updated.
    pub fn update_strobe_speed(&mut self, speed: u8, timeline: &mut Timeline) -> bool {
        let timing = StrobeConfig::from_speed(speed, &self.config);
        self.strobe_speed = timing.speed;

        let Active::Strobe { pending, .. } = self.active else {
            debug!("Scheduler: strobe speed {} stored (not running)", timing.speed);
            return false;
        };
        if let Some(handle) = pending {
            timeline.cancel(handle);
        }
        self.set_active(Active::Strobe {
            timing,
            pending: None,
        });
        let now_ms = timeline.now_ms();
        self.strobe_flip(now_ms, timeline);
        true
    }

    /// Leave Strobe.  No-op in any other mode.
    pub fn stop_strobe(&mut self, timeline: &mut Timeline) -> bool {
        if !matches!(self.active, Active::Strobe { .. }) {
            debug!("Scheduler: stop_strobe ignored in {:?}", self.mode());
            return false;
        }
        self.teardown(timeline);
        true
    }

    // ── SOS ───────────────────────────────────────────────────

    /// Enter Sos at the first dot.
    pub fn start_sos(&mut self, timeline: &mut Timeline) {
        self.teardown(timeline);
        self.set_active(Active::Sos {
            index: 0,
            pending: None,
        });
        let now_ms = timeline.now_ms();
        self.sos_step(0, now_ms, timeline);
    }

    /// Leave Sos.  No-op in any other mode.
    pub fn stop_sos(&mut self, timeline: &mut Timeline) -> bool {
        if !matches!(self.active, Active::Sos { .. }) {
            debug!("Scheduler: stop_sos ignored in {:?}", self.mode());
            return false;
        }
        self.teardown(timeline);
        true
    }

    // ── Shared ────────────────────────────────────────────────

    /// Cancel whatever is active and force the lamp off, in any mode.
    pub fn shutdown(&mut self, timeline: &mut Timeline) {
        if let Some(handle) = self.active.pending() {
            timeline.cancel(handle);
        }
        self.force_off();
        self.set_active(Active::Off);
    }

    /// Timeline entry point for pattern ticks.
    ///
    /// `now_ms` is the real time the tick is handled at; the timeline sits
    /// at the tick's due time.  Each accepted tick writes the lamp at most
    /// once, however late it runs.
    ///
    /// Returns `false` (and touches nothing) for a stale tick: one whose
    /// handle is not the pending handle of the active pattern.
    pub fn on_tick(
        &mut self,
        handle: TaskHandle,
        task: Task,
        now_ms: u64,
        timeline: &mut Timeline,
    ) -> bool {
        match (self.active, task) {
            (Active::Strobe { pending, .. }, Task::StrobeFlip) if pending == Some(handle) => {
                self.strobe_flip(now_ms, timeline);
                true
            }
            (Active::Sos { pending, .. }, Task::SosStep(index)) if pending == Some(handle) => {
                self.sos_step(index, now_ms, timeline);
                true
            }
            _ => {
                trace!("Scheduler: stale {:?} ignored in {:?}", task, self.mode());
                false
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.active.mode()
    }

    /// Whether the scheduler believes the lamp is lit.
    pub fn is_lit(&self) -> bool {
        self.lamp_lit
    }

    /// Handle of the pattern tick currently waiting on the timeline.
    pub fn pending_tick(&self) -> Option<TaskHandle> {
        self.active.pending()
    }

    /// Current SOS traversal position, if in Sos.
    pub fn sos_index(&self) -> Option<usize> {
        match self.active {
            Active::Sos { index, .. } => Some(index),
            _ => None,
        }
    }

    /// Remembered strobe speed.
    pub fn strobe_speed(&self) -> u8 {
        self.strobe_speed
    }

    /// Discover (or recall) the lamp capability.
    pub fn discover(&mut self) -> LampCapability {
        self.driver.discover()
    }

    pub fn driver(&self) -> &LampDriver<H> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut LampDriver<H> {
        &mut self.driver
    }

    // ── Internal ──────────────────────────────────────────────

    /// Cancel the pending tick, force the lamp off, go to Off.
    /// Nothing to do when already Off.
    fn teardown(&mut self, timeline: &mut Timeline) {
        if matches!(self.active, Active::Off) {
            return;
        }
        self.shutdown(timeline);
    }

    fn force_off(&mut self) {
        if !self.driver.set_on(false) {
            debug!("Scheduler: force-off not confirmed by hardware");
        }
        self.lamp_lit = false;
    }

    /// Torch level the hardware can actually produce: `1..=max_level`.
    fn supported_level(&mut self, level: u8) -> u8 {
        let max_level = self.driver.discover().max_level.max(1);
        level.clamp(1, max_level)
    }

    fn strobe_flip(&mut self, now_ms: u64, timeline: &mut Timeline) {
        let Active::Strobe { timing, .. } = self.active else {
            return;
        };

        let delay = u64::from(timing.flip_delay_ms.max(1));
        let due = timeline.now_ms();
        let missed = now_ms.saturating_sub(due) / delay;
        if missed > 0 {
            debug!("Scheduler: strobe {} ms late, skipping {} flips", now_ms - due, missed);
            timeline.advance_to(due + missed * delay);
            // Skipped flips still count towards the on/off phase.
            if missed % 2 == 1 {
                self.lamp_lit = !self.lamp_lit;
            }
        }

        self.lamp_lit = !self.lamp_lit;
        if !self.driver.set_on(self.lamp_lit) {
            trace!("Scheduler: strobe flip not confirmed, continuing");
        }

        let pending = timeline.schedule(timing.flip_delay_ms, Task::StrobeFlip);
        self.active = Active::Strobe { timing, pending };
    }

    fn sos_step(&mut self, index: usize, now_ms: u64, timeline: &mut Timeline) {
        let due = timeline.now_ms();
        let (index, at) = sos_position(index, due, now_ms);
        if at > due {
            debug!("Scheduler: SOS {} ms late, resuming at step {}", now_ms - due, index);
            timeline.advance_to(at);
        }

        let Some(step) = SOS_PATTERN.get(index).copied() else {
            return;
        };

        self.lamp_lit = step.on;
        if !self.driver.set_on(step.on) {
            trace!("Scheduler: SOS step {} not confirmed, continuing", index);
        }

        let pending = timeline.schedule(step.duration_ms, Task::SosStep(next_sos_index(index)));
        self.active = Active::Sos { index, pending };
    }

    fn set_active(&mut self, next: Active) {
        let from = self.active.mode();
        let to = next.mode();
        if from != to {
            info!("Scheduler: {:?} -> {:?}", from, to);
        }
        self.active = next;
    }
}

/// Step that is current at `now_ms` when step `index` began at `start_ms`,
/// with the time that step began.
fn sos_position(mut index: usize, start_ms: u64, now_ms: u64) -> (usize, u64) {
    let cycle = u64::from(sos_cycle_ms());
    let late = now_ms.saturating_sub(start_ms);
    let mut at = start_ms + late / cycle * cycle;
    while let Some(step) = SOS_PATTERN.get(index) {
        let end = at + u64::from(step.duration_ms);
        if end > now_ms {
            break;
        }
        at = end;
        index = next_sos_index(index);
    }
    (index, at)
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
