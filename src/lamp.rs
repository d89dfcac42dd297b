//! Lamp driver: capability discovery and the two lamp primitives.
//!
//! The driver owns the platform [`LampHardware`] and the cached unit
//! selection.  It knows nothing about modes or patterns; the
//! [`PatternScheduler`](crate::scheduler::PatternScheduler) is its only
//! caller.
//!
//! ## Failure contract
//!
//! | Situation                        | Result  | Side effect                 |
//! |----------------------------------|---------|-----------------------------|
//! | enumeration error / no flash     | `false` | `HardwareUnavailable` kept  |
//! | permission missing               | `false` | `PermissionDenied` kept     |
//! | busy / access denied / I/O       | `false` | fault kept                  |
//! | stale handle                     | `false` | selection dropped           |
//! | strength write fails             | retried once as plain "on"  | |
//!
//! Nothing is ever returned as an `Err`; the last failure is retained
//! for [`LampDriver::take_error`].

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{Facing, LampHardware, UnitId, UnitInfo};
use crate::error::LampError;

/// Immutable capability snapshot of the selected unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LampCapability {
    pub available: bool,
    pub strength_supported: bool,
    /// Highest strength level, always `>= 1`.
    pub max_level: u8,
}

impl LampCapability {
    pub const UNAVAILABLE: Self = Self {
        available: false,
        strength_supported: false,
        max_level: 1,
    };

    fn for_unit(unit: &UnitInfo) -> Self {
        let max_level = unit.max_level.max(1);
        Self {
            available: true,
            strength_supported: max_level > 1,
            max_level,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Selection {
    unit: UnitId,
    capability: LampCapability,
}

/// Hardware-facing half of the lamp controller.
pub struct LampDriver<H: LampHardware> {
    hw: H,
    selection: Option<Selection>,
    /// Last failure, kept until taken.
    last_error: Option<LampError>,
    /// Failure currently repeating on every write (for edge-triggered logs).
    failing: Option<LampError>,
}

impl<H: LampHardware> LampDriver<H> {
    pub fn new(hw: H) -> Self {
        Self {
            hw,
            selection: None,
            last_error: None,
            failing: None,
        }
    }

    /// Select a unit (if not already selected) and report its capability.
    ///
    /// Prefers a rear-facing unit with a flash, then any unit with a flash,
    /// in enumeration order.  Never fails: no unit means `available = false`.
    pub fn discover(&mut self) -> LampCapability {
        self.ensure_selected()
            .map_or(LampCapability::UNAVAILABLE, |sel| sel.capability)
    }

    /// Cached capability without touching hardware.
    pub fn capability(&self) -> Option<LampCapability> {
        self.selection.map(|sel| sel.capability)
    }

    /// Turn the lamp fully on or off.
    pub fn set_on(&mut self, on: bool) -> bool {
        let Some(sel) = self.ready() else {
            return false;
        };
        self.write_torch(sel.unit, on)
    }

    /// Drive the lamp at `level`, degrading when variable output is missing.
    ///
    /// `0` is the same as `set_on(false)`; values above the unit maximum
    /// are clamped.  A failed strength write falls back once to plain on.
    pub fn set_level(&mut self, level: u8) -> bool {
        let Some(sel) = self.ready() else {
            return false;
        };
        let cap = sel.capability;

        if !cap.strength_supported {
            return self.write_torch(sel.unit, level > 0);
        }

        let level = level.min(cap.max_level);
        if level == 0 {
            return self.write_torch(sel.unit, false);
        }

        match self.hw.set_strength(sel.unit, level) {
            Ok(()) => {
                self.recovered();
                true
            }
            Err(e) if e.invalidates_selection() => {
                self.fail(e);
                false
            }
            Err(e) => {
                warn!("Lamp: strength {} failed ({}), falling back to plain on", level, e);
                self.last_error = Some(e);
                self.write_torch(sel.unit, true)
            }
        }
    }

    /// Whether a unit is selected and may be driven right now.
    ///
    /// A `false` is recorded like any write failure.
    pub fn ensure_ready(&mut self) -> bool {
        self.ready().is_some()
    }

    /// Drain the last recorded failure.
    pub fn take_error(&mut self) -> Option<LampError> {
        self.last_error.take()
    }

    /// Borrow the underlying hardware adapter.
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Mutably borrow the underlying hardware adapter.
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    // ── Internal ──────────────────────────────────────────────

    fn ready(&mut self) -> Option<Selection> {
        let sel = self.ensure_selected()?;
        if !self.hw.has_permission() {
            self.fail(LampError::PermissionDenied);
            return None;
        }
        Some(sel)
    }

    fn ensure_selected(&mut self) -> Option<Selection> {
        if let Some(sel) = self.selection {
            return Some(sel);
        }

        let units = match self.hw.units() {
            Ok(units) => units,
            Err(e) => {
                warn!("Lamp: unit enumeration failed: {}", e);
                self.fail(LampError::HardwareUnavailable);
                return None;
            }
        };

        let chosen = units
            .iter()
            .find(|u| u.has_flash && u.facing == Facing::Rear)
            .or_else(|| units.iter().find(|u| u.has_flash));

        let Some(unit) = chosen else {
            self.fail(LampError::HardwareUnavailable);
            return None;
        };

        let sel = Selection {
            unit: unit.id,
            capability: LampCapability::for_unit(unit),
        };
        info!(
            "Lamp: selected unit {} ({:?}, max_level={})",
            unit.id.0, unit.facing, sel.capability.max_level
        );
        self.selection = Some(sel);
        Some(sel)
    }

    fn write_torch(&mut self, unit: UnitId, on: bool) -> bool {
        match self.hw.set_torch(unit, on) {
            Ok(()) => {
                self.recovered();
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    fn fail(&mut self, e: LampError) {
        if e.invalidates_selection() {
            info!("Lamp: selected unit went stale, will re-discover");
            self.selection = None;
        }
        if self.failing == Some(e) {
            debug!("Lamp: write failed again: {}", e);
        } else {
            warn!("Lamp: write failed: {}", e);
        }
        self.failing = Some(e);
        self.last_error = Some(e);
    }

    fn recovered(&mut self) {
        if let Some(e) = self.failing.take() {
            info!("Lamp: writes recovered after: {}", e);
        }
    }
}
