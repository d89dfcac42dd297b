//! Port traits — the hexagonal boundary between lamp logic and the platform.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Session (domain)
//! ```
//!
//! Platform adapters (camera/torch service, GPIO/PWM lamp, display panel,
//! clock, event sinks) implement these traits.  The
//! [`Session`](super::session::Session) consumes them via generics, so the
//! domain core never touches hardware directly.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::screen_light::ScreenColor;

/// Maximum number of lamp-bearing units a platform may report.
pub const MAX_UNITS: usize = 8;

// ───────────────────────────────────────────────────────────────
// Lamp hardware port (driven adapter: domain → lamp)
// ───────────────────────────────────────────────────────────────

/// Opaque platform identifier of a lamp-bearing unit (a camera id on phones).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u16);

/// Which way a unit faces.  The rear unit is the preferred torch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Rear,
    Front,
    External,
}

/// What the platform reports about one unit during enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitInfo {
    pub id: UnitId,
    pub facing: Facing,
    /// Whether the unit carries a flash LED at all.
    pub has_flash: bool,
    /// Highest strength level (1 = on/off only).
    pub max_level: u8,
}

/// Write-side port: the driver calls this to command the physical lamp.
///
/// Every method is expected to return quickly; a platform call that can
/// block must be bounded by the adapter.
pub trait LampHardware {
    /// Enumerate units in platform order.
    fn units(&mut self) -> Result<Vec<UnitInfo, MAX_UNITS>>;

    /// Switch the unit's lamp fully on or off.
    fn set_torch(&mut self, unit: UnitId, on: bool) -> Result<()>;

    /// Drive the unit at a strength level in `1..=max_level`.
    ///
    /// Units without variable output keep this default.
    fn set_strength(&mut self, unit: UnitId, level: u8) -> Result<()> {
        let _ = (unit, level);
        Err(crate::error::LampError::UnsupportedCapability)
    }

    /// Whether the process currently holds the authorization to drive the lamp.
    fn has_permission(&self) -> bool {
        true
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Time source for the session timeline and the auto-off deadline.
pub trait Clock {
    /// Monotonic milliseconds; drives the blink timeline.
    fn now_ms(&self) -> u64;

    /// Wall-clock milliseconds since the Unix epoch; drives auto-off.
    fn epoch_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → notification / logging)
// ───────────────────────────────────────────────────────────────

/// The session emits structured [`SessionEvent`](super::events::SessionEvent)s
/// through this port.  Adapters decide where they go (log, persistent
/// notification, quick-toggle tile state, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::SessionEvent);
}

// ───────────────────────────────────────────────────────────────
// Screen panel port (driven adapter: domain → display)
// ───────────────────────────────────────────────────────────────

/// A display that can be used as a light source.
pub trait ScreenPanel {
    /// Paint the whole panel with one color.
    fn fill(&mut self, color: ScreenColor);

    /// Keep the display from sleeping while the screen light is open.
    fn keep_awake(&mut self, on: bool);
}
