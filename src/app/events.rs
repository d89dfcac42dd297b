//! Outbound session events.
//!
//! The [`Session`](super::session::Session) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log them, update a persistent
//! notification, mirror the mode on a quick-toggle tile.

use serde::{Deserialize, Serialize};

use crate::error::LampError;
use crate::lamp::LampCapability;
use crate::scheduler::Mode;

/// Why the session switched everything off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutdownReason {
    /// An explicit `ShutdownAll`.
    Command,
    /// The auto-off deadline passed.
    AutoOff,
}

/// Structured events emitted by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The session has started (carries the discovered capability).
    Started(LampCapability),

    /// The active mode changed.
    ModeChanged { from: Mode, to: Mode },

    AutoOffArmed { deadline_epoch_ms: u64 },

    AutoOffDisarmed,

    /// Lamp forced off and every pattern stopped.
    Shutdown { reason: ShutdownReason },

    /// The last command hit a lamp failure.
    LampFault(LampError),
}

/// Point-in-time session state for UI mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: Mode,
    pub lamp_lit: bool,
    pub capability: Option<LampCapability>,
    pub auto_off_deadline_epoch_ms: Option<u64>,
}
