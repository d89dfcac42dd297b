//! Error taxonomy for lamp hardware access.
//!
//! Hardware failures never escape the [`LampDriver`](crate::lamp::LampDriver)
//! as errors: the driver converts them into a boolean success signal and
//! keeps the last [`LampError`] around so the session can surface it.
//! All variants are `Copy` so they can be stored and re-emitted without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level lamp error
// ---------------------------------------------------------------------------

/// Every hardware-facing failure funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LampError {
    /// No lamp-capable unit was found, or enumeration failed.
    HardwareUnavailable,
    /// The unit exists but could not be driven right now.
    TransientAccess(AccessFault),
    /// The caller lacks the authorization required to drive the lamp.
    PermissionDenied,
    /// Variable intensity was requested but the unit cannot do it.
    /// Absorbed by the degrade path; never surfaced to callers.
    UnsupportedCapability,
}

impl LampError {
    /// True if this failure should make the driver re-discover hardware.
    pub const fn invalidates_selection(self) -> bool {
        matches!(self, Self::TransientAccess(AccessFault::StaleHandle))
    }
}

impl fmt::Display for LampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareUnavailable => write!(f, "lamp hardware unavailable"),
            Self::TransientAccess(e) => write!(f, "lamp access: {e}"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::UnsupportedCapability => write!(f, "capability not supported"),
        }
    }
}

impl std::error::Error for LampError {}

// ---------------------------------------------------------------------------
// Access faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AccessFault {
    /// Another client (e.g. an open camera) holds the unit.
    Busy,
    /// The platform refused access to the unit.
    AccessDenied,
    /// The cached unit handle no longer refers to a valid unit.
    StaleHandle,
    /// Low-level write failed (GPIO / PWM).
    Io,
}

impl fmt::Display for AccessFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "unit busy"),
            Self::AccessDenied => write!(f, "access denied"),
            Self::StaleHandle => write!(f, "stale unit handle"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl From<AccessFault> for LampError {
    fn from(e: AccessFault) -> Self {
        Self::TransientAccess(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Result alias for hardware port calls.
pub type Result<T> = core::result::Result<T, LampError>;
