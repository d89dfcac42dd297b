//! Inbound commands to the lamp session.
//!
//! These are what the outside world (UI buttons, sliders, the quick
//! toggle, a notification action) can ask of the
//! [`Session`](super::session::Session).

use serde::{Deserialize, Serialize};

/// Torch-mode actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TorchAction {
    /// Steady light, at `level` when given.
    On { level: Option<u8> },
    /// Live intensity change; ignored outside Torch.
    UpdateLevel(u8),
    /// Stop any pattern and switch the lamp off.
    Off,
}

/// Strobe-mode actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrobeAction {
    /// Start at `speed`, or at the last remembered speed.
    Start { speed: Option<u8> },
    UpdateSpeed(u8),
    Stop,
}

/// SOS-mode actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SosAction {
    Start,
    Stop,
}

/// Commands that external adapters can send into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCommand {
    Torch(TorchAction),
    Strobe(StrobeAction),
    Sos(SosAction),

    /// (Re)arm the auto-off deadline; `0` disarms.
    AutoOffSet { minutes: u32 },

    /// Stop everything, lamp off, disarm auto-off.
    ShutdownAll,
}

impl From<TorchAction> for SessionCommand {
    fn from(action: TorchAction) -> Self {
        Self::Torch(action)
    }
}

impl From<StrobeAction> for SessionCommand {
    fn from(action: StrobeAction) -> Self {
        Self::Strobe(action)
    }
}

impl From<SosAction> for SessionCommand {
    fn from(action: SosAction) -> Self {
        Self::Sos(action)
    }
}
