//! Quick-toggle entry point.
//!
//! A system tile only knows on/off.  Its next command comes from the
//! session's mode, so a tile pressed while a pattern runs turns it off
//! instead of going out of sync with the app.

use crate::scheduler::Mode;

use super::commands::{SessionCommand, TorchAction};

/// Command a quick-toggle press issues in `current` mode.
pub fn toggle_command(current: Mode) -> SessionCommand {
    match current {
        Mode::Off => SessionCommand::Torch(TorchAction::On { level: None }),
        Mode::Torch { .. } | Mode::Strobe { .. } | Mode::Sos => {
            SessionCommand::Torch(TorchAction::Off)
        }
    }
}

/// Whether the tile should render as active.
pub fn tile_active(current: Mode) -> bool {
    current != Mode::Off
}
