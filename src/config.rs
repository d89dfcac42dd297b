//! Session configuration parameters
//!
//! All tunable parameters for the lamp session. Defaults match the
//! shipping app; a JSON file can override them in the simulator.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::screen_light::ScreenColor;

/// Core session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    // --- Strobe ---
    /// Slowest user-facing strobe speed
    pub strobe_min_speed: u8,
    /// Fastest user-facing strobe speed
    pub strobe_max_speed: u8,
    /// Speed used when a strobe is started without one
    pub strobe_default_speed: u8,
    /// Hardware-safety floor for the strobe period and flip delay (milliseconds)
    pub strobe_floor_ms: u32,

    // --- Torch ---
    /// Intensity used for TorchOn without a level (`None` = plain on)
    pub torch_default_level: Option<u8>,

    // --- Auto-off ---
    /// How often the auto-off deadline is checked (milliseconds)
    pub auto_off_check_ms: u32,
    /// Upper bound accepted for AutoOffSet (minutes)
    pub auto_off_max_minutes: u32,

    // --- Screen light ---
    /// Color painted when the screen light opens
    pub screen_color: ScreenColor,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            // Strobe
            strobe_min_speed: 1,
            strobe_max_speed: 10,
            strobe_default_speed: 10,
            strobe_floor_ms: 30,

            // Torch
            torch_default_level: None,

            // Auto-off
            auto_off_check_ms: 1000, // 1 Hz
            auto_off_max_minutes: 120,

            // Screen light
            screen_color: ScreenColor::WHITE,
        }
    }
}

impl SessionConfig {
    /// Reject inconsistent values instead of silently clamping them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strobe_min_speed == 0 {
            return Err(ConfigError::ValidationFailed("strobe_min_speed must be >= 1"));
        }
        if self.strobe_min_speed > self.strobe_max_speed {
            return Err(ConfigError::ValidationFailed(
                "strobe_min_speed must not exceed strobe_max_speed",
            ));
        }
        if !(self.strobe_min_speed..=self.strobe_max_speed).contains(&self.strobe_default_speed) {
            return Err(ConfigError::ValidationFailed(
                "strobe_default_speed outside strobe speed range",
            ));
        }
        if self.strobe_floor_ms == 0 {
            return Err(ConfigError::ValidationFailed("strobe_floor_ms must be > 0"));
        }
        if self.torch_default_level == Some(0) {
            return Err(ConfigError::ValidationFailed(
                "torch_default_level must be >= 1 when set",
            ));
        }
        if self.auto_off_check_ms == 0 {
            return Err(ConfigError::ValidationFailed("auto_off_check_ms must be > 0"));
        }
        Ok(())
    }
}

/// Errors from configuration loading and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
