//! Screen used as a light source.
//!
//! Paints the whole display one solid color while open.  Entirely
//! separate from the lamp [`Session`](crate::app::session::Session): no
//! timeline, no lamp writes.

use core::fmt::{self, Write as _};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::app::ports::ScreenPanel;

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ScreenColor {
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#RRGGBB`, uppercase.
    pub fn hex(self) -> heapless::String<7> {
        let mut s = heapless::String::new();
        // 7 bytes always fit.
        let _ = write!(s, "{}", self);
        s
    }

    /// Parse `#RRGGBB` or `RRGGBB`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Copy of `self` with one channel replaced.
    pub fn with_channel(self, channel: Channel, value: u8) -> Self {
        match channel {
            Channel::Red => Self { r: value, ..self },
            Channel::Green => Self { g: value, ..self },
            Channel::Blue => Self { b: value, ..self },
        }
    }
}

impl Default for ScreenColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for ScreenColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

/// Screen light controller over a [`ScreenPanel`].
pub struct ScreenLight<P: ScreenPanel> {
    panel: P,
    color: ScreenColor,
    open: bool,
}

impl<P: ScreenPanel> ScreenLight<P> {
    pub fn new(panel: P, color: ScreenColor) -> Self {
        Self {
            panel,
            color,
            open: false,
        }
    }

    /// Keep the panel awake and paint the current color.
    pub fn open(&mut self) {
        if !self.open {
            self.panel.keep_awake(true);
            self.open = true;
            info!("ScreenLight: open at {}", self.color);
        }
        self.panel.fill(self.color);
    }

    /// Release the panel.  The color is kept for the next `open`.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.panel.keep_awake(false);
        self.open = false;
        info!("ScreenLight: closed");
    }

    pub fn set_channel(&mut self, channel: Channel, value: u8) {
        self.set_color(self.color.with_channel(channel, value));
    }

    /// Change the color, repainting if open.
    pub fn set_color(&mut self, color: ScreenColor) {
        if color == self.color {
            return;
        }
        self.color = color;
        debug!("ScreenLight: color {}", color);
        if self.open {
            self.panel.fill(color);
        }
    }

    pub fn color(&self) -> ScreenColor {
        self.color
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }
}
