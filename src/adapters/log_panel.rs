//! Log-backed screen panel for the simulator.

use log::info;

use crate::app::ports::ScreenPanel;
use crate::screen_light::ScreenColor;

#[derive(Debug, Default)]
pub struct LogPanel {
    awake: bool,
}

impl LogPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_awake(&self) -> bool {
        self.awake
    }
}

impl ScreenPanel for LogPanel {
    fn fill(&mut self, color: ScreenColor) {
        info!("PANEL | fill {}", color);
    }

    fn keep_awake(&mut self, on: bool) {
        self.awake = on;
        info!("PANEL | keep-awake {}", if on { "on" } else { "off" });
    }
}
