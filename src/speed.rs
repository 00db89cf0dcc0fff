// Drive speed selection (low/high)

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_HIGH_SPEED, DEFAULT_LOW_SPEED};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedMode {
    #[default]
    Low,
    High,
}

/// Selected speed mode and the magnitude it maps to
///
/// `active` is always one of `low` or `high`; the last selection wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedState {
    mode: SpeedMode,
    low: u8,
    high: u8,
    active: u8,
}

impl Default for SpeedState {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_SPEED, DEFAULT_HIGH_SPEED)
    }
}

impl SpeedState {
    /// Starts in low mode
    pub fn new(low: u8, high: u8) -> Self {
        Self {
            mode: SpeedMode::Low,
            low,
            high,
            active: low,
        }
    }

    pub fn select_low(&mut self) {
        self.mode = SpeedMode::Low;
        self.active = self.low;
    }

    pub fn select_high(&mut self) {
        self.mode = SpeedMode::High;
        self.active = self.high;
    }

    pub fn mode(&self) -> SpeedMode {
        self.mode
    }

    /// Magnitude in percent used for drive commands
    pub fn magnitude(&self) -> u8 {
        self.active
    }
}
