// Topics, serial ports, drive constants and the startup configuration surface
use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::motor::MotorType;

// Zenoh topics
pub const TOPIC_CMD: &str = "servobot/cmd"; // command requests
pub const TOPIC_RESPONSE: &str = "servobot/response"; // transport responses
pub const TOPIC_STATE: &str = "servobot/state"; // applied actuator/indicator state

// Serial port for the servo controller board
pub const SERVO_PORT: &str = "/dev/ttyACM0";

// Serial port for the Adalight LED strip
pub const LED_PORT: &str = "/dev/ttyUSB0";

// Number of pixels on the status strip
pub const LED_COUNT: usize = 8;

// Actuator slots are numbered 1..=SLOT_COUNT
pub const SLOT_COUNT: usize = 12;

// Slots 1..=6 drive the left side, 7..=12 the right side
pub const LEFT_SLOTS: std::ops::RangeInclusive<u8> = 1..=6;
pub const RIGHT_SLOTS: std::ops::RangeInclusive<u8> = 7..=12;

// Zero net motion for every actuator, whatever its profile
pub const NEUTRAL_ANGLE: u8 = 90;
pub const MAX_ANGLE: u8 = 180;

// Drive magnitudes in percent of full actuation range
pub const DEFAULT_LOW_SPEED: u8 = 60;
pub const DEFAULT_HIGH_SPEED: u8 = 90;
pub const MAX_SPEED: u8 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Slot {slot} is outside 1..={max}", max = SLOT_COUNT)]
    SlotOutOfRange { slot: u8 },

    #[error("Slot {slot} is configured more than once")]
    DuplicateSlot { slot: u8 },

    #[error("Slot {slot} has no configuration")]
    UnconfiguredSlot { slot: u8 },

    #[error("Startup angle {angle} for slot {slot} is above {max}", max = MAX_ANGLE)]
    AngleOutOfRange { slot: u8, angle: u8 },

    #[error("Speed magnitude {value} is above {max}", max = MAX_SPEED)]
    MagnitudeOutOfRange { value: u8 },

    #[error("Failed to attach slot {slot}: {source}")]
    Attach {
        slot: u8,
        #[source]
        source: crate::motor::OutputError,
    },

    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Binding of one actuator slot to a physical output pin and motor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfig {
    pub slot: u8,
    pub pin: u8,
    pub motor_type: MotorType,
    #[serde(default = "neutral_angle")]
    pub startup_angle: u8,
}

fn neutral_angle() -> u8 {
    NEUTRAL_ANGLE
}

/// Everything the controller needs at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub slots: Vec<SlotConfig>,
    #[serde(default = "default_low_speed")]
    pub low_speed: u8,
    #[serde(default = "default_high_speed")]
    pub high_speed: u8,
}

fn default_low_speed() -> u8 {
    DEFAULT_LOW_SPEED
}

fn default_high_speed() -> u8 {
    DEFAULT_HIGH_SPEED
}

impl Default for ControllerConfig {
    /// Reference wiring: slot N on pin N-1, continuous-rotation servos parked at neutral
    fn default() -> Self {
        let slots = (1..=SLOT_COUNT as u8)
            .map(|slot| SlotConfig {
                slot,
                pin: slot - 1,
                motor_type: MotorType::Continuous,
                startup_angle: NEUTRAL_ANGLE,
            })
            .collect();

        Self {
            slots,
            low_speed: DEFAULT_LOW_SPEED,
            high_speed: DEFAULT_HIGH_SPEED,
        }
    }
}

impl ControllerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject anything that would leave the robot partially configured
    pub fn validate(&self) -> Result<(), ConfigError> {
        for value in [self.low_speed, self.high_speed] {
            if value > MAX_SPEED {
                return Err(ConfigError::MagnitudeOutOfRange { value });
            }
        }

        let mut seen = HashSet::new();
        for slot in &self.slots {
            if slot.slot == 0 || slot.slot as usize > SLOT_COUNT {
                return Err(ConfigError::SlotOutOfRange { slot: slot.slot });
            }
            if slot.startup_angle > MAX_ANGLE {
                return Err(ConfigError::AngleOutOfRange {
                    slot: slot.slot,
                    angle: slot.startup_angle,
                });
            }
            if !seen.insert(slot.slot) {
                return Err(ConfigError::DuplicateSlot { slot: slot.slot });
            }
        }

        match (1..=SLOT_COUNT as u8).find(|slot| !seen.contains(slot)) {
            Some(slot) => Err(ConfigError::UnconfiguredSlot { slot }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ControllerConfig::default();
        assert_eq!(config.slots.len(), SLOT_COUNT);
        assert_eq!(config.low_speed, 60);
        assert_eq!(config.high_speed, 90);
        assert!(config.slots.iter().all(|s| s.startup_angle == NEUTRAL_ANGLE));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_slot_out_of_range_rejected() {
        let mut config = ControllerConfig::default();
        config.slots[0].slot = 13;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SlotOutOfRange { slot: 13 })
        ));

        config.slots[0].slot = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SlotOutOfRange { slot: 0 })
        ));
    }

    #[test]
    fn test_duplicate_and_missing_slots_rejected() {
        let mut config = ControllerConfig::default();
        config.slots[11].slot = 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateSlot { slot: 1 })
        ));

        let mut config = ControllerConfig::default();
        config.slots.remove(4);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnconfiguredSlot { slot: 5 })
        ));
    }

    #[test]
    fn test_bad_angle_and_magnitude_rejected() {
        let mut config = ControllerConfig::default();
        config.slots[2].startup_angle = 181;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AngleOutOfRange { slot: 3, angle: 181 })
        ));

        let mut config = ControllerConfig::default();
        config.high_speed = 101;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MagnitudeOutOfRange { value: 101 })
        ));
    }

    #[test]
    fn test_parse_json_with_defaults() {
        let json = r#"{
            "slots": [
                { "slot": 1, "pin": 4, "motor_type": "positional180" },
                { "slot": 2, "pin": 5, "motor_type": "standard", "startup_angle": 45 }
            ],
            "high_speed": 100
        }"#;
        let config = ControllerConfig::from_json_str(json).unwrap();

        assert_eq!(config.slots[0].motor_type, MotorType::Positional180);
        assert_eq!(config.slots[0].startup_angle, NEUTRAL_ANGLE);
        assert_eq!(config.slots[1].startup_angle, 45);
        assert_eq!(config.low_speed, DEFAULT_LOW_SPEED);
        assert_eq!(config.high_speed, 100);

        // Only two of twelve slots present
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnconfiguredSlot { slot: 3 })
        ));
    }

    #[test]
    fn test_parse_error_reported() {
        assert!(matches!(
            ControllerConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
