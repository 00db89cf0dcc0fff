// Timing profiles for each class of servo actuator
//
// The registry is a small ordered table scanned front to back; the first
// entry whose type matches wins. Types with no entry fall back to
// DEFAULT_PROFILE, which is logged since it usually means a config typo.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Electromechanical class of an actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorType {
    /// Continuous-rotation servo: angle sets speed and direction, 90 is stop
    Continuous,
    /// Positional servo with 180 degrees of travel
    Positional180,
    /// Positional servo with 270 degrees of travel
    Positional270,
    /// Generic hobby servo
    Standard,
}

/// Pulse timing for one motor type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorProfile {
    pub motor_type: Option<MotorType>,
    pub pwm_frequency_hz: f32,
    pub min_pulse_us: u16,
    pub max_pulse_us: u16,
    // Reserved, not used by angle conversion
    pub input_min: f32,
    pub input_max: f32,
}

/// Used for any type without a registered profile
pub const DEFAULT_PROFILE: MotorProfile = MotorProfile {
    motor_type: None,
    pwm_frequency_hz: 50.0,
    min_pulse_us: 1000,
    max_pulse_us: 2000,
    input_min: 0.0,
    input_max: 180.0,
};

const fn profile(motor_type: MotorType, min_pulse_us: u16, max_pulse_us: u16) -> MotorProfile {
    MotorProfile {
        motor_type: Some(motor_type),
        pwm_frequency_hz: 50.0,
        min_pulse_us,
        max_pulse_us,
        input_min: 0.0,
        input_max: 180.0,
    }
}

/// Built-in profile table
pub const PROFILES: [MotorProfile; 4] = [
    profile(MotorType::Continuous, 1000, 2000),
    profile(MotorType::Positional180, 500, 2500),
    profile(MotorType::Positional270, 500, 2500),
    profile(MotorType::Standard, 1000, 2000),
];

#[derive(Debug, Clone)]
pub struct MotorProfileRegistry {
    profiles: Vec<MotorProfile>,
}

impl Default for MotorProfileRegistry {
    fn default() -> Self {
        Self::new(PROFILES.to_vec())
    }
}

impl MotorProfileRegistry {
    pub fn new(profiles: Vec<MotorProfile>) -> Self {
        Self { profiles }
    }

    /// First registered profile for `motor_type`, if any
    pub fn find(&self, motor_type: MotorType) -> Option<&MotorProfile> {
        self.profiles
            .iter()
            .find(|p| p.motor_type == Some(motor_type))
    }

    /// Profile for `motor_type`, or DEFAULT_PROFILE when none is registered
    pub fn lookup(&self, motor_type: MotorType) -> MotorProfile {
        match self.find(motor_type) {
            Some(profile) => *profile,
            None => {
                warn!(
                    "No profile registered for {:?}, using default {}-{}us @ {}Hz",
                    motor_type,
                    DEFAULT_PROFILE.min_pulse_us,
                    DEFAULT_PROFILE.max_pulse_us,
                    DEFAULT_PROFILE.pwm_frequency_hz
                );
                DEFAULT_PROFILE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles() {
        let registry = MotorProfileRegistry::default();

        let continuous = registry.lookup(MotorType::Continuous);
        assert_eq!(continuous.motor_type, Some(MotorType::Continuous));
        assert_eq!((continuous.min_pulse_us, continuous.max_pulse_us), (1000, 2000));

        let positional = registry.lookup(MotorType::Positional180);
        assert_eq!((positional.min_pulse_us, positional.max_pulse_us), (500, 2500));
        assert_eq!(positional.pwm_frequency_hz, 50.0);
    }

    #[test]
    fn test_first_match_wins() {
        let registry = MotorProfileRegistry::new(vec![
            profile(MotorType::Standard, 900, 2100),
            profile(MotorType::Standard, 1000, 2000),
        ]);
        let standard = registry.lookup(MotorType::Standard);
        assert_eq!((standard.min_pulse_us, standard.max_pulse_us), (900, 2100));
    }

    #[test]
    fn test_missing_type_falls_back_to_default() {
        let registry = MotorProfileRegistry::new(vec![profile(MotorType::Continuous, 1100, 1900)]);

        assert!(registry.find(MotorType::Positional270).is_none());
        let fallback = registry.lookup(MotorType::Positional270);
        assert_eq!(fallback, DEFAULT_PROFILE);
        assert_eq!(fallback.pwm_frequency_hz, 50.0);
        assert_eq!((fallback.min_pulse_us, fallback.max_pulse_us), (1000, 2000));
    }
}
