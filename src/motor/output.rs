// Physical servo outputs: the trait the drive layer writes through, plus a
// simulated backend for running without hardware

use std::collections::HashMap;

use tracing::debug;

use super::profile::MotorProfile;
use crate::config::MAX_ANGLE;

/// Error types for servo output backends
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pin {pin} is not available on this output")]
    InvalidPin { pin: u8 },

    #[error("Pin {pin} written before it was attached")]
    NotAttached { pin: u8 },
}

/// Something that can hold servos at a commanded pulse width
pub trait ServoOutput: Send {
    /// Bind `pin` to the timing parameters of `profile`
    fn attach(&mut self, pin: u8, profile: &MotorProfile) -> Result<(), OutputError>;

    /// Hold `pin` at a pulse width in microseconds
    fn write_pulse(&mut self, pin: u8, pulse_us: u16) -> Result<(), OutputError>;
}

impl<T: ServoOutput + ?Sized> ServoOutput for Box<T> {
    fn attach(&mut self, pin: u8, profile: &MotorProfile) -> Result<(), OutputError> {
        (**self).attach(pin, profile)
    }

    fn write_pulse(&mut self, pin: u8, pulse_us: u16) -> Result<(), OutputError> {
        (**self).write_pulse(pin, pulse_us)
    }
}

/// Pulse width for `angle` within the profile's range, truncating toward zero
pub fn angle_to_pulse(angle: u8, profile: &MotorProfile) -> u16 {
    let angle = angle.min(MAX_ANGLE) as u32;
    let min = profile.min_pulse_us as u32;
    let max = profile.max_pulse_us.max(profile.min_pulse_us) as u32;
    (min + angle * (max - min) / MAX_ANGLE as u32) as u16
}

/// In-memory output: records bindings and the last pulse per pin
#[derive(Debug, Default)]
pub struct SimulatedOutput {
    attached: HashMap<u8, MotorProfile>,
    pulses: HashMap<u8, u16>,
}

impl SimulatedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self, pin: u8) -> Option<&MotorProfile> {
        self.attached.get(&pin)
    }

    pub fn pulse(&self, pin: u8) -> Option<u16> {
        self.pulses.get(&pin).copied()
    }
}

impl ServoOutput for SimulatedOutput {
    fn attach(&mut self, pin: u8, profile: &MotorProfile) -> Result<(), OutputError> {
        debug!("Simulated attach: pin={}, profile={:?}", pin, profile);
        self.attached.insert(pin, *profile);
        Ok(())
    }

    fn write_pulse(&mut self, pin: u8, pulse_us: u16) -> Result<(), OutputError> {
        if !self.attached.contains_key(&pin) {
            return Err(OutputError::NotAttached { pin });
        }
        self.pulses.insert(pin, pulse_us);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::profile::{DEFAULT_PROFILE, MotorProfileRegistry, MotorType};

    #[test]
    fn test_angle_to_pulse() {
        assert_eq!(angle_to_pulse(0, &DEFAULT_PROFILE), 1000);
        assert_eq!(angle_to_pulse(90, &DEFAULT_PROFILE), 1500);
        assert_eq!(angle_to_pulse(180, &DEFAULT_PROFILE), 2000);
        // Out of range angles are held at the top of the range
        assert_eq!(angle_to_pulse(255, &DEFAULT_PROFILE), 2000);

        let wide = MotorProfileRegistry::default().lookup(MotorType::Positional180);
        assert_eq!(angle_to_pulse(0, &wide), 500);
        assert_eq!(angle_to_pulse(90, &wide), 1500);
        // 500 + 1 * 2000 / 180 = 511.1
        assert_eq!(angle_to_pulse(1, &wide), 511);
    }

    #[test]
    fn test_simulated_output_requires_attach() {
        let mut output = SimulatedOutput::new();
        assert!(matches!(
            output.write_pulse(3, 1500),
            Err(OutputError::NotAttached { pin: 3 })
        ));

        output.attach(3, &DEFAULT_PROFILE).unwrap();
        output.write_pulse(3, 1500).unwrap();
        assert_eq!(output.pulse(3), Some(1500));
        assert_eq!(output.profile(3), Some(&DEFAULT_PROFILE));
    }
}
