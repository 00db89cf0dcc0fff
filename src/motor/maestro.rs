// Pololu Maestro servo controller, compact serial protocol
//
// Command format: [command, channel, value & 0x7F, (value >> 7) & 0x7F]
// Targets are in quarter-microseconds.

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use serialport::{self, SerialPort};
use tracing::{debug, info};

use super::output::{OutputError, ServoOutput};
use super::profile::MotorProfile;

/// Default serial configuration for the Maestro command port
pub const DEFAULT_BAUDRATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Largest Maestro has 24 channels
pub const MAX_CHANNELS: u8 = 24;

/// Frame rate the board is configured for
const BOARD_FREQUENCY_HZ: f32 = 50.0;

/// Compact protocol commands
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Instruction {
    SetTarget = 0x84,
    SetSpeed = 0x87,
    SetAcceleration = 0x89,
}

pub type Result<T> = std::result::Result<T, OutputError>;

/// Maestro servo controller on a serial port
pub struct MaestroBus {
    port: Box<dyn SerialPort>,
    profiles: HashMap<u8, MotorProfile>,
}

impl MaestroBus {
    /// Open a new connection to the controller
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    /// Open with custom baudrate
    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self> {
        info!("Opening servo controller on {}", port_name);
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self {
            port,
            profiles: HashMap::new(),
        })
    }

    /// Build a command frame carrying a 14-bit value
    fn build_packet(instruction: Instruction, channel: u8, value: u16) -> [u8; 4] {
        [
            instruction as u8,
            channel,
            (value & 0x7F) as u8,
            ((value >> 7) & 0x7F) as u8,
        ]
    }

    fn send_packet(&mut self, packet: &[u8]) -> Result<()> {
        self.port.write_all(packet)?;
        self.port.flush()?;
        Ok(())
    }

    fn check_channel(channel: u8) -> Result<()> {
        if channel >= MAX_CHANNELS {
            return Err(OutputError::InvalidPin { pin: channel });
        }
        Ok(())
    }

    /// Set target in quarter-microseconds (0 stops sending pulses)
    pub fn set_target(&mut self, channel: u8, quarter_us: u16) -> Result<()> {
        Self::check_channel(channel)?;
        let packet = Self::build_packet(Instruction::SetTarget, channel, quarter_us);
        debug!("Set target: channel={}, target={}", channel, quarter_us);
        self.send_packet(&packet)
    }

    /// Speed limit in (0.25us / 10ms) units, 0 = unlimited
    pub fn set_speed(&mut self, channel: u8, speed: u16) -> Result<()> {
        Self::check_channel(channel)?;
        let packet = Self::build_packet(Instruction::SetSpeed, channel, speed);
        self.send_packet(&packet)
    }

    /// Acceleration limit, 0 = unlimited
    pub fn set_acceleration(&mut self, channel: u8, acceleration: u16) -> Result<()> {
        Self::check_channel(channel)?;
        let packet = Self::build_packet(Instruction::SetAcceleration, channel, acceleration);
        self.send_packet(&packet)
    }
}

impl ServoOutput for MaestroBus {
    fn attach(&mut self, pin: u8, profile: &MotorProfile) -> Result<()> {
        Self::check_channel(pin)?;
        if profile.pwm_frequency_hz != BOARD_FREQUENCY_HZ {
            info!(
                "Channel {} profile asks for {}Hz, board runs at {}Hz",
                pin, profile.pwm_frequency_hz, BOARD_FREQUENCY_HZ
            );
        }
        // Jump straight to targets, ramping is not part of the drive model
        self.set_speed(pin, 0)?;
        self.set_acceleration(pin, 0)?;
        self.profiles.insert(pin, *profile);
        Ok(())
    }

    fn write_pulse(&mut self, pin: u8, pulse_us: u16) -> Result<()> {
        let profile = self
            .profiles
            .get(&pin)
            .ok_or(OutputError::NotAttached { pin })?;
        let pulse_us = pulse_us.min(profile.max_pulse_us).max(profile.min_pulse_us);
        self.set_target(pin, pulse_us.saturating_mul(4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_packet() {
        // 1500us = 6000 quarter-us = 0x1770
        let packet = MaestroBus::build_packet(Instruction::SetTarget, 2, 6000);
        assert_eq!(packet, [0x84, 2, 0x70, 0x2E]);
    }

    #[test]
    fn test_build_acceleration_packet() {
        let packet = MaestroBus::build_packet(Instruction::SetAcceleration, 11, 0);
        assert_eq!(packet, [0x89, 11, 0, 0]);
    }

    #[test]
    fn test_build_packet_masks_to_14_bits() {
        let packet = MaestroBus::build_packet(Instruction::SetSpeed, 0, 0xFFFF);
        assert_eq!(packet, [0x87, 0, 0x7F, 0x7F]);
    }

    #[test]
    fn test_channel_limit() {
        assert!(MaestroBus::check_channel(23).is_ok());
        assert!(matches!(
            MaestroBus::check_channel(24),
            Err(OutputError::InvalidPin { pin: 24 })
        ));
    }
}
