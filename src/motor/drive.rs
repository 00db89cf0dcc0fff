// Drive actuation for the twelve-slot tank base
//
// Converts percentage motion values into servo angles and writes them to
// the left (slots 1-6) and right (slots 7-12) groups.

use std::ops::RangeInclusive;

use tracing::{debug, info, warn};

use super::output::{ServoOutput, angle_to_pulse};
use super::profile::{MotorProfile, MotorProfileRegistry, MotorType};
use crate::config::{
    ConfigError, ControllerConfig, LEFT_SLOTS, MAX_ANGLE, NEUTRAL_ANGLE, RIGHT_SLOTS, SLOT_COUNT,
};

/// Side of the base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Left,
    Right,
}

impl Group {
    pub fn slots(self) -> RangeInclusive<u8> {
        match self {
            Group::Left => LEFT_SLOTS,
            Group::Right => RIGHT_SLOTS,
        }
    }
}

/// Map a motion percentage onto a servo angle
///
/// `pct` is clamped to [-100, 100] and mapped linearly onto [0, 180] with
/// integer division, so fractional angles truncate: -100 -> 0, 0 -> 90,
/// 100 -> 180, 33 -> 119.
pub fn percent_to_angle(pct: i32) -> u8 {
    let pct = pct.clamp(-100, 100);
    let angle = (pct + 100) * MAX_ANGLE as i32 / 200;
    angle.clamp(0, MAX_ANGLE as i32) as u8
}

#[derive(Debug, Clone, Copy)]
struct SlotBinding {
    pin: u8,
    profile: MotorProfile,
    angle: u8,
}

/// Owns the actuator slots and the output they are wired to
pub struct DriveActuation<O: ServoOutput> {
    output: O,
    registry: MotorProfileRegistry,
    slots: [Option<SlotBinding>; SLOT_COUNT],
}

impl<O: ServoOutput> DriveActuation<O> {
    pub fn new(output: O, registry: MotorProfileRegistry) -> Self {
        Self {
            output,
            registry,
            slots: [None; SLOT_COUNT],
        }
    }

    /// Validate `config` and configure every slot it lists
    pub fn from_config(
        output: O,
        registry: MotorProfileRegistry,
        config: &ControllerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut drive = Self::new(output, registry);
        for slot in &config.slots {
            drive.configure(slot.slot, slot.pin, slot.motor_type, slot.startup_angle)?;
        }
        info!("Configured {} actuator slots", config.slots.len());
        Ok(drive)
    }

    fn index(slot: u8) -> Result<usize, ConfigError> {
        if slot == 0 || slot as usize > SLOT_COUNT {
            return Err(ConfigError::SlotOutOfRange { slot });
        }
        Ok(slot as usize - 1)
    }

    /// Bind `slot` to `pin` with the profile for `motor_type`, then write
    /// `startup_angle` as its first position
    ///
    /// Each slot may be configured once.
    pub fn configure(
        &mut self,
        slot: u8,
        pin: u8,
        motor_type: MotorType,
        startup_angle: u8,
    ) -> Result<(), ConfigError> {
        let idx = Self::index(slot)?;
        if self.slots[idx].is_some() {
            return Err(ConfigError::DuplicateSlot { slot });
        }
        if startup_angle > MAX_ANGLE {
            return Err(ConfigError::AngleOutOfRange {
                slot,
                angle: startup_angle,
            });
        }

        let profile = self.registry.lookup(motor_type);
        self.output
            .attach(pin, &profile)
            .map_err(|source| ConfigError::Attach { slot, source })?;
        self.output
            .write_pulse(pin, angle_to_pulse(startup_angle, &profile))
            .map_err(|source| ConfigError::Attach { slot, source })?;

        info!(
            "Slot {} attached: pin={}, type={:?}, {}-{}us @ {}Hz, startup angle {}",
            slot,
            pin,
            motor_type,
            profile.min_pulse_us,
            profile.max_pulse_us,
            profile.pwm_frequency_hz,
            startup_angle
        );

        self.slots[idx] = Some(SlotBinding {
            pin,
            profile,
            angle: startup_angle,
        });
        Ok(())
    }

    /// Lowest slot number not yet configured
    pub fn first_unconfigured(&self) -> Option<u8> {
        self.slots
            .iter()
            .position(Option::is_none)
            .map(|idx| idx as u8 + 1)
    }

    fn write_angle(&mut self, slot: u8, angle: u8) {
        let Some(binding) = self.slots[slot as usize - 1].as_mut() else {
            warn!("Slot {} is not configured, skipping write", slot);
            return;
        };
        let pulse = angle_to_pulse(angle, &binding.profile);
        match self.output.write_pulse(binding.pin, pulse) {
            Ok(()) => binding.angle = angle,
            // Keep the last angle the output accepted
            Err(e) => warn!("Failed to write slot {} (pin {}): {}", slot, binding.pin, e),
        }
    }

    /// Write one angle, derived from `pct`, to every slot in `group`
    pub fn write_group(&mut self, group: Group, pct: i32) {
        let angle = percent_to_angle(pct);
        debug!("Writing {:?} group: pct={}, angle={}", group, pct, angle);
        for slot in group.slots() {
            self.write_angle(slot, angle);
        }
    }

    /// Tank-mixed drive: left group then right group
    pub fn drive(&mut self, left_pct: i32, right_pct: i32) {
        self.write_group(Group::Left, left_pct);
        self.write_group(Group::Right, right_pct);
    }

    /// Fail-safe: every slot to neutral, independent of speed selection
    pub fn stop_all(&mut self) {
        debug!("Stopping all slots");
        for slot in 1..=SLOT_COUNT as u8 {
            self.write_angle(slot, NEUTRAL_ANGLE);
        }
    }

    /// Last angle the output accepted for `slot`
    pub fn angle(&self, slot: u8) -> Option<u8> {
        let idx = Self::index(slot).ok()?;
        self.slots[idx].map(|binding| binding.angle)
    }

    /// Angles of all configured slots in slot order
    pub fn angles(&self) -> Vec<u8> {
        self.slots.iter().flatten().map(|b| b.angle).collect()
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}

impl<O: ServoOutput> Drop for DriveActuation<O> {
    fn drop(&mut self) {
        // Leave the robot parked when the controller goes away
        if self.first_unconfigured().is_none() {
            self.stop_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::output::{OutputError, SimulatedOutput};
    use crate::motor::profile::MotorProfile;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Simulated output whose `dead_pin` starts rejecting writes once armed
    struct FailingOutput {
        inner: SimulatedOutput,
        dead_pin: u8,
        armed: Arc<AtomicBool>,
    }

    impl ServoOutput for FailingOutput {
        fn attach(&mut self, pin: u8, profile: &MotorProfile) -> Result<(), OutputError> {
            self.inner.attach(pin, profile)
        }

        fn write_pulse(&mut self, pin: u8, pulse_us: u16) -> Result<(), OutputError> {
            if pin == self.dead_pin && self.armed.load(Ordering::SeqCst) {
                return Err(OutputError::Io(std::io::Error::other("channel fault")));
            }
            self.inner.write_pulse(pin, pulse_us)
        }
    }

    fn configured() -> DriveActuation<SimulatedOutput> {
        DriveActuation::from_config(
            SimulatedOutput::new(),
            MotorProfileRegistry::default(),
            &ControllerConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_percent_to_angle_boundaries() {
        assert_eq!(percent_to_angle(-100), 0);
        assert_eq!(percent_to_angle(0), 90);
        assert_eq!(percent_to_angle(100), 180);
    }

    #[test]
    fn test_percent_to_angle_clamps_input() {
        assert_eq!(percent_to_angle(500), percent_to_angle(100));
        assert_eq!(percent_to_angle(-500), percent_to_angle(-100));
        assert_eq!(percent_to_angle(i32::MAX), 180);
        assert_eq!(percent_to_angle(i32::MIN), 0);
    }

    #[test]
    fn test_percent_to_angle_truncates() {
        assert_eq!(percent_to_angle(60), 144);
        assert_eq!(percent_to_angle(-60), 36);
        // 67 * 0.9 = 60.3 and 133 * 0.9 = 119.7, both truncated
        assert_eq!(percent_to_angle(-33), 60);
        assert_eq!(percent_to_angle(33), 119);
        assert_eq!(percent_to_angle(-1), 89);
        assert_eq!(percent_to_angle(1), 90);
    }

    #[test]
    fn test_percent_to_angle_stays_in_range() {
        for pct in -100..=100 {
            let angle = percent_to_angle(pct);
            assert!(angle <= 180, "pct {} gave {}", pct, angle);
        }
    }

    #[test]
    fn test_configure_writes_startup_angle() {
        let mut drive = DriveActuation::new(SimulatedOutput::new(), MotorProfileRegistry::default());
        drive.configure(1, 4, MotorType::Positional180, 0).unwrap();

        assert_eq!(drive.angle(1), Some(0));
        assert_eq!(drive.output().pulse(4), Some(500));
        assert_eq!(drive.first_unconfigured(), Some(2));
    }

    #[test]
    fn test_configure_rejects_bad_slots() {
        let mut drive = DriveActuation::new(SimulatedOutput::new(), MotorProfileRegistry::default());
        assert!(matches!(
            drive.configure(0, 0, MotorType::Continuous, 90),
            Err(ConfigError::SlotOutOfRange { slot: 0 })
        ));
        assert!(matches!(
            drive.configure(13, 0, MotorType::Continuous, 90),
            Err(ConfigError::SlotOutOfRange { slot: 13 })
        ));

        drive.configure(1, 0, MotorType::Continuous, 90).unwrap();
        assert!(matches!(
            drive.configure(1, 1, MotorType::Continuous, 90),
            Err(ConfigError::DuplicateSlot { slot: 1 })
        ));
    }

    #[test]
    fn test_drive_writes_groups() {
        let mut drive = configured();
        drive.drive(-60, 60);

        for slot in 1..=6 {
            assert_eq!(drive.angle(slot), Some(36));
        }
        for slot in 7..=12 {
            assert_eq!(drive.angle(slot), Some(144));
        }
        // Continuous profile: 1000 + 36 * 1000 / 180 = 1200
        assert_eq!(drive.output().pulse(0), Some(1200));
        assert_eq!(drive.output().pulse(11), Some(1800));
    }

    #[test]
    fn test_stop_all_is_neutral() {
        let mut drive = configured();
        drive.drive(100, -100);
        drive.stop_all();

        assert_eq!(drive.angles(), vec![NEUTRAL_ANGLE; SLOT_COUNT]);
        for pin in 0..12 {
            assert_eq!(drive.output().pulse(pin), Some(1500));
        }
    }

    #[test]
    fn test_failed_write_skips_only_that_slot() {
        let armed = Arc::new(AtomicBool::new(false));
        let output = FailingOutput {
            inner: SimulatedOutput::new(),
            dead_pin: 2,
            armed: Arc::clone(&armed),
        };
        let mut drive = DriveActuation::from_config(
            output,
            MotorProfileRegistry::default(),
            &ControllerConfig::default(),
        )
        .unwrap();

        armed.store(true, Ordering::SeqCst);
        drive.drive(-60, 60);

        // Slot 3 sits on pin 2 and keeps its startup angle
        assert_eq!(drive.angle(3), Some(NEUTRAL_ANGLE));
        assert_eq!(drive.output().inner.pulse(2), Some(1500));
        for slot in [1, 2, 4, 5, 6] {
            assert_eq!(drive.angle(slot), Some(36), "slot {}", slot);
        }
        for slot in 7..=12 {
            assert_eq!(drive.angle(slot), Some(144), "slot {}", slot);
        }
        assert_eq!(drive.output().inner.pulse(11), Some(1800));

        drive.stop_all();
        assert_eq!(drive.angles(), vec![NEUTRAL_ANGLE; SLOT_COUNT]);

        // Recovered channel accepts writes again
        armed.store(false, Ordering::SeqCst);
        drive.drive(100, 100);
        assert_eq!(drive.angle(3), Some(180));
    }
}
