// Motor control for the servo tank base
//
// Provides:
// - Motor type profiles (pulse timing per servo class)
// - Percentage to angle conversion and group writes
// - Servo output backends (Maestro serial controller, simulated)

pub mod drive;
pub mod maestro;
pub mod output;
pub mod profile;

pub use drive::{DriveActuation, Group, percent_to_angle};
pub use maestro::MaestroBus;
pub use output::{OutputError, ServoOutput, SimulatedOutput};
pub use profile::{DEFAULT_PROFILE, MotorProfile, MotorProfileRegistry, MotorType};
