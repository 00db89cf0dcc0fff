// Command router: turns one command into speed, drive and indicator updates
//
// Each command runs to completion in a fixed order: "command received"
// indicator first, then the state change or actuator write. Unknown
// commands always end in a full stop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::config::{ConfigError, ControllerConfig};
use crate::indicator::{Indicator, IndicatorStrip};
use crate::messages::{AuxFunction, Command, Outcome, StateReport};
use crate::motor::{DriveActuation, MotorProfileRegistry, ServoOutput};
use crate::speed::SpeedState;

// Longest slice of an unknown token that goes into the log
const MAX_LOGGED_TOKEN: usize = 32;

/// First `MAX_LOGGED_TOKEN` characters of `token`
fn loggable(token: &str) -> &str {
    match token.char_indices().nth(MAX_LOGGED_TOKEN) {
        Some((end, _)) => &token[..end],
        None => token,
    }
}

/// Extension point for the auxiliary function keys
pub trait AuxiliaryHooks: Send {
    fn on_function(&mut self, _function: AuxFunction) {}
}

/// Default hooks: functions only change the indicator
#[derive(Debug, Default)]
pub struct NoHooks;

impl AuxiliaryHooks for NoHooks {}

/// Controller with runtime-selected hardware backends
pub type DynController = Controller<Box<dyn ServoOutput>, Box<dyn IndicatorStrip>>;

pub struct Controller<O: ServoOutput, S: IndicatorStrip> {
    speed: SpeedState,
    drive: DriveActuation<O>,
    indicator: Indicator<S>,
    hooks: Box<dyn AuxiliaryHooks>,
}

impl<O: ServoOutput, S: IndicatorStrip> Controller<O, S> {
    /// Assemble a controller from an already configured drive layer
    pub fn new(
        drive: DriveActuation<O>,
        indicator: Indicator<S>,
        speed: SpeedState,
    ) -> Result<Self, ConfigError> {
        if let Some(slot) = drive.first_unconfigured() {
            return Err(ConfigError::UnconfiguredSlot { slot });
        }
        Ok(Self {
            speed,
            drive,
            indicator,
            hooks: Box::new(NoHooks),
        })
    }

    /// Boot sequence: boot color, configure every slot, ready color
    pub fn from_config(output: O, strip: S, config: &ControllerConfig) -> Result<Self, ConfigError> {
        let mut indicator = Indicator::new(strip);
        indicator.boot();

        let drive = DriveActuation::from_config(output, MotorProfileRegistry::default(), config)?;
        let speed = SpeedState::new(config.low_speed, config.high_speed);

        let mut controller = Self::new(drive, indicator, speed)?;
        controller.indicator.ready();
        info!(
            "Controller ready: low={}%, high={}%",
            config.low_speed, config.high_speed
        );
        Ok(controller)
    }

    pub fn with_hooks(mut self, hooks: impl AuxiliaryHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Run one command
    pub fn execute(&mut self, command: &Command) -> Outcome {
        self.indicator.command_received();

        let speed = self.speed.magnitude() as i32;
        match command {
            Command::High => {
                self.speed.select_high();
                self.indicator.high_selected();
            }
            Command::Low => {
                self.speed.select_low();
                self.indicator.low_selected();
            }
            // Sign pattern follows how the servos are mounted on each side
            Command::Forward => self.drive.drive(-speed, speed),
            Command::Backward => self.drive.drive(speed, -speed),
            Command::Left => self.drive.drive(-speed, -speed),
            Command::Right => self.drive.drive(speed, speed),
            Command::Stop => {
                self.drive.stop_all();
                self.indicator.stopped();
            }
            Command::Function(function) => {
                self.indicator.auxiliary();
                self.hooks.on_function(*function);
            }
            Command::Unknown(token) => {
                warn!(
                    "Unknown command {:?} ({} bytes), stopping",
                    loggable(token),
                    token.len()
                );
                self.indicator.stopped();
                self.drive.stop_all();
                return Outcome::Fail;
            }
        }

        info!(
            "Executed {} (speed {:?} {}%)",
            command,
            self.speed.mode(),
            self.speed.magnitude()
        );
        Outcome::Ok
    }

    pub fn stop_all(&mut self) {
        self.drive.stop_all();
        self.indicator.stopped();
    }

    pub fn report(&self) -> StateReport {
        StateReport {
            speed_mode: self.speed.mode(),
            magnitude: self.speed.magnitude(),
            angles: self.drive.angles(),
            color: self.indicator.color(),
        }
    }

    pub fn speed(&self) -> &SpeedState {
        &self.speed
    }

    pub fn drive(&self) -> &DriveActuation<O> {
        &self.drive
    }

    pub fn indicator(&self) -> &Indicator<S> {
        &self.indicator
    }
}

/// Controller shared between request handlers
///
/// Commands are serialized: a caller arriving while another command runs
/// waits for it to finish, then runs against the updated state.
pub struct SharedController<O: ServoOutput, S: IndicatorStrip> {
    inner: Arc<Mutex<Controller<O, S>>>,
}

impl<O: ServoOutput, S: IndicatorStrip> Clone for SharedController<O, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: ServoOutput, S: IndicatorStrip> SharedController<O, S> {
    pub fn new(controller: Controller<O, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Lock the controller, recovering it if a previous holder panicked
    pub fn lock(&self) -> MutexGuard<'_, Controller<O, S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn execute(&self, command: &Command) -> Outcome {
        self.lock().execute(command)
    }

    pub fn stop_all(&self) {
        self.lock().stop_all();
    }

    pub fn report(&self) -> StateReport {
        self.lock().report()
    }
}
