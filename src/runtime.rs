// Request-driven runtime: one command in, one response out
// Note: there is no idle timeout. A held drive command keeps the robot moving
// until the operator sends "stop" (or the runtime shuts down, which stops it).

use std::path::PathBuf;

use tracing::{info, warn}; // events go to whatever subscriber main installed

// local imports
use crate::config::{ControllerConfig, LED_COUNT, TOPIC_CMD, TOPIC_RESPONSE, TOPIC_STATE};
use crate::controller::{Controller, DynController, SharedController};
use crate::indicator::{IndicatorStrip, NullStrip, SerialStrip};
use crate::motor::{MaestroBus, ServoOutput, SimulatedOutput};
use crate::transport::{self, CommandRequest};

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Startup options, normally filled from the command line
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// JSON controller config; the reference wiring when absent
    pub config_path: Option<PathBuf>,
    /// Servo controller serial port; simulated output when absent
    pub servo_port: Option<String>,
    /// LED strip serial port; no indicator when absent
    pub led_port: Option<String>,
}

fn open_output(port: Option<&str>) -> Result<Box<dyn ServoOutput>, Error> {
    let output: Box<dyn ServoOutput> = match port {
        Some(port) => Box::new(MaestroBus::open(port)?),
        None => {
            info!("No servo port given, using simulated output");
            Box::new(SimulatedOutput::new())
        }
    };
    Ok(output)
}

fn open_strip(port: Option<&str>) -> Box<dyn IndicatorStrip> {
    let Some(port) = port else {
        return Box::new(NullStrip);
    };
    match SerialStrip::open(port, LED_COUNT) {
        Ok(strip) => Box::new(strip),
        // Indicator trouble never blocks driving
        Err(e) => {
            warn!("LED strip unavailable ({}), continuing without it", e);
            Box::new(NullStrip)
        }
    }
}

/// Load config and bring up hardware and the controller
pub fn build_controller(options: &RuntimeOptions) -> Result<DynController, Error> {
    let config = match &options.config_path {
        Some(path) => {
            info!("Loading controller config from {}", path.display());
            ControllerConfig::load(path)?
        }
        None => ControllerConfig::default(),
    };

    let output = open_output(options.servo_port.as_deref())?;
    let strip = open_strip(options.led_port.as_deref());

    Ok(Controller::from_config(output, strip, &config)?)
}

pub async fn run(options: RuntimeOptions) -> Result<(), Error> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    let controller = SharedController::new(build_controller(&options)?);

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD).await?;
    let pub_response = session.declare_publisher(TOPIC_RESPONSE).await?;
    let pub_state = session.declare_publisher(TOPIC_STATE).await?;

    info!("Subscribed to: {}", TOPIC_CMD);
    info!("Publishing to: {}, {}", TOPIC_RESPONSE, TOPIC_STATE);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down, stopping all actuators");
                controller.stop_all();
                break;
            }
            sample = subscriber.recv_async() => {
                let sample = sample?;
                let request = CommandRequest::from_payload(&sample.payload().to_bytes());

                // Servo and strip writes block on serial IO
                let handler = controller.clone();
                let (response, state) = tokio::task::spawn_blocking(move || {
                    transport::handle_with_report(&request, &handler)
                })
                .await?;

                pub_response.put(serde_json::to_string(&response)?).await?;
                pub_state.put(serde_json::to_string(&state)?).await?;
            }
        }
    }

    Ok(())
}
