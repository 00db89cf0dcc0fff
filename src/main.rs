use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use servobot_runtime::runtime::{self, RuntimeOptions};

/// Servo tank robot controller
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON controller config (slot wiring, speed magnitudes)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Servo controller serial port
    #[arg(long, default_value = servobot_runtime::config::SERVO_PORT)]
    servo_port: String,

    /// Adalight LED strip serial port
    #[arg(long)]
    led_port: Option<String>,

    /// Run without hardware: simulated servos, no LED strip
    #[arg(long)]
    simulate: bool,
}

impl From<Args> for RuntimeOptions {
    fn from(args: Args) -> Self {
        let (servo_port, led_port) = if args.simulate {
            (None, None)
        } else {
            (Some(args.servo_port), args.led_port)
        };
        Self {
            config_path: args.config,
            servo_port,
            led_port,
        }
    }
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    if let Err(e) = runtime::run(args.into()).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
