// Keyboard teleop: WASD drive, space stop, 1/2 low/high speed, U/I/O/P functions A-D, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::info;

use servobot_runtime::config::{TOPIC_CMD, TOPIC_RESPONSE};

const INPUT_TIMEOUT_MS: u64 = 150; // Send stop after this much time with no drive input

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    info!("Controls: WASD=drive, SPACE=stop, 1/2=low/high, U/I/O/P=functions, Q=quit");

    enable_raw_mode()?;
    let result = run_teleop(&session).await;
    disable_raw_mode()?;

    result
}

fn key_to_command(code: KeyCode) -> Option<&'static str> {
    match code {
        KeyCode::Char('w') => Some("forward"),
        KeyCode::Char('s') => Some("backward"),
        KeyCode::Char('a') => Some("left"),
        KeyCode::Char('d') => Some("right"),
        KeyCode::Char(' ') => Some("stop"),
        KeyCode::Char('1') => Some("low"),
        KeyCode::Char('2') => Some("high"),
        KeyCode::Char('u') => Some("functionA"),
        KeyCode::Char('i') => Some("functionB"),
        KeyCode::Char('o') => Some("functionC"),
        KeyCode::Char('p') => Some("functionD"),
        _ => None,
    }
}

fn is_drive(command: &str) -> bool {
    matches!(command, "forward" | "backward" | "left" | "right")
}

async fn run_teleop(session: &zenoh::Session) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let publisher = session.declare_publisher(TOPIC_CMD).await?;
    let responses = session.declare_subscriber(TOPIC_RESPONSE).await?;

    // Last drive command sent, so a held key is not resent every poll
    let mut driving: Option<&'static str> = None;
    let mut last_drive_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                if pressed && matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
                    publisher.put(json!({ "command": "stop" }).to_string()).await?;
                    break;
                }

                if let Some(command) = key_to_command(code).filter(|_| pressed) {
                    if is_drive(command) {
                        last_drive_input = Instant::now();
                        if driving == Some(command) {
                            continue;
                        }
                        driving = Some(command);
                    } else if command == "stop" {
                        driving = None;
                    }
                    publisher.put(json!({ "command": command }).to_string()).await?;
                }
            }
        }

        // Key released: the runtime has no timeout of its own, so stop explicitly
        let idle = last_drive_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS);
        if driving.is_some() && idle {
            driving = None;
            publisher.put(json!({ "command": "stop" }).to_string()).await?;
        }

        while let Ok(Some(sample)) = responses.try_recv() {
            let payload = sample.payload().to_bytes();
            info!("Response: {}", String::from_utf8_lossy(&payload));
        }
    }

    Ok(())
}
