// Message types exchanged between the transport and the controller

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::indicator::Rgb;
use crate::speed::SpeedMode;

/// Auxiliary function keys exposed to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuxFunction {
    A,
    B,
    C,
    D,
}

/// A command token resolved once at the transport boundary
///
/// Tokens are matched exactly and case-sensitively. Anything outside the
/// recognized set becomes `Unknown`, carrying the raw token for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
    Low,
    High,
    Function(AuxFunction),
    Unknown(String),
}

impl Command {
    pub fn parse(token: &str) -> Self {
        match token {
            "forward" => Command::Forward,
            "backward" => Command::Backward,
            "left" => Command::Left,
            "right" => Command::Right,
            "stop" => Command::Stop,
            "low" => Command::Low,
            "high" => Command::High,
            "functionA" => Command::Function(AuxFunction::A),
            "functionB" => Command::Function(AuxFunction::B),
            "functionC" => Command::Function(AuxFunction::C),
            "functionD" => Command::Function(AuxFunction::D),
            other => Command::Unknown(other.to_string()),
        }
    }

    /// The wire token for this command
    pub fn token(&self) -> &str {
        match self {
            Command::Forward => "forward",
            Command::Backward => "backward",
            Command::Left => "left",
            Command::Right => "right",
            Command::Stop => "stop",
            Command::Low => "low",
            Command::High => "high",
            Command::Function(AuxFunction::A) => "functionA",
            Command::Function(AuxFunction::B) => "functionB",
            Command::Function(AuxFunction::C) => "functionC",
            Command::Function(AuxFunction::D) => "functionD",
            Command::Unknown(token) => token,
        }
    }
}

impl From<&str> for Command {
    fn from(token: &str) -> Self {
        Command::parse(token)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Result of executing one command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    /// Unknown command; a fail-safe stop was applied
    Fail,
}

/// Snapshot of the state applied by the last command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateReport {
    pub speed_mode: SpeedMode,
    pub magnitude: u8,
    /// Last angle each slot's output accepted, index 0 is slot 1
    pub angles: Vec<u8>,
    pub color: Rgb,
}
