// Request/response translation around the controller
//
// A request either carries a command token or it does not. Missing tokens
// are answered here without touching the controller; everything else is
// executed and the outcome mapped onto a status code.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::controller::{Controller, SharedController};
use crate::indicator::IndicatorStrip;
use crate::messages::{Command, Outcome, StateReport};
use crate::motor::ServoOutput;

/// Incoming request, e.g. `{"command": "forward"}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub command: Option<String>,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
        }
    }

    /// Decode a JSON request, or take a bare UTF-8 payload as the token itself
    pub fn from_payload(payload: &[u8]) -> Self {
        if payload.is_empty() {
            return Self::default();
        }
        if let Ok(request) = serde_json::from_slice::<CommandRequest>(payload) {
            return request;
        }
        match std::str::from_utf8(payload) {
            Ok(token) => Self::new(token),
            Err(e) => {
                warn!("Request payload is not UTF-8: {}", e);
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    NotFound,
    ServerError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Success => 200,
            Status::NotFound => 404,
            Status::ServerError => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Response {
    fn new(status: Status) -> Self {
        Self {
            status,
            code: status.code(),
            allow_origin: None,
            body: None,
        }
    }

    /// Empty success, readable from any origin
    pub fn success() -> Self {
        Self {
            allow_origin: Some("*".to_string()),
            ..Self::new(Status::Success)
        }
    }

    pub fn not_found() -> Self {
        Self {
            body: Some("missing command".to_string()),
            ..Self::new(Status::NotFound)
        }
    }

    pub fn server_error() -> Self {
        Self {
            body: Some("unknown command".to_string()),
            ..Self::new(Status::ServerError)
        }
    }
}

impl From<Outcome> for Response {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Ok => Response::success(),
            Outcome::Fail => Response::server_error(),
        }
    }
}

/// Answer one request against an already locked controller
pub fn respond<O, S>(request: &CommandRequest, controller: &mut Controller<O, S>) -> Response
where
    O: ServoOutput,
    S: IndicatorStrip,
{
    let Some(token) = request.command.as_deref() else {
        warn!("Request without a command");
        return Response::not_found();
    };

    controller.execute(&Command::parse(token)).into()
}

/// Answer one request
pub fn handle<O, S>(request: &CommandRequest, controller: &SharedController<O, S>) -> Response
where
    O: ServoOutput,
    S: IndicatorStrip,
{
    respond(request, &mut *controller.lock())
}

/// Answer one request and snapshot the state it left, under a single lock
pub fn handle_with_report<O, S>(
    request: &CommandRequest,
    controller: &SharedController<O, S>,
) -> (Response, StateReport)
where
    O: ServoOutput,
    S: IndicatorStrip,
{
    let mut guard = controller.lock();
    let response = respond(request, &mut *guard);
    (response, guard.report())
}
