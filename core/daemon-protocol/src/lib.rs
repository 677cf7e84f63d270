//! IPC protocol types and validation for tally-daemon.
//!
//! This crate is shared by the daemon and its clients (the event
//! collector on the write side, presentation surfaces on the read side)
//! to prevent schema drift. The daemon remains the authority on
//! validation, but clients can reuse the same types to construct valid
//! requests.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tally_core::Observation;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Method {
    GetHealth,
    /// Ranked list of tracks (class, name, formatted duration).
    GetTracks,
    /// Per-class totals plus the grand total.
    GetClasses,
    /// Empties the in-memory set and the storage slot.
    ClearTracks,
    Event,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    pub protocol_version: u32,
    pub method: Method,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl Response {
    pub fn ok(id: Option<String>, data: Value) -> Self {
        Self {
            ok: true,
            id,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(id: Option<String>, code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id,
            data: None,
            error: Some(ErrorInfo::new(code, message)),
        }
    }

    pub fn error_with_info(id: Option<String>, error: ErrorInfo) -> Self {
        Self {
            ok: false,
            id,
            data: None,
            error: Some(error),
        }
    }
}

/// The two event names delivered by the activity stream.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum EventKind {
    /// An incremental activity observation.
    Seen,
    /// An opaque idle status string, passed through for display.
    Idle,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EventEnvelope {
    pub kind: EventKind,
    /// Present for `seen` events; the legacy PascalCase payload
    /// `{Class, Name, Active, Seen}` with `Active` in nanoseconds.
    #[serde(default)]
    pub observation: Option<Observation>,
    /// Present for `idle` events. Not parsed, displayed verbatim.
    #[serde(default)]
    pub status: Option<String>,
}

impl EventEnvelope {
    /// A rejected envelope skips the merge entirely; a malformed event
    /// must never corrupt the track set.
    pub fn validate(&self) -> Result<(), ErrorInfo> {
        match self.kind {
            EventKind::Seen => {
                let obs = self.observation.as_ref().ok_or_else(|| {
                    ErrorInfo::new("missing_observation", "seen event requires an observation")
                })?;
                validate_observation(obs)
            }
            EventKind::Idle => match self.status {
                Some(_) => Ok(()),
                None => Err(ErrorInfo::new(
                    "missing_status",
                    "idle event requires a status string",
                )),
            },
        }
    }
}

/// Field-level checks for an incoming observation: identity fields must
/// be non-empty and `Seen` must be RFC 3339. `Active` is already bounded
/// by its type.
pub fn validate_observation(obs: &Observation) -> Result<(), ErrorInfo> {
    if obs.class.trim().is_empty() {
        return Err(ErrorInfo::new("missing_field", "Class is required"));
    }
    if obs.name.trim().is_empty() {
        return Err(ErrorInfo::new("missing_field", "Name is required"));
    }
    if DateTime::parse_from_rfc3339(&obs.seen).is_err() {
        return Err(ErrorInfo::new("invalid_timestamp", "Seen must be RFC3339"));
    }
    Ok(())
}

pub fn parse_event(params: Value) -> Result<EventEnvelope, ErrorInfo> {
    let envelope: EventEnvelope = serde_json::from_value(params).map_err(|err| {
        ErrorInfo::new(
            "invalid_params",
            format!("event payload is invalid JSON: {}", err),
        )
    })?;
    envelope.validate()?;
    Ok(envelope)
}
