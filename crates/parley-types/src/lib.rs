//! Shared types for the Parley relay.
//!
//! This crate holds the identifiers and wire payloads that cross crate
//! boundaries: the request identifier that joins a dispatched unit of work
//! to its eventual result, the work item sent to the worker, the stored
//! result record, and the JSON bodies exchanged with the ingress endpoint.
//!
//! No crate in the workspace depends on anything *except* `parley-types`
//! for cross-cutting type definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque correlation token linking a dispatched work item to its result.
///
/// Tokens minted locally are random UUIDv4 strings. Tokens received from the
/// worker side are accepted verbatim; the only requirement is that they are
/// non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Mints a fresh, globally unique identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wraps an identifier received over the wire.
    ///
    /// Returns `None` if the value is empty or whitespace only.
    pub fn parse(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A unit of work handed to the worker.
///
/// Serialized as the body of the outbound dispatch call:
/// `{"request_id": "...", "prompt": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub request_id: RequestId,
    pub prompt: String,
}

impl WorkItem {
    pub fn new(request_id: RequestId, prompt: impl Into<String>) -> Self {
        Self {
            request_id,
            prompt: prompt.into(),
        }
    }
}

/// A stored worker result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub request_id: RequestId,
    /// Normalized answer text. Never empty.
    pub response: String,
    /// Unix timestamp (seconds) of the last write.
    pub written_at: i64,
}

/// Body of the worker's result write (`POST /api/results`).
///
/// The worker may put its answer under `response` or `text`, and the value
/// may be a plain string or an arbitrary JSON object.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WriteResultRequest {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub text: Option<Value>,
}

impl WriteResultRequest {
    /// Returns the raw payload to normalize.
    ///
    /// `response` wins unless it is null or empty, in which case `text` is
    /// used.
    pub fn raw_payload(&self) -> Option<&Value> {
        self.response
            .as_ref()
            .filter(|value| !is_empty_value(value))
            .or(self.text.as_ref())
    }
}

/// Response body of the result write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResultResponse {
    pub ok: bool,
}

/// Query string of the result read (`GET /api/results?request_id=`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadResultQuery {
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Response body of the result read. `response` is `null` until the worker
/// has written a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResultResponse {
    pub response: Option<String>,
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}
