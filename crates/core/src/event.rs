//! Typed events for the analyze event stream.
//!
//! The gateway writes a sequence of server-sent-event blocks of the form
//! `event: <kind>` / `data: <json>`. Any number of `status` events may be
//! written, followed by exactly one terminal `result` or `error` event.
//! This module defines the typed forms plus wire (de)serialization; the
//! byte-level framing lives in `api-rest` (emission) and `kc-client`
//! (consumption).

use serde::{Deserialize, Serialize};

/// Progress phase reported alongside a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPhase {
    /// First contact with the upstream model.
    Connecting,
    /// Upstream returned "service unavailable"; waiting out the scheduled delay.
    Waking,
    /// Delay elapsed; the next attempt is being issued.
    Retrying,
    /// The upstream answered; the result event follows.
    Done,
}

/// A progress notification. Zero or more precede the terminal event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub message: String,
    pub phase: StatusPhase,
    /// 1-based attempt number, present for waking/retrying statuses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Seconds until the retry, present for waking statuses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_sec: Option<u64>,
}

/// The terminal success event carrying the full analysis text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEvent {
    pub result: String,
}

/// The terminal failure event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub error: String,
    /// Raw upstream response body, when one was available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Tagged union over the three event kinds carried on the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Status(StatusEvent),
    Result(ResultEvent),
    Error(ErrorEvent),
}

impl StreamEvent {
    /// The SSE `event:` name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Status(_) => "status",
            StreamEvent::Result(_) => "result",
            StreamEvent::Error(_) => "error",
        }
    }

    /// True for `result` and `error`, which close the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Status(_))
    }

    /// Serialize the `data:` payload.
    ///
    /// Serialization of these plain data types cannot fail in practice; an
    /// empty object is written if it ever does, so the stream stays parseable.
    pub fn to_data(&self) -> String {
        let serialized = match self {
            StreamEvent::Status(ev) => serde_json::to_string(ev),
            StreamEvent::Result(ev) => serde_json::to_string(ev),
            StreamEvent::Error(ev) => serde_json::to_string(ev),
        };
        serialized.unwrap_or_else(|err| {
            tracing::error!("failed to serialize stream event: {err}");
            "{}".to_string()
        })
    }

    /// Parse a typed event from an SSE `event:` name and `data:` payload.
    ///
    /// Returns `Ok(None)` for unknown event names so unrecognised kinds are
    /// skipped rather than aborting the stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying JSON error when the payload is malformed; the
    /// caller decides whether that is tolerated.
    pub fn from_wire(name: &str, data: &str) -> Result<Option<Self>, serde_json::Error> {
        match name {
            "status" => Ok(Some(StreamEvent::Status(serde_json::from_str(data)?))),
            "result" => Ok(Some(StreamEvent::Result(serde_json::from_str(data)?))),
            "error" => Ok(Some(StreamEvent::Error(serde_json::from_str(data)?))),
            _ => Ok(None),
        }
    }
}
