//! Canonical streaming events.
//!
//! Whatever a provider sends, clients only ever see three shapes:
//!
//! ```json
//! {"text": "partial answer"}
//! {"done": true}
//! {"error": "stream processing error"}
//! ```

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a provider frames its streaming output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamFormat {
    /// Blank-line separated events whose `data:` lines carry JSON
    EventFramed,
    /// Free-form text chunks, forwarded as they arrive
    RawText,
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventFramed => f.write_str("event_framed"),
            Self::RawText => f.write_str("raw_text"),
        }
    }
}

/// One unit of normalized streaming output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental answer text
    Text(String),
    /// The answer is complete
    Done,
    /// The stream failed
    Error(String),
}

impl StreamEvent {
    /// Text delta event
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Error event
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Whether this event ends the stream
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }

    /// Label for logs and metrics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Done => "done",
            Self::Error(_) => "error",
        }
    }

    /// JSON body of the event as written into an SSE `data:` field
    #[must_use]
    pub fn to_json(&self) -> String {
        // Serializing a map of string keys to strings/bools cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"error":"serialization failed"}"#.to_string())
    }

    /// Full SSE frame: `data: <json>\n\n`
    #[must_use]
    pub fn to_sse_frame(&self) -> String {
        format!("data: {}\n\n", self.to_json())
    }
}

impl Serialize for StreamEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Text(text) => map.serialize_entry("text", text)?,
            Self::Done => map.serialize_entry("done", &true)?,
            Self::Error(message) => map.serialize_entry("error", message)?,
        }
        map.end()
    }
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

impl<'de> Deserialize<'de> for StreamEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEvent::deserialize(deserializer)?;
        match (raw.text, raw.done, raw.error) {
            (Some(text), None, None) => Ok(Self::Text(text)),
            (None, Some(true), None) => Ok(Self::Done),
            (None, None, Some(error)) => Ok(Self::Error(error)),
            _ => Err(de::Error::custom(
                "expected exactly one of `text`, `done: true` or `error`",
            )),
        }
    }
}
