//! Response types for the gateway.

use crate::error::GatewayError;
use crate::streaming::StreamFormat;
use crate::types::{AssistantId, UserId};
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Raw provider byte stream, chunked however the transport delivered it
pub type ByteStream = BoxStream<'static, Result<Bytes, GatewayError>>;

/// Outcome of a provider chat call
pub enum ChatResult {
    /// The provider answered in one piece
    Complete(Value),
    /// The provider is streaming its answer
    Stream(ProviderStream),
}

impl ChatResult {
    /// Whether this result is a live stream
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

impl fmt::Debug for ChatResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(value) => f.debug_tuple("Complete").field(value).finish(),
            Self::Stream(stream) => f.debug_tuple("Stream").field(stream).finish(),
        }
    }
}

/// Handle to a live provider stream
pub struct ProviderStream {
    /// Provider tag, for logs and metrics
    pub provider: String,
    /// How the bytes are framed
    pub format: StreamFormat,
    /// The bytes themselves
    pub body: ByteStream,
}

impl ProviderStream {
    /// Wrap a byte stream
    pub fn new(provider: impl Into<String>, format: StreamFormat, body: ByteStream) -> Self {
        Self {
            provider: provider.into(),
            format,
            body,
        }
    }
}

impl fmt::Debug for ProviderStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderStream")
            .field("provider", &self.provider)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Conversation record as reported by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Provider-assigned id
    pub id: String,
    /// Owner
    pub user_id: UserId,
    /// Assistant the conversation belongs to
    pub assistant_id: AssistantId,
    /// Remaining provider fields, untouched
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Conversation {
    /// Build a conversation from one provider listing entry.
    ///
    /// The `id` field (string or number) is lifted out; every other field is
    /// kept verbatim as metadata. Entries without an id are skipped.
    #[must_use]
    pub fn from_provider_entry(
        entry: &Value,
        user_id: &UserId,
        assistant_id: &AssistantId,
    ) -> Option<Self> {
        let object = entry.as_object()?;
        let id = match object.get("id")? {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        let metadata = object
            .iter()
            .filter(|(key, _)| key.as_str() != "id")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Some(Self {
            id,
            user_id: user_id.clone(),
            assistant_id: assistant_id.clone(),
            metadata,
        })
    }

    /// Map a provider listing payload to conversations.
    ///
    /// Accepts a bare array, `{"data": [...]}` or `{"data": {"list": [...]}}`.
    #[must_use]
    pub fn from_provider_listing(
        payload: &Value,
        user_id: &UserId,
        assistant_id: &AssistantId,
    ) -> Vec<Self> {
        let entries = match payload {
            Value::Array(items) => Some(items),
            Value::Object(object) => match object.get("data") {
                Some(Value::Array(items)) => Some(items),
                Some(Value::Object(data)) => data.get("list").and_then(Value::as_array),
                _ => None,
            },
            _ => None,
        };

        entries
            .map(|items| {
                items
                    .iter()
                    .filter_map(|entry| Self::from_provider_entry(entry, user_id, assistant_id))
                    .collect()
            })
            .unwrap_or_default()
    }
}
