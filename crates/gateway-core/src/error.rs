//! Error types for the gateway.
//!
//! Every failure the gateway can produce is a [`GatewayError`]. The HTTP layer
//! maps each variant onto a status code via [`GatewayError::status_code`];
//! provider detail stays in the error for logging and is never echoed to
//! clients.

use http::StatusCode;
use thiserror::Error;

/// Result alias used across the gateway crates
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Main gateway error type
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The assistant identifier has no registered provider prefix
    #[error("unsupported assistant type: {assistant_id}")]
    UnsupportedAssistantType {
        /// The identifier as supplied by the caller
        assistant_id: String,
    },

    /// The inbound request is malformed
    #[error("validation error: {message}")]
    Validation {
        /// What is wrong with the request
        message: String,
        /// Offending field, if any
        field: Option<String>,
    },

    /// A call to a provider backend failed (network, auth, non-2xx, timeout)
    #[error("provider '{provider}' call failed: {cause}")]
    ProviderCallFailed {
        /// Provider tag
        provider: String,
        /// Human-readable cause, for logs only
        cause: String,
        /// Upstream HTTP status, when one was received
        status: Option<u16>,
    },

    /// A provider stream carried a payload that could not be processed
    #[error("stream protocol error: {message}")]
    StreamProtocol {
        /// Error detail
        message: String,
    },

    /// Prior conversation context could not be fetched
    #[error("history lookup failed for conversation '{conversation_id}': {cause}")]
    HistoryLookupFailed {
        /// Conversation that was looked up
        conversation_id: String,
        /// Underlying cause
        cause: String,
    },

    /// Invalid configuration
    #[error("configuration error: {message}")]
    Configuration {
        /// Error detail
        message: String,
    },

    /// Unexpected internal failure
    #[error("internal error: {message}")]
    Internal {
        /// Error detail
        message: String,
    },
}

impl GatewayError {
    /// Create an unsupported assistant type error
    pub fn unsupported_assistant(assistant_id: impl Into<String>) -> Self {
        Self::UnsupportedAssistantType {
            assistant_id: assistant_id.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Validation {
            message: message.into(),
            field: field.map(String::from),
        }
    }

    /// Create a provider call failure
    pub fn provider_call(
        provider: impl Into<String>,
        cause: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        Self::ProviderCallFailed {
            provider: provider.into(),
            cause: cause.into(),
            status,
        }
    }

    /// Create a stream protocol error
    pub fn stream_protocol(message: impl Into<String>) -> Self {
        Self::StreamProtocol {
            message: message.into(),
        }
    }

    /// Wrap another error as a history lookup failure
    pub fn history_lookup(conversation_id: impl Into<String>, cause: &Self) -> Self {
        Self::HistoryLookupFailed {
            conversation_id: conversation_id.into(),
            cause: cause.to_string(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status this error maps to when it reaches a client
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedAssistantType { .. } | Self::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::ProviderCallFailed { .. }
            | Self::StreamProtocol { .. }
            | Self::HistoryLookupFailed { .. }
            | Self::Configuration { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller is at fault
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Short machine-readable kind, used as a log/metric label
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedAssistantType { .. } => "unsupported_assistant_type",
            Self::Validation { .. } => "validation",
            Self::ProviderCallFailed { .. } => "provider_call_failed",
            Self::StreamProtocol { .. } => "stream_protocol",
            Self::HistoryLookupFailed { .. } => "history_lookup_failed",
            Self::Configuration { .. } => "configuration",
            Self::Internal { .. } => "internal",
        }
    }

    /// Message that is safe to show to a client.
    ///
    /// Client errors carry their own message; anything else collapses into a
    /// generic text so provider detail does not leak.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::UnsupportedAssistantType { .. } => self.to_string(),
            Self::Validation { message, .. } => message.clone(),
            Self::ProviderCallFailed { .. } => "provider request failed".to_string(),
            Self::StreamProtocol { .. } => "stream processing error".to_string(),
            _ => "internal server error".to_string(),
        }
    }
}
