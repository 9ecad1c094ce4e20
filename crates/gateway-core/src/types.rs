//! Validated domain types (newtypes).

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity assigned to callers that arrive without an authenticated user
pub const ANONYMOUS_USER: &str = "anonymous";

/// Assistant identifier of the form `<providerTag>:<rest>`.
///
/// The provider tag is the only part the gateway interprets; the remainder is
/// handed to the provider untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssistantId {
    raw: String,
    split: usize,
}

impl AssistantId {
    /// Parse an assistant identifier.
    ///
    /// # Errors
    /// Returns `UnsupportedAssistantType` if there is no `:` or the tag is empty
    pub fn parse(raw: impl Into<String>) -> Result<Self, GatewayError> {
        let raw = raw.into();
        match raw.find(':') {
            Some(split) if split > 0 => Ok(Self { raw, split }),
            _ => Err(GatewayError::unsupported_assistant(raw)),
        }
    }

    /// Provider tag (text before the first `:`)
    #[must_use]
    pub fn provider_tag(&self) -> &str {
        &self.raw[..self.split]
    }

    /// Provider-internal remainder (text after the first `:`)
    #[must_use]
    pub fn remainder(&self) -> &str {
        &self.raw[self.split + 1..]
    }

    /// Full identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for AssistantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for AssistantId {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AssistantId> for String {
    fn from(id: AssistantId) -> Self {
        id.raw
    }
}

/// Caller identity forwarded to providers for their own authorization
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user id; blank input falls back to [`UserId::anonymous`]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.trim().is_empty() {
            Self::anonymous()
        } else {
            Self(id)
        }
    }

    /// The anonymous sentinel identity
    #[must_use]
    pub fn anonymous() -> Self {
        Self(ANONYMOUS_USER.to_string())
    }

    /// Whether this is the anonymous sentinel
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS_USER
    }

    /// Borrow the id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_id_split() {
        let id = AssistantId::parse("maxkb:app-42").expect("valid id");
        assert_eq!(id.provider_tag(), "maxkb");
        assert_eq!(id.remainder(), "app-42");
        assert_eq!(id.as_str(), "maxkb:app-42");
    }

    #[test]
    fn test_assistant_id_only_first_colon_splits() {
        let id = AssistantId::parse("dify:app:v2").expect("valid id");
        assert_eq!(id.provider_tag(), "dify");
        assert_eq!(id.remainder(), "app:v2");
    }

    #[test]
    fn test_assistant_id_rejects_missing_prefix() {
        assert!(matches!(
            AssistantId::parse("maxkb"),
            Err(GatewayError::UnsupportedAssistantType { .. })
        ));
        assert!(AssistantId::parse(":abc").is_err());
        assert!(AssistantId::parse("").is_err());
    }

    #[test]
    fn test_assistant_id_serde() {
        let id: AssistantId = serde_json::from_str("\"ragflow:chat-1\"").expect("deserialize");
        assert_eq!(id.provider_tag(), "ragflow");
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"ragflow:chat-1\"");
        assert!(serde_json::from_str::<AssistantId>("\"nope\"").is_err());
    }

    #[test]
    fn test_user_id_blank_is_anonymous() {
        assert!(UserId::new("  ").is_anonymous());
        assert_eq!(UserId::new("u-1").as_str(), "u-1");
        assert_eq!(UserId::default().as_str(), ANONYMOUS_USER);
    }
}
