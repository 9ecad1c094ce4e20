//! Request types for the gateway.
//!
//! A [`ChatRequest`] is built once per inbound call and handed to exactly one
//! provider adapter. The gateway never looks inside `files` or `context`.

use crate::error::GatewayError;
use crate::types::{AssistantId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unified chat request dispatched to a provider adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// User message text
    #[serde(default)]
    pub message: String,

    /// Assistant that should answer
    pub assistant_id: AssistantId,

    /// Existing conversation thread, if continuing one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// Caller identity
    #[serde(default)]
    pub user_id: UserId,

    /// Attachments, in the order the client sent them
    #[serde(default)]
    pub files: Vec<ChatFile>,

    /// Opaque provider-specific context
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl ChatRequest {
    /// Create a new builder for `ChatRequest`
    #[must_use]
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::default()
    }

    /// Validate the request
    ///
    /// # Errors
    /// Returns error if neither a message nor any file is present
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.message.trim().is_empty() && self.files.is_empty() {
            return Err(GatewayError::validation(
                "message cannot be empty when no files are attached",
                Some("message"),
            ));
        }

        Ok(())
    }

    /// Provider tag of the target assistant
    #[must_use]
    pub fn provider_tag(&self) -> &str {
        self.assistant_id.provider_tag()
    }
}

/// File attached to a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFile {
    /// File name
    pub name: String,
    /// File content as sent by the client (typically base64 or a URL)
    pub content: String,
    /// MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl ChatFile {
    /// Create a new attachment
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Builder for `ChatRequest`
#[derive(Debug, Default)]
pub struct ChatRequestBuilder {
    message: String,
    assistant_id: Option<String>,
    conversation_id: Option<String>,
    user_id: Option<UserId>,
    files: Vec<ChatFile>,
    context: Map<String, Value>,
}

impl ChatRequestBuilder {
    /// Set the message text
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the assistant identifier
    #[must_use]
    pub fn assistant_id(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = Some(assistant_id.into());
        self
    }

    /// Set the conversation id; a blank id starts a new conversation
    #[must_use]
    pub fn conversation_id(mut self, conversation_id: Option<String>) -> Self {
        self.conversation_id = conversation_id.filter(|id| !id.trim().is_empty());
        self
    }

    /// Set the caller identity
    #[must_use]
    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Set all attachments
    #[must_use]
    pub fn files(mut self, files: Vec<ChatFile>) -> Self {
        self.files = files;
        self
    }

    /// Add one attachment
    #[must_use]
    pub fn file(mut self, file: ChatFile) -> Self {
        self.files.push(file);
        self
    }

    /// Set the opaque context map
    #[must_use]
    pub fn context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    /// Build and validate the request
    ///
    /// # Errors
    /// Returns `UnsupportedAssistantType` for a missing or malformed
    /// assistant id, `Validation` if the request carries no content
    pub fn build(self) -> Result<ChatRequest, GatewayError> {
        let assistant_id = self
            .assistant_id
            .ok_or_else(|| GatewayError::validation("assistantId is required", Some("assistantId")))
            .and_then(AssistantId::parse)?;

        let request = ChatRequest {
            message: self.message,
            assistant_id,
            conversation_id: self.conversation_id,
            user_id: self.user_id.unwrap_or_default(),
            files: self.files,
            context: self.context,
        };

        request.validate()?;
        Ok(request)
    }
}
