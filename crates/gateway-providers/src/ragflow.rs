//! RAGFlow provider implementation.
//!
//! The assistant id remainder is the RAGFlow chat id. Completions stream back
//! as plain text chunks.

use crate::http::HttpBackend;
use async_trait::async_trait;
use gateway_config::ProviderSettings;
use gateway_core::{
    AssistantId, ChatFile, ChatProvider, ChatRequest, ChatResult, Conversation, GatewayResult,
    ListingPolicy, StreamFormat, UserId,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Registry tag
pub const TAG: &str = "ragflow";

/// RAGFlow provider
#[derive(Debug, Clone)]
pub struct RagFlowProvider {
    backend: HttpBackend,
    listing: ListingPolicy,
}

impl RagFlowProvider {
    /// Create a provider on top of a backend
    #[must_use]
    pub fn new(backend: HttpBackend) -> Self {
        Self {
            backend,
            listing: ListingPolicy::Query,
        }
    }

    /// Create a provider from configuration
    ///
    /// # Errors
    /// Returns error if the backend cannot be created
    pub fn from_settings(settings: &ProviderSettings) -> GatewayResult<Self> {
        let provider = Self::new(HttpBackend::from_settings(TAG, settings)?);
        Ok(provider.with_listing_policy(settings.listing.unwrap_or_default()))
    }

    /// Override the listing policy
    #[must_use]
    pub fn with_listing_policy(mut self, listing: ListingPolicy) -> Self {
        self.listing = listing;
        self
    }
}

#[derive(Debug, Serialize)]
struct RagFlowCompletionRequest<'a> {
    question: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    user_id: &'a str,
    files: &'a [ChatFile],
    context: &'a Map<String, Value>,
}

#[async_trait]
impl ChatProvider for RagFlowProvider {
    fn tag(&self) -> &str {
        TAG
    }

    fn listing_policy(&self) -> ListingPolicy {
        self.listing
    }

    async fn chat(&self, request: &ChatRequest) -> GatewayResult<ChatResult> {
        let body = RagFlowCompletionRequest {
            question: &request.message,
            stream: true,
            session_id: request.conversation_id.as_deref(),
            user_id: request.user_id.as_str(),
            files: &request.files,
            context: &request.context,
        };

        let path = ["api", "v1", "chats", request.assistant_id.remainder(), "completions"];
        let stream = self
            .backend
            .post_stream(&path, &body, StreamFormat::RawText)
            .await?;
        Ok(ChatResult::Stream(stream))
    }

    async fn get_history(&self, conversation_id: &str, user_id: &UserId) -> GatewayResult<Value> {
        self.backend
            .get_json(
                &["api", "v1", "sessions", conversation_id],
                &[("user_id", user_id.as_str())],
            )
            .await
    }

    async fn list_conversations(
        &self,
        user_id: &UserId,
        assistant_id: &AssistantId,
    ) -> GatewayResult<Vec<Conversation>> {
        if self.listing == ListingPolicy::AlwaysEmpty {
            return Ok(Vec::new());
        }

        let payload = self
            .backend
            .get_json(
                &["api", "v1", "chats", assistant_id.remainder(), "sessions"],
                &[("user_id", user_id.as_str())],
            )
            .await?;
        Ok(Conversation::from_provider_listing(&payload, user_id, assistant_id))
    }

    async fn delete_conversation(
        &self,
        conversation_id: &str,
        user_id: &UserId,
    ) -> GatewayResult<Value> {
        self.backend
            .delete(
                &["api", "v1", "sessions", conversation_id],
                &[("user_id", user_id.as_str())],
                None,
            )
            .await
    }
}
