//! Dify provider implementation.
//!
//! Uses Dify's chat-messages API in `streaming` response mode. The app is
//! selected by the API key, so the assistant id remainder is not sent.

use crate::http::HttpBackend;
use async_trait::async_trait;
use gateway_config::ProviderSettings;
use gateway_core::{
    AssistantId, ChatFile, ChatProvider, ChatRequest, ChatResult, Conversation, GatewayResult,
    ListingPolicy, StreamFormat, UserId,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Registry tag
pub const TAG: &str = "dify";

/// Dify provider
#[derive(Debug, Clone)]
pub struct DifyProvider {
    backend: HttpBackend,
    listing: ListingPolicy,
}

impl DifyProvider {
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
struct DifyChatRequest<'a> {
    query: &'a str,
    inputs: &'a Map<String, Value>,
    response_mode: &'static str,
    /// Dify starts a new conversation on an empty id
    conversation_id: &'a str,
    user: &'a str,
    files: &'a [ChatFile],
}

#[async_trait]
impl ChatProvider for DifyProvider {
    fn tag(&self) -> &str {
        TAG
    }

    fn listing_policy(&self) -> ListingPolicy {
        self.listing
    }

    async fn chat(&self, request: &ChatRequest) -> GatewayResult<ChatResult> {
        let body = DifyChatRequest {
            query: &request.message,
            inputs: &request.context,
            response_mode: "streaming",
            conversation_id: request.conversation_id.as_deref().unwrap_or_default(),
            user: request.user_id.as_str(),
            files: &request.files,
        };

        let stream = self
            .backend
            .post_stream(&["chat-messages"], &body, StreamFormat::EventFramed)
            .await?;
        Ok(ChatResult::Stream(stream))
    }

    async fn get_history(&self, conversation_id: &str, user_id: &UserId) -> GatewayResult<Value> {
        self.backend
            .get_json(
                &["messages"],
                &[("conversation_id", conversation_id), ("user", user_id.as_str())],
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
            .get_json(&["conversations"], &[("user", user_id.as_str())])
            .await?;
        Ok(Conversation::from_provider_listing(&payload, user_id, assistant_id))
    }

    async fn delete_conversation(
        &self,
        conversation_id: &str,
        user_id: &UserId,
    ) -> GatewayResult<Value> {
        let body = json!({ "user": user_id.as_str() });
        self.backend
            .delete(&["conversations", conversation_id], &[], Some(&body))
            .await
    }
}
