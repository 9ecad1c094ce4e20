//! SQLBot provider implementation.
//!
//! SQLBot answers a question in one JSON payload (generated SQL, result rows,
//! chart hints), so chat never streams.

use crate::http::HttpBackend;
use async_trait::async_trait;
use gateway_config::ProviderSettings;
use gateway_core::{
    AssistantId, ChatFile, ChatProvider, ChatRequest, ChatResult, Conversation, GatewayResult,
    ListingPolicy, UserId,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Registry tag
pub const TAG: &str = "sqlbot";

/// SQLBot provider
#[derive(Debug, Clone)]
pub struct SqlBotProvider {
    backend: HttpBackend,
    listing: ListingPolicy,
}

impl SqlBotProvider {
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
struct SqlBotQuestion<'a> {
    question: &'a str,
    chat_id: Option<&'a str>,
    user: &'a str,
    assistant: &'a str,
    files: &'a [ChatFile],
    context: &'a Map<String, Value>,
}

#[async_trait]
impl ChatProvider for SqlBotProvider {
    fn tag(&self) -> &str {
        TAG
    }

    fn listing_policy(&self) -> ListingPolicy {
        self.listing
    }

    async fn chat(&self, request: &ChatRequest) -> GatewayResult<ChatResult> {
        let body = SqlBotQuestion {
            question: &request.message,
            chat_id: request.conversation_id.as_deref(),
            user: request.user_id.as_str(),
            assistant: request.assistant_id.remainder(),
            files: &request.files,
            context: &request.context,
        };

        let answer = self.backend.post_json(&["api", "v1", "chat", "question"], &body).await?;
        Ok(ChatResult::Complete(answer))
    }

    async fn get_history(&self, conversation_id: &str, user_id: &UserId) -> GatewayResult<Value> {
        self.backend
            .get_json(
                &["api", "v1", "chat", conversation_id, "records"],
                &[("user", user_id.as_str())],
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
                &["api", "v1", "chat", "list"],
                &[
                    ("user", user_id.as_str()),
                    ("assistant", assistant_id.remainder()),
                ],
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
                &["api", "v1", "chat", conversation_id],
                &[("user", user_id.as_str())],
                None,
            )
            .await
    }
}
