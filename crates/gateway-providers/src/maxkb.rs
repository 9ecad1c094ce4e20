//! MaxKB provider implementation.
//!
//! MaxKB streams chat answers as `data:` framed events carrying an `answer`
//! field, with a final `{"done": true}` event.

use crate::http::HttpBackend;
use async_trait::async_trait;
use gateway_config::ProviderSettings;
use gateway_core::{
    AssistantId, ChatFile, ChatProvider, ChatRequest, ChatResult, Conversation, GatewayResult,
    ListingPolicy, StreamFormat, UserId,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Registry tag
pub const TAG: &str = "maxkb";

/// MaxKB provider
#[derive(Debug, Clone)]
pub struct MaxKbProvider {
    backend: HttpBackend,
    listing: ListingPolicy,
}

impl MaxKbProvider {
    /// Create a provider on top of a backend.
    ///
    /// Listing defaults to [`ListingPolicy::AlwaysEmpty`]: MaxKB's listing
    /// endpoint reports each thread several times, which the client then
    /// renders as duplicate conversations. Switch back to
    /// [`ListingPolicy::Query`] once the backend is fixed.
    #[must_use]
    pub fn new(backend: HttpBackend) -> Self {
        Self {
            backend,
            listing: ListingPolicy::AlwaysEmpty,
        }
    }

    /// Create a provider from configuration
    ///
    /// # Errors
    /// Returns error if the backend cannot be created
    pub fn from_settings(settings: &ProviderSettings) -> GatewayResult<Self> {
        let provider = Self::new(HttpBackend::from_settings(TAG, settings)?);
        Ok(match settings.listing {
            Some(policy) => provider.with_listing_policy(policy),
            None => provider,
        })
    }

    /// Override the listing policy
    #[must_use]
    pub fn with_listing_policy(mut self, listing: ListingPolicy) -> Self {
        self.listing = listing;
        self
    }
}

#[derive(Debug, Serialize)]
struct MaxKbChatRequest<'a> {
    message: &'a str,
    assistant_id: &'a str,
    conversation_id: Option<&'a str>,
    user_id: &'a str,
    files: &'a [ChatFile],
    context: &'a Map<String, Value>,
}

#[async_trait]
impl ChatProvider for MaxKbProvider {
    fn tag(&self) -> &str {
        TAG
    }

    fn listing_policy(&self) -> ListingPolicy {
        self.listing
    }

    async fn chat(&self, request: &ChatRequest) -> GatewayResult<ChatResult> {
        let body = MaxKbChatRequest {
            message: &request.message,
            assistant_id: request.assistant_id.as_str(),
            conversation_id: request.conversation_id.as_deref(),
            user_id: request.user_id.as_str(),
            files: &request.files,
            context: &request.context,
        };

        let stream = self
            .backend
            .post_stream(&["api", "v1", "chat", "completions"], &body, StreamFormat::EventFramed)
            .await?;
        Ok(ChatResult::Stream(stream))
    }

    async fn get_history(&self, conversation_id: &str, user_id: &UserId) -> GatewayResult<Value> {
        self.backend
            .get_json(
                &["api", "v1", "conversations", conversation_id],
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
            debug!(user_id = %user_id, "MaxKB listing disabled, returning no conversations");
            return Ok(Vec::new());
        }

        let payload = self
            .backend
            .get_json(
                &["api", "v1", "conversations"],
                &[
                    ("user_id", user_id.as_str()),
                    ("assistant_id", assistant_id.as_str()),
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
                &["api", "v1", "conversations", conversation_id],
                &[("user_id", user_id.as_str())],
                None,
            )
            .await
    }
}
