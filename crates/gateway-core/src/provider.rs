//! Provider adapter abstraction.
//!
//! Each conversational backend is wrapped in one [`ChatProvider`]
//! implementation. The gateway only ever talks to providers through this
//! trait, so adding a backend means registering a new implementation rather
//! than touching call sites.

use crate::error::GatewayResult;
use crate::request::ChatRequest;
use crate::response::{ChatResult, Conversation};
use crate::types::{AssistantId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// How an adapter answers `list_conversations`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingPolicy {
    /// Ask the provider
    #[default]
    Query,
    /// Always report an empty listing without calling the provider.
    ///
    /// Used for backends whose listing endpoint returns duplicated threads.
    AlwaysEmpty,
}

impl fmt::Display for ListingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => f.write_str("query"),
            Self::AlwaysEmpty => f.write_str("always_empty"),
        }
    }
}

/// Uniform capability set every provider adapter exposes
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Registry tag, the `<providerTag>` part of assistant ids
    fn tag(&self) -> &str;

    /// Listing behaviour of this adapter
    fn listing_policy(&self) -> ListingPolicy {
        ListingPolicy::Query
    }

    /// Send a chat message.
    ///
    /// Streams when the provider supports it, otherwise returns the complete
    /// payload.
    async fn chat(&self, request: &ChatRequest) -> GatewayResult<ChatResult>;

    /// Fetch the message history of one conversation
    async fn get_history(&self, conversation_id: &str, user_id: &UserId) -> GatewayResult<Value>;

    /// List the caller's conversations with an assistant
    async fn list_conversations(
        &self,
        user_id: &UserId,
        assistant_id: &AssistantId,
    ) -> GatewayResult<Vec<Conversation>>;

    /// Delete one conversation, returning the provider's acknowledgement
    async fn delete_conversation(
        &self,
        conversation_id: &str,
        user_id: &UserId,
    ) -> GatewayResult<Value>;
}
