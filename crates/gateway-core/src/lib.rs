//! # Gateway Core
//!
//! Core types, traits, and error handling for the Chat Assistant Gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - Chat request and result types
//! - The [`ChatProvider`] adapter trait every backend implements
//! - The stream normalizer that turns provider byte streams into [`StreamEvent`]s
//! - Error types and handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod normalizer;
pub mod provider;
pub mod request;
pub mod response;
pub mod streaming;
pub mod types;

// Re-export commonly used types
pub use error::{GatewayError, GatewayResult};
pub use normalizer::{NormalizedStream, StreamNormalizer};
pub use provider::{ChatProvider, ListingPolicy};
pub use request::{ChatFile, ChatRequest, ChatRequestBuilder};
pub use response::{ByteStream, ChatResult, Conversation, ProviderStream};
pub use streaming::{StreamEvent, StreamFormat};
pub use types::{AssistantId, UserId, ANONYMOUS_USER};
