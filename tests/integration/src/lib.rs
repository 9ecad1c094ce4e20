//! Integration tests for the Chat Assistant Gateway
//!
//! Every test starts the full gateway on an ephemeral port in front of
//! wiremock provider backends and talks to it over real HTTP:
//! - Assistant routing and rejection of unknown providers
//! - Streaming and non-streaming chat
//! - Conversation history, listing and deletion
//! - Provider failure handling

pub mod helpers;
pub mod mock_providers;

// Re-export commonly used items
pub use helpers::*;
pub use mock_providers::*;

#[cfg(test)]
mod chat_tests;
#[cfg(test)]
mod conversation_tests;
#[cfg(test)]
mod routing_tests;
