//! # Gateway Providers
//!
//! Provider adapters for the Chat Assistant Gateway.
//!
//! Each adapter implements [`gateway_core::ChatProvider`] for one backend:
//! - MaxKB (event-framed stream, listing disabled by default)
//! - Dify (event-framed stream)
//! - RAGFlow (raw text stream)
//! - SQLBot (complete JSON answers)
//!
//! All of them share [`HttpBackend`] for auth, timeouts and status handling.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dify;
pub mod http;
pub mod maxkb;
pub mod ragflow;
pub mod registry;
pub mod sqlbot;

// Re-export main types
pub use dify::DifyProvider;
pub use http::HttpBackend;
pub use maxkb::MaxKbProvider;
pub use ragflow::RagFlowProvider;
pub use registry::ProviderRegistry;
pub use sqlbot::SqlBotProvider;
