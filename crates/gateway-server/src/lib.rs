//! # Gateway Server
//!
//! HTTP server for the Chat Assistant Gateway.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Chat endpoint with SSE streaming of normalized provider output
//! - Conversation history, listing and delete passthrough endpoints
//! - Health, readiness, metrics and provider listing endpoints
//! - Graceful shutdown handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod state;

// Re-export main types
pub use error::ApiError;
pub use extractors::{AuthenticatedUser, UserIdentity};
pub use routes::create_router;
pub use server::{Server, ServerConfig, ServerError};
pub use shutdown::shutdown_signal;
pub use state::{AppState, AppStateBuilder};
