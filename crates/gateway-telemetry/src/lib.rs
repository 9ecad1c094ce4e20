//! # Gateway Telemetry
//!
//! Observability for the Chat Assistant Gateway.
//!
//! This crate provides:
//! - Structured logging setup on top of `tracing-subscriber`
//! - Prometheus metrics for provider calls and streams

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod metrics;

// Re-export main types
pub use logging::{init_logging, LoggingConfig, LoggingError};
pub use metrics::{CallOutcome, Metrics, MetricsError, StreamGuard};
