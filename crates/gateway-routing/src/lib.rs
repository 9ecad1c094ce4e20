//! # Gateway Routing
//!
//! Assistant routing for the Chat Assistant Gateway.
//!
//! An assistant id has the form `<providerTag>:<rest>`. The router maps the
//! tag to the registered provider adapter; the rest is never interpreted here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod router;

// Re-export main types
pub use router::AssistantRouter;
