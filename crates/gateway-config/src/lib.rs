//! # Gateway Config
//!
//! Configuration management for the Chat Assistant Gateway.
//!
//! Configuration is layered, later layers winning:
//! 1. Built-in defaults
//! 2. An optional YAML or TOML file (`GATEWAY_CONFIG`, else `config/gateway.yaml`)
//! 3. Environment variables (`GATEWAY_PORT`, `MAXKB_API_KEY`, ...)
//!
//! The result is validated once at startup and treated as immutable afterwards.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod loader;

pub use config::{
    ChatGatewayConfig, GatewayConfig, LoggingSettings, ProviderSettings, ProvidersConfig,
    ServerConfig,
};
pub use loader::{load_config, load_from_file, ConfigError, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
