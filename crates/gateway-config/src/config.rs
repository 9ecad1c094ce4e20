//! Configuration types.

use gateway_core::ListingPolicy;
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Tag of the MaxKB provider
pub const MAXKB: &str = "maxkb";
/// Tag of the Dify provider
pub const DIFY: &str = "dify";
/// Tag of the RAGFlow provider
pub const RAGFLOW: &str = "ragflow";
/// Tag of the SQLBot provider
pub const SQLBOT: &str = "sqlbot";

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server settings
    #[validate(nested)]
    pub server: ServerConfig,
    /// Chat orchestration settings
    pub gateway: ChatGatewayConfig,
    /// Logging settings
    pub logging: LoggingSettings,
    /// Provider backends
    #[validate(nested)]
    pub providers: ProvidersConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    #[validate(range(min = 1))]
    pub port: u16,
    /// Trusted header carrying the authenticated user id, set by the auth proxy
    pub user_id_header: Option<String>,
    /// Allowed CORS origins; empty means any origin
    pub cors_allowed_origins: Vec<String>,
    /// Grace period for in-flight requests on shutdown
    #[serde(with = "humantime_serde")]
    #[validate(custom(function = "non_zero_duration"))]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            user_id_header: Some("x-user-id".to_string()),
            cors_allowed_origins: Vec::new(),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// `host:port` socket address string
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Chat orchestration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatGatewayConfig {
    /// Fetch conversation history before dispatching a chat that names a
    /// `conversationId`. Failures are logged and ignored.
    pub resolve_conversation_context: bool,
}

impl Default for ChatGatewayConfig {
    fn default() -> Self {
        Self {
            resolve_conversation_context: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive (overridden by `RUST_LOG`)
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Settings of all provider backends
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ProvidersConfig {
    /// MaxKB
    #[validate(nested)]
    pub maxkb: ProviderSettings,
    /// Dify
    #[validate(nested)]
    pub dify: ProviderSettings,
    /// RAGFlow
    #[validate(nested)]
    pub ragflow: ProviderSettings,
    /// SQLBot
    #[validate(nested)]
    pub sqlbot: ProviderSettings,
}

impl ProvidersConfig {
    /// Settings paired with their provider tag
    #[must_use]
    pub fn entries(&self) -> [(&'static str, &ProviderSettings); 4] {
        [
            (MAXKB, &self.maxkb),
            (DIFY, &self.dify),
            (RAGFLOW, &self.ragflow),
            (SQLBOT, &self.sqlbot),
        ]
    }

    /// Mutable settings of one provider
    pub fn get_mut(&mut self, tag: &str) -> Option<&mut ProviderSettings> {
        match tag {
            MAXKB => Some(&mut self.maxkb),
            DIFY => Some(&mut self.dify),
            RAGFLOW => Some(&mut self.ragflow),
            SQLBOT => Some(&mut self.sqlbot),
            _ => None,
        }
    }
}

/// Base URL used when none is configured
#[must_use]
pub fn default_base_url(tag: &str) -> &'static str {
    match tag {
        MAXKB => "http://localhost:8080",
        DIFY => "http://localhost/v1",
        RAGFLOW => "http://localhost:9380",
        SQLBOT => "http://localhost:8000",
        _ => "http://localhost",
    }
}

/// Connection settings of one provider backend
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct ProviderSettings {
    /// Register this provider at startup
    pub enabled: bool,
    /// API key sent as a bearer token; empty sends no auth header
    pub api_key: SecretString,
    /// Base URL; falls back to the provider's default
    #[validate(url)]
    pub base_url: Option<String>,
    /// Bound on one provider call (time to headers when streaming)
    #[serde(with = "humantime_serde")]
    #[validate(custom(function = "non_zero_duration"))]
    pub timeout: Duration,
    /// TCP connect timeout
    #[serde(with = "humantime_serde")]
    #[validate(custom(function = "non_zero_duration"))]
    pub connect_timeout: Duration,
    /// Listing policy override; each adapter has its own default
    pub listing: Option<ListingPolicy>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: SecretString::new(String::new()),
            base_url: None,
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            listing: None,
        }
    }
}

impl ProviderSettings {
    /// Configured base URL or the provider default
    #[must_use]
    pub fn base_url_or_default(&self, tag: &str) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| default_base_url(tag).to_string())
    }
}

fn non_zero_duration(duration: &Duration) -> Result<(), ValidationError> {
    if duration.is_zero() {
        return Err(ValidationError::new("zero_duration"));
    }
    Ok(())
}
