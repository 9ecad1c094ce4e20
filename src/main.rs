//! # Chat Assistant Gateway
//!
//! Single chat API in front of several conversational AI backends.
//!
//! Requests name an assistant as `<providerTag>:<rest>`; the tag picks the
//! backend adapter (MaxKB, Dify, RAGFlow or SQLBot) and streamed answers are
//! normalized into one SSE event format.
//!
//! ## Usage
//!
//! ```bash
//! # Start with default configuration
//! chat-assistant-gateway
//!
//! # Start with a config file
//! GATEWAY_CONFIG=/etc/gateway/gateway.yaml chat-assistant-gateway
//!
//! # Start with environment overrides
//! GATEWAY_PORT=9000 DIFY_API_KEY=app-xxx chat-assistant-gateway
//! ```

use gateway_config::{load_config, GatewayConfig};
use gateway_providers::ProviderRegistry;
use gateway_routing::AssistantRouter;
use gateway_server::{AppState, Server, ServerConfig};
use gateway_telemetry::{init_logging, LoggingConfig, Metrics};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Application entry point
#[tokio::main]
async fn main() {
    let config = match load_config().await {
        Ok(config) => config,
        Err(e) => {
            if let Err(log_err) = init_logging(&LoggingConfig::new()) {
                eprintln!("Failed to initialize logging: {log_err}");
            }
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let logging = LoggingConfig::new()
        .with_level(config.logging.level.clone())
        .with_json(config.logging.json);
    if let Err(e) = init_logging(&logging) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Chat Assistant Gateway"
    );

    if let Err(e) = run(config).await {
        error!(error = %e, "Application failed");
        std::process::exit(1);
    }
}

/// Main application logic
async fn run(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    let metrics = Arc::new(Metrics::new()?);

    let registry = ProviderRegistry::from_config(&config.providers)?;
    if registry.is_empty() {
        warn!("No providers enabled, every chat request will be rejected");
    }
    info!(providers = ?registry.tags(), "Provider registry initialized");

    let router = AssistantRouter::new(registry);
    let server_config = ServerConfig::from_config(&config.server);

    let state = AppState::builder()
        .config(config)
        .router(router)
        .metrics(metrics)
        .build()?;

    Server::new(server_config, state).run().await?;

    Ok(())
}
