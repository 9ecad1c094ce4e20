//! Shared application state.

use axum::http::HeaderName;
use gateway_config::GatewayConfig;
use gateway_core::{GatewayError, GatewayResult};
use gateway_providers::ProviderRegistry;
use gateway_routing::AssistantRouter;
use gateway_telemetry::Metrics;
use std::sync::Arc;

/// State shared by all handlers; cheap to clone
#[derive(Debug, Clone)]
pub struct AppState {
    /// Validated configuration
    pub config: Arc<GatewayConfig>,
    /// Assistant router
    pub router: AssistantRouter,
    /// Prometheus metrics
    pub metrics: Arc<Metrics>,
    /// Trusted header carrying the caller identity
    pub user_id_header: Option<HeaderName>,
}

impl AppState {
    /// Create a builder
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }
}

/// Builder for [`AppState`]
#[derive(Debug, Default)]
pub struct AppStateBuilder {
    config: Option<GatewayConfig>,
    router: Option<AssistantRouter>,
    metrics: Option<Arc<Metrics>>,
}

impl AppStateBuilder {
    /// Set the configuration
    #[must_use]
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the router
    #[must_use]
    pub fn router(mut self, router: AssistantRouter) -> Self {
        self.router = Some(router);
        self
    }

    /// Set the metrics
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the state.
    ///
    /// Missing parts default to the default configuration, an empty router
    /// and a fresh metrics registry.
    ///
    /// # Errors
    /// Returns `Configuration` if the user id header name is invalid or the
    /// metrics cannot be registered
    pub fn build(self) -> GatewayResult<AppState> {
        let config = self.config.unwrap_or_default();

        let user_id_header = config
            .server
            .user_id_header
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map(|name| {
                HeaderName::from_bytes(name.trim().as_bytes()).map_err(|e| {
                    GatewayError::configuration(format!("invalid user id header '{name}': {e}"))
                })
            })
            .transpose()?;

        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => Arc::new(
                Metrics::new().map_err(|e| GatewayError::configuration(e.to_string()))?,
            ),
        };

        Ok(AppState {
            config: Arc::new(config),
            router: self
                .router
                .unwrap_or_else(|| AssistantRouter::new(ProviderRegistry::new())),
            metrics,
            user_id_header,
        })
    }
}
