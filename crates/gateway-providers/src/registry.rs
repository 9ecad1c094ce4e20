//! Provider registry.
//!
//! Built once at startup and shared read-only afterwards, so lookups need no
//! locking.

use crate::dify::DifyProvider;
use crate::maxkb::MaxKbProvider;
use crate::ragflow::RagFlowProvider;
use crate::sqlbot::SqlBotProvider;
use gateway_config::config::{DIFY, MAXKB, RAGFLOW, SQLBOT};
use gateway_config::{ProviderSettings, ProvidersConfig};
use gateway_core::{ChatProvider, GatewayError, GatewayResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Adapters keyed by provider tag
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ChatProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every enabled provider from configuration
    ///
    /// # Errors
    /// Returns error if a provider's backend cannot be created
    pub fn from_config(config: &ProvidersConfig) -> GatewayResult<Self> {
        let mut registry = Self::new();

        for (tag, settings) in config.entries() {
            if !settings.enabled {
                debug!(provider = tag, "Provider disabled, skipping");
                continue;
            }
            registry.register(build_provider(tag, settings)?)?;
            info!(
                provider = tag,
                base_url = %settings.base_url_or_default(tag),
                "Registered provider"
            );
        }

        Ok(registry)
    }

    /// Register an adapter under its tag
    ///
    /// # Errors
    /// Returns `Configuration` if the tag is already taken
    pub fn register(&mut self, provider: Arc<dyn ChatProvider>) -> GatewayResult<()> {
        let tag = provider.tag().to_string();
        if self.providers.contains_key(&tag) {
            return Err(GatewayError::configuration(format!(
                "provider '{tag}' registered twice"
            )));
        }
        self.providers.insert(tag, provider);
        Ok(())
    }

    /// Adapter for a tag
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<Arc<dyn ChatProvider>> {
        self.providers.get(tag).cloned()
    }

    /// Registered tags, sorted
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.providers.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Number of registered adapters
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no adapter is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// All adapters, sorted by tag
    #[must_use]
    pub fn providers(&self) -> Vec<Arc<dyn ChatProvider>> {
        self.tags()
            .iter()
            .filter_map(|tag| self.get(tag))
            .collect()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.tags())
            .finish()
    }
}

fn build_provider(tag: &str, settings: &ProviderSettings) -> GatewayResult<Arc<dyn ChatProvider>> {
    let provider: Arc<dyn ChatProvider> = match tag {
        MAXKB => Arc::new(MaxKbProvider::from_settings(settings)?),
        DIFY => Arc::new(DifyProvider::from_settings(settings)?),
        RAGFLOW => Arc::new(RagFlowProvider::from_settings(settings)?),
        SQLBOT => Arc::new(SqlBotProvider::from_settings(settings)?),
        other => {
            return Err(GatewayError::configuration(format!(
                "unknown provider '{other}'"
            )))
        }
    };
    Ok(provider)
}
