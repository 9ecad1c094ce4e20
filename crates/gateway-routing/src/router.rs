//! Assistant router.

use gateway_core::{AssistantId, ChatProvider, GatewayError, GatewayResult};
use gateway_providers::ProviderRegistry;
use std::sync::Arc;
use tracing::debug;

/// Resolves assistant ids to provider adapters
#[derive(Debug, Clone)]
pub struct AssistantRouter {
    registry: Arc<ProviderRegistry>,
}

impl AssistantRouter {
    /// Create a router over a registry
    #[must_use]
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Adapter serving an assistant id given as a raw string
    ///
    /// # Errors
    /// Returns `UnsupportedAssistantType` if the id has no `provider:` prefix
    /// or no adapter is registered for the prefix
    pub fn resolve(&self, assistant_id: &str) -> GatewayResult<Arc<dyn ChatProvider>> {
        let parsed = AssistantId::parse(assistant_id)?;
        self.resolve_id(&parsed)
    }

    /// Adapter serving a parsed assistant id
    ///
    /// # Errors
    /// Returns `UnsupportedAssistantType` if no adapter is registered for the tag
    pub fn resolve_id(&self, assistant_id: &AssistantId) -> GatewayResult<Arc<dyn ChatProvider>> {
        let tag = assistant_id.provider_tag();
        match self.registry.get(tag) {
            Some(provider) => {
                debug!(assistant_id = %assistant_id, provider = tag, "Resolved assistant");
                Ok(provider)
            }
            None => Err(GatewayError::unsupported_assistant(assistant_id.as_str())),
        }
    }

    /// Registered provider tags, sorted
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.registry.tags()
    }

    /// Number of registered adapters
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no adapter is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// All adapters, sorted by tag
    #[must_use]
    pub fn adapters(&self) -> Vec<Arc<dyn ChatProvider>> {
        self.registry.providers()
    }
}
