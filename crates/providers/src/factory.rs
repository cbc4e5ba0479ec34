//! Builds API components from configuration rows.

use crate::openai_compat::OpenAiCompatProvider;
use armory_core::agent::ApiConfig;
use armory_core::error::ProviderError;
use armory_core::provider::{Provider, ProviderFactory};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Connects every API row to an OpenAI-compatible endpoint.
#[derive(Debug, Clone, Default)]
pub struct OpenAiCompatFactory {
    verify: bool,
}

impl OpenAiCompatFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the endpoint's model listing before handing the client out.
    pub fn with_health_check(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}

#[async_trait]
impl ProviderFactory for OpenAiCompatFactory {
    async fn connect(&self, api: &ApiConfig) -> Result<Arc<dyn Provider>, ProviderError> {
        if api.api_key.is_empty() {
            warn!(api_id = %api.api_id, "API has no key configured");
        }

        let provider = OpenAiCompatProvider::from_config(api)?;

        if self.verify && !provider.health_check().await? {
            return Err(ProviderError::NotConfigured(format!(
                "api '{}' failed its health check at {}",
                api.api_id, api.base_url
            )));
        }

        info!(api_id = %api.api_id, url = %provider.completions_url(), "Connected API");
        Ok(Arc::new(provider))
    }
}
