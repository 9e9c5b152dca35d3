//! LLM provider implementations

pub mod openai;
pub mod resilient;

pub use openai::OpenAIProvider;
pub use resilient::{ResilienceConfig, ResilientProvider};

use std::sync::Arc;

use itreality_core::config::LlmConfig;
use tracing::info;

use crate::domain::{LlmError, LlmProvider};

/// Provider selected by `llm.provider`, wrapped for resilience when enabled
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider: Arc<dyn LlmProvider> = match config.provider.to_ascii_lowercase().as_str() {
        "openai" => Arc::new(OpenAIProvider::from_config(config)?),
        other => {
            return Err(LlmError::Configuration(format!(
                "unsupported LLM provider: {other}"
            )));
        }
    };

    info!(
        provider = provider.info().id,
        model = provider.default_model(),
        resilient = config.resilience.enabled,
        "LLM provider ready"
    );

    if config.resilience.enabled {
        Ok(Arc::new(ResilientProvider::new(
            provider,
            ResilienceConfig::from(&config.resilience),
        )))
    } else {
        Ok(provider)
    }
}
