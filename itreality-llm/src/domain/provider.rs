//! LLM provider abstraction

use async_trait::async_trait;

use crate::domain::error::LlmError;
use crate::domain::messages::{CompletionRequest, CompletionResponse};

#[derive(Debug, Clone, Default)]
pub struct ProviderCapabilities {
    /// Honors `CompletionRequest::json_mode`
    pub json_mode: bool,
    pub max_context_tokens: u32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ProviderInfo {
    /// Stable identifier such as `"openai"`; also names the circuit breaker
    pub id: &'static str,
    pub name: &'static str,
    pub capabilities: ProviderCapabilities,
}

/// A chat-completion backend.
///
/// Object safe; the synthesizer holds an `Arc<dyn LlmProvider>`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn info(&self) -> ProviderInfo;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Cheapest possible completion; used by the CLI before a run
    async fn health_check(&self) -> Result<(), LlmError> {
        let request = CompletionRequest::new()
            .with_user("ping")
            .with_max_tokens(1);

        self.complete(request).await.map(|_| ())
    }

    fn default_model(&self) -> &str;
}
