//! Retry and circuit breaker around any provider

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

use itreality_core::config::LlmResilienceConfig;

use crate::domain::{CompletionRequest, CompletionResponse, LlmError, LlmProvider, ProviderInfo};

#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Consecutive failed calls before the circuit opens
    pub circuit_breaker_threshold: u32,
    /// Time the circuit stays open before a trial request is let through
    pub circuit_breaker_timeout_secs: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self::from(&LlmResilienceConfig::default())
    }
}

impl From<&LlmResilienceConfig> for ResilienceConfig {
    fn from(config: &LlmResilienceConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff_ms: config.initial_backoff_ms,
            max_backoff_ms: config.max_backoff_ms,
            circuit_breaker_threshold: config.circuit_breaker_threshold,
            circuit_breaker_timeout_secs: config.circuit_breaker_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CircuitState {
    Closed,
    Open,
    /// One trial request is in flight
    HalfOpen,
}

struct CircuitBreaker {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Wraps a provider with retry (exponential backoff with jitter) for
/// transient errors and a circuit breaker that fails fast while the backend
/// is down.
pub struct ResilientProvider {
    inner: Arc<dyn LlmProvider>,
    config: ResilienceConfig,
    circuit: Mutex<CircuitBreaker>,
}

impl ResilientProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, config: ResilienceConfig) -> Self {
        Self {
            inner,
            config,
            circuit: Mutex::new(CircuitBreaker {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    fn circuit_open_error(&self) -> LlmError {
        LlmError::CircuitOpen {
            circuit: self.inner.info().id.to_string(),
        }
    }

    async fn admit(&self) -> Result<(), LlmError> {
        let mut circuit = self.circuit.lock().await;
        match circuit.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen => Err(self.circuit_open_error()),
            CircuitState::Open => {
                let cooled_down = circuit.opened_at.is_some_and(|at| {
                    at.elapsed() >= Duration::from_secs(self.config.circuit_breaker_timeout_secs)
                });
                if cooled_down {
                    debug!(provider = self.inner.info().id, "Circuit breaker half-open");
                    circuit.state = CircuitState::HalfOpen;
                    Ok(())
                } else {
                    Err(self.circuit_open_error())
                }
            }
        }
    }

    async fn record(&self, succeeded: bool) {
        let mut circuit = self.circuit.lock().await;
        if succeeded {
            if circuit.state != CircuitState::Closed {
                debug!(provider = self.inner.info().id, "Circuit breaker closed");
            }
            circuit.state = CircuitState::Closed;
            circuit.consecutive_failures = 0;
            circuit.opened_at = None;
            return;
        }

        circuit.consecutive_failures += 1;
        let should_open = circuit.state == CircuitState::HalfOpen
            || circuit.consecutive_failures >= self.config.circuit_breaker_threshold;
        if should_open && circuit.state != CircuitState::Open {
            warn!(
                provider = self.inner.info().id,
                failures = circuit.consecutive_failures,
                threshold = self.config.circuit_breaker_threshold,
                "Circuit breaker opening"
            );
            circuit.state = CircuitState::Open;
            circuit.opened_at = Some(Instant::now());
        }
    }

    async fn complete_with_retry(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let mut backoff = self.config.initial_backoff_ms;
        let mut attempt = 0;

        loop {
            match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = e
                        .retry_after()
                        .map(|d| d.as_millis() as u64)
                        .filter(|ms| *ms <= self.config.max_backoff_ms)
                        .unwrap_or(backoff);
                    debug!(attempt, delay_ms = delay, error = %e, "Retrying LLM request");
                    sleep(Duration::from_millis(delay)).await;

                    backoff = (backoff * 2 + jitter(backoff / 4)).min(self.config.max_backoff_ms);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Spreads retries from concurrent callers
fn jitter(max: u64) -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    u64::from(nanos) % max.max(1)
}

#[async_trait]
impl LlmProvider for ResilientProvider {
    fn info(&self) -> ProviderInfo {
        self.inner.info()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.admit().await?;

        let result = self.complete_with_retry(request).await;
        // Only backend health trips the breaker; a rejected request does not.
        let healthy = match &result {
            Ok(_) => true,
            Err(e) => !e.is_retryable(),
        };
        self.record(healthy).await;
        result
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let config = ResilienceConfig::from(&LlmResilienceConfig::default());
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.circuit_breaker_threshold, 5);
    }

    #[test]
    fn test_jitter_bounds() {
        assert!(jitter(100) < 100);
        assert_eq!(jitter(0), 0);
    }
}
