//! OpenAI-compatible chat completions provider
//!
//! Also works against local servers exposing the same API (Ollama, vLLM).

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use itreality_core::config::LlmConfig;

use crate::domain::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, ProviderCapabilities,
    ProviderInfo, StopReason, Usage,
};

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    organization_id: Option<String>,
    timeout_seconds: u64,
}

impl OpenAIProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            organization_id: None,
            timeout_seconds: timeout.as_secs(),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .openai
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::Configuration("llm.openai.api_key is not set".to_string()))?;

        let mut provider = Self::new(
            api_key,
            config.default_model.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?
        .with_base_url(&config.openai.base_url);
        if let Some(org) = &config.openai.organization_id {
            provider = provider.with_organization(org);
        }
        Ok(provider)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_organization(mut self, org_id: impl Into<String>) -> Self {
        self.organization_id = Some(org_id.into());
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages: request
                .messages
                .iter()
                .map(|msg| OpenAIMessage {
                    role: msg.role.as_str().to_string(),
                    content: Some(msg.content.clone()),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stop: (!request.stop.is_empty()).then(|| request.stop.clone()),
            response_format: request.json_mode.then(|| ResponseFormat {
                kind: "json_object",
            }),
        }
    }

    fn parse_openai_response(response: OpenAIResponse) -> Result<CompletionResponse, LlmError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response has no choices".to_string()))?;

        let stop_reason = match choice.finish_reason.as_deref() {
            Some("stop") => StopReason::EndTurn,
            Some("length") => StopReason::MaxTokens,
            Some("content_filter") => StopReason::ContentFilter,
            _ => StopReason::Other,
        };
        if stop_reason == StopReason::ContentFilter {
            return Err(LlmError::ContentFiltered {
                reason: "completion stopped by the provider's content filter".to_string(),
            });
        }

        Ok(CompletionResponse {
            id: response.id,
            model: response.model,
            content: choice.message.and_then(|m| m.content).unwrap_or_default(),
            stop_reason,
            usage: response
                .usage
                .map(|u| Usage {
                    prompt_tokens: u.prompt_tokens,
                    completion_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
            created: Some(response.created),
        })
    }
}

fn retry_after_seconds(headers: &header::HeaderMap) -> Option<u64> {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            id: "openai",
            name: "OpenAI",
            capabilities: ProviderCapabilities {
                json_mode: true,
                max_context_tokens: 128_000,
                max_output_tokens: 16_384,
            },
        }
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let openai_request = self.to_openai_request(&request);
        debug!(model = %openai_request.model, "Sending request to OpenAI-compatible API");

        let mut req = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&openai_request);
        if let Some(org) = &self.organization_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req.send().await.map_err(|e| match LlmError::from(e) {
            LlmError::Timeout { .. } => LlmError::timeout(self.timeout_seconds),
            other => other,
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_seconds(response.headers());
            let text = response.text().await.unwrap_or_default();

            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => LlmError::rate_limited(text, retry_after),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::auth(text),
                StatusCode::NOT_FOUND => LlmError::ModelNotFound(openai_request.model),
                StatusCode::BAD_REQUEST => LlmError::InvalidRequest(text),
                s if s.is_server_error() => LlmError::ServiceUnavailable(text),
                s => {
                    error!(status = %s, "OpenAI API error: {}", text);
                    LlmError::InvalidResponse(format!("API error {s}: {text}"))
                }
            });
        }

        let openai_response: OpenAIResponse = response.json().await?;
        Self::parse_openai_response(openai_response)
    }
}

// === OpenAI API Types ===

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    id: String,
    model: String,
    created: u64,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Message;

    fn provider() -> OpenAIProvider {
        OpenAIProvider::new("test-key", "gpt-4o-mini", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_chat_url() {
        assert_eq!(
            provider().chat_url(),
            "https://api.openai.com/v1/chat/completions"
        );
        let local = provider().with_base_url("http://localhost:11434/v1/");
        assert_eq!(local.chat_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_request_mapping() {
        let request = CompletionRequest::new()
            .with_message(Message::system("schema"))
            .with_user("signals")
            .with_json_mode();
        let mapped = serde_json::to_value(provider().to_openai_request(&request)).unwrap();

        assert_eq!(mapped["model"], "gpt-4o-mini");
        assert_eq!(mapped["messages"][0]["role"], "system");
        assert_eq!(mapped["response_format"]["type"], "json_object");
        assert!(mapped.get("stop").is_none());
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = LlmConfig::default();
        assert!(matches!(
            OpenAIProvider::from_config(&config),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_choices_is_invalid() {
        let response = OpenAIResponse {
            id: "x".into(),
            model: "m".into(),
            created: 0,
            choices: Vec::new(),
            usage: None,
        };
        assert!(matches!(
            OpenAIProvider::parse_openai_response(response),
            Err(LlmError::InvalidResponse(_))
        ));
    }
}
