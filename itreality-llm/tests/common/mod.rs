//! Common test utilities and mock implementations

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use itreality_core::domain::{
    CheckOutcome, Confidence, DkimCheck, DmarcCheck, DmarcPolicy, DnsSignals, DomainName,
    EmailSignals, SignalBlock, SignalBundle, SignalCategory, SignalData, SpfCheck, TlsSignals,
};
use itreality_llm::domain::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, ProviderCapabilities,
    ProviderInfo, StopReason, Usage,
};

// ── LLM provider (test double) ──

/// Replays scripted results in order; the last one repeats
pub struct MockLlmProvider {
    script: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    pub captured_requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmProvider {
    pub fn new(script: Vec<Result<CompletionResponse, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_json_response(content: &str) -> Self {
        Self::new(vec![Ok(create_completion_response(content))])
    }

    pub fn with_error(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub async fn calls(&self) -> usize {
        self.captured_requests.lock().await.len()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            id: "mock",
            name: "Mock Provider",
            capabilities: ProviderCapabilities {
                json_mode: true,
                max_context_tokens: 8192,
                max_output_tokens: 2048,
            },
        }
    }

    fn default_model(&self) -> &str {
        "test-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.captured_requests.lock().await.push(request);

        let mut script = self.script.lock().await;
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        next.unwrap_or_else(|| Err(LlmError::Other("No response configured".to_string())))
    }
}

pub fn create_completion_response(content: &str) -> CompletionResponse {
    CompletionResponse {
        id: "test-response-id".to_string(),
        model: "test-model".to_string(),
        content: content.to_string(),
        stop_reason: StopReason::EndTurn,
        usage: Usage {
            prompt_tokens: 100,
            completion_tokens: 50,
            total_tokens: 150,
        },
        created: Some(1_700_000_000),
    }
}

// ── Signal fixtures ──

pub fn acme() -> DomainName {
    DomainName::parse("acme.com").unwrap()
}

/// DNS high (400 days old), email timed out, TLS high and expiring in 12 days
pub fn acme_bundle() -> SignalBundle {
    let collected_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let dns = SignalBlock::new(
        SignalData::Dns(DnsSignals {
            resolvable: true,
            has_a: true,
            has_aaaa: false,
            ns_records: vec!["ns1.acme.com".into(), "ns2.acme.com".into()],
            mx_records: vec!["mx.acme.com".into()],
            registrar: Some("Example Registrar, Inc.".into()),
            registered_at: Some(collected_at - Duration::days(400)),
            domain_age_days: Some(400),
        }),
        Confidence::High,
    );
    let email = SignalBlock::failed(SignalCategory::Email, "probe timed out after 15s");
    let tls = SignalBlock::new(
        SignalData::Tls(TlsSignals {
            issuer: Some("Let's Encrypt".into()),
            subject: Some("acme.com".into()),
            not_after: Some(collected_at + Duration::days(12)),
            days_until_expiry: Some(12),
            san_count: 2,
            protocol_version: Some("TLSv1_3".into()),
            trusted: true,
            verification_error: None,
        }),
        Confidence::High,
    );

    SignalBundle::assemble(acme(), vec![dns, email, tls], collected_at, 1_850)
}

/// Email fully observed with missing DMARC and SPF
pub fn weak_email_block() -> SignalBlock {
    SignalBlock::new(
        SignalData::Email(EmailSignals {
            spf: SpfCheck {
                status: CheckOutcome::Absent,
                record: None,
                all_qualifier: None,
            },
            dmarc: DmarcCheck {
                status: CheckOutcome::Present,
                record: Some("v=DMARC1; p=none".into()),
                policy: Some(DmarcPolicy::None),
            },
            dkim: DkimCheck {
                status: CheckOutcome::Present,
                selectors_checked: vec!["google".into()],
                selectors_found: vec!["google".into()],
            },
        }),
        Confidence::High,
    )
}

/// Model answer that narrates every category and picks the given codes
pub fn model_answer(codes: &[&str]) -> String {
    let narratives: Vec<serde_json::Value> = SignalCategory::ALL
        .iter()
        .map(|category| {
            serde_json::json!({
                "category": category,
                "explanation": format!("What we saw for {category}."),
                "why_it_matters": format!("Why {category} matters."),
            })
        })
        .collect();
    let findings: Vec<serde_json::Value> = codes
        .iter()
        .map(|code| {
            serde_json::json!({
                "finding_code": code,
                "title": format!("Model title for {code}"),
                "description": format!("Model description for {code}."),
            })
        })
        .collect();

    serde_json::json!({
        "owner_summary": "Your domain is mostly in order, with a few things to fix.",
        "top_findings": findings,
        "block_narratives": narratives,
        "assumptions": ["You use a single email provider."],
        "questions": ["Who renews our website certificate?"],
    })
    .to_string()
}
