//! Common test utilities and test doubles for the orchestrator

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use itreality_core::config::{LlmConfig, OrchestratorConfig};
use itreality_core::domain::{
    Confidence, DnsSignals, DomainName, DomainResolver, Email, NewSnapshot, Probe, ProbeContext,
    Report, Resolution, SignalBlock, SignalBundle, SignalCategory, SignalData, Snapshot,
    SnapshotId, SnapshotOwner, Subscriber, SubscriptionTier, TlsSignals, UserId,
};
use itreality_llm::domain::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, ProviderCapabilities,
    ProviderInfo, StopReason, Usage,
};
use itreality_llm::ReportSynthesizer;
use itreality_orchestrator::domain::{
    NotificationError, Notifier, SnapshotReadyNotification, SnapshotStore, StoreError,
};
use itreality_orchestrator::infrastructure::{InMemorySnapshotStore, ProbeRegistry};
use itreality_orchestrator::{SignalOrchestrator, SnapshotWorkflow};

pub const PROBE_TIMEOUT: Duration = Duration::from_millis(200);

// ── Probes (test doubles) ──

/// Returns a fixed block after an optional delay
pub struct FixedProbe {
    category: SignalCategory,
    block: SignalBlock,
    delay: Duration,
    pub contact_emails: Arc<Mutex<Vec<Option<String>>>>,
}

impl FixedProbe {
    pub fn new(block: SignalBlock) -> Self {
        Self {
            category: block.category(),
            block,
            delay: Duration::ZERO,
            contact_emails: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Probe for FixedProbe {
    fn category(&self) -> SignalCategory {
        self.category
    }

    async fn collect(&self, ctx: &ProbeContext) -> SignalBlock {
        self.contact_emails
            .lock()
            .await
            .push(ctx.contact_email.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.block.clone()
    }
}

/// Never answers within any reasonable timeout
pub struct HangingProbe(pub SignalCategory);

#[async_trait]
impl Probe for HangingProbe {
    fn category(&self) -> SignalCategory {
        self.0
    }

    async fn collect(&self, _ctx: &ProbeContext) -> SignalBlock {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        SignalBlock::failed(self.0, "unreachable")
    }
}

/// Records whether `collect` ran to completion
pub struct SlowProbe {
    pub category: SignalCategory,
    pub delay: Duration,
    pub finished: Arc<AtomicBool>,
}

impl SlowProbe {
    pub fn new(category: SignalCategory, delay: Duration) -> Self {
        Self {
            category,
            delay,
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for SlowProbe {
    fn category(&self) -> SignalCategory {
        self.category
    }

    async fn collect(&self, _ctx: &ProbeContext) -> SignalBlock {
        tokio::time::sleep(self.delay).await;
        self.finished.store(true, Ordering::SeqCst);
        SignalBlock::failed(self.category, "slow probe finished")
    }
}

pub struct PanickingProbe(pub SignalCategory);

#[async_trait]
impl Probe for PanickingProbe {
    fn category(&self) -> SignalCategory {
        self.0
    }

    async fn collect(&self, _ctx: &ProbeContext) -> SignalBlock {
        panic!("probe exploded")
    }
}

// ── Resolver (test double) ──

pub struct FixedResolver(pub Resolution);

#[async_trait]
impl DomainResolver for FixedResolver {
    async fn resolves(&self, _domain: &DomainName) -> Resolution {
        self.0.clone()
    }
}

/// Resolves everything except the listed domains
pub struct SelectiveResolver {
    pub unresolvable: Vec<String>,
}

#[async_trait]
impl DomainResolver for SelectiveResolver {
    async fn resolves(&self, domain: &DomainName) -> Resolution {
        if self.unresolvable.iter().any(|d| d == domain.as_str()) {
            Resolution::Unresolvable
        } else {
            Resolution::Resolves
        }
    }
}

// ── LLM provider (test double) ──

/// Replays scripted results in order; the last one repeats
pub struct MockLlmProvider {
    script: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockLlmProvider {
    pub fn new(script: Vec<Result<CompletionResponse, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn answering_all() -> Self {
        Self::new(vec![Ok(completion(&model_answer()))])
    }

    pub fn with_error(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
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

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut script = self.script.lock().await;
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        next.unwrap_or_else(|| Err(LlmError::Other("No response configured".to_string())))
    }
}

pub fn completion(content: &str) -> CompletionResponse {
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

/// Narrates every category and picks no findings
pub fn model_answer() -> String {
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

    serde_json::json!({
        "owner_summary": "Your domain is mostly in order.",
        "top_findings": [],
        "block_narratives": narratives,
        "assumptions": [],
        "questions": ["Who renews our website certificate?"],
    })
    .to_string()
}

// ── Notifiers (test doubles) ──

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SnapshotReadyNotification>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_snapshot_ready(
        &self,
        notification: &SnapshotReadyNotification,
    ) -> Result<(), NotificationError> {
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FailingNotifier {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send_snapshot_ready(
        &self,
        _notification: &SnapshotReadyNotification,
    ) -> Result<(), NotificationError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotificationError::Delivery("smtp relay unavailable".to_string()))
    }
}

// ── Snapshot store (test double) ──

/// In-memory store whose history lookups fail for one owner
pub struct FlakyHistoryStore {
    pub inner: InMemorySnapshotStore,
    pub broken_owner: SnapshotOwner,
}

#[async_trait]
impl SnapshotStore for FlakyHistoryStore {
    async fn insert_snapshot(&self, snapshot: NewSnapshot) -> Result<Snapshot, StoreError> {
        self.inner.insert_snapshot(snapshot).await
    }

    async fn snapshots_by_owner(&self, owner: &SnapshotOwner) -> Result<Vec<Snapshot>, StoreError> {
        if owner == &self.broken_owner {
            return Err(StoreError::Database("connection reset by peer".to_string()));
        }
        self.inner.snapshots_by_owner(owner).await
    }
}

// ── Fixtures ──

pub fn acme() -> DomainName {
    DomainName::parse("acme.com").unwrap()
}

pub fn domain(name: &str) -> DomainName {
    DomainName::parse(name).unwrap()
}

pub fn dns_block() -> SignalBlock {
    SignalBlock::new(
        SignalData::Dns(DnsSignals {
            resolvable: true,
            has_a: true,
            has_aaaa: false,
            ns_records: vec!["ns1.acme.com".into(), "ns2.acme.com".into()],
            mx_records: vec!["mx.acme.com".into()],
            registrar: Some("Example Registrar, Inc.".into()),
            registered_at: Some(Utc::now() - ChronoDuration::days(400)),
            domain_age_days: Some(400),
        }),
        Confidence::High,
    )
}

pub fn tls_block(days_until_expiry: i64) -> SignalBlock {
    SignalBlock::new(
        SignalData::Tls(TlsSignals {
            issuer: Some("Let's Encrypt".into()),
            subject: Some("acme.com".into()),
            not_after: Some(Utc::now() + ChronoDuration::days(days_until_expiry)),
            days_until_expiry: Some(days_until_expiry),
            san_count: 2,
            protocol_version: Some("TLSv1_3".into()),
            trusted: true,
            verification_error: None,
        }),
        Confidence::High,
    )
}

/// DNS answers, email never answers, TLS answers with a certificate
/// expiring in 12 days
pub fn acme_probes() -> Vec<Arc<dyn Probe>> {
    vec![
        Arc::new(FixedProbe::new(dns_block())),
        Arc::new(HangingProbe(SignalCategory::Email)),
        Arc::new(FixedProbe::new(tls_block(12))),
    ]
}

pub fn orchestrator(
    probes: Vec<Arc<dyn Probe>>,
    resolver: Arc<dyn DomainResolver>,
) -> SignalOrchestrator {
    SignalOrchestrator::new(
        Arc::new(ProbeRegistry::with_probes(probes)),
        resolver,
        PROBE_TIMEOUT,
    )
}

pub fn workflow(
    orchestrator: SignalOrchestrator,
    llm: Arc<MockLlmProvider>,
    store: Arc<dyn SnapshotStore>,
    notifier: Arc<dyn Notifier>,
) -> SnapshotWorkflow {
    SnapshotWorkflow::new(
        Arc::new(orchestrator),
        Arc::new(ReportSynthesizer::new(llm, LlmConfig::default())),
        store,
        notifier,
        &OrchestratorConfig::default(),
    )
}

pub fn subscriber(email: &str) -> Subscriber {
    Subscriber {
        id: Uuid::new_v4(),
        auth_user_id: UserId::generate(),
        email: Email::new(email).unwrap(),
        tier: SubscriptionTier::Basic,
    }
}

pub fn owner_of(subscriber: &Subscriber) -> SnapshotOwner {
    SnapshotOwner::User(subscriber.auth_user_id)
}

fn minimal_report(domain: &DomainName, generated_at: DateTime<Utc>) -> Report {
    Report {
        domain: domain.clone(),
        owner_summary: "Earlier report.".to_string(),
        top_findings: Vec::new(),
        block_narratives: Vec::new(),
        assumptions: Vec::new(),
        questions: Vec::new(),
        generated_at,
        model: "test-model".to_string(),
        context_url: None,
    }
}

/// Completed snapshot created `days_ago` days before `now`
pub fn completed_snapshot(
    owner: &SnapshotOwner,
    domain: &DomainName,
    now: DateTime<Utc>,
    days_ago: i64,
) -> Snapshot {
    let created_at = now - ChronoDuration::days(days_ago);
    let signals = SignalBundle::assemble(domain.clone(), Vec::new(), created_at, 0);
    let new = NewSnapshot::completed(
        domain.clone(),
        owner.clone(),
        signals,
        minimal_report(domain, created_at),
    );
    Snapshot::from_new(SnapshotId::generate(), created_at, new)
}

pub fn failed_snapshot(
    owner: &SnapshotOwner,
    domain: &DomainName,
    now: DateTime<Utc>,
    days_ago: i64,
) -> Snapshot {
    let new = NewSnapshot::failed(domain.clone(), owner.clone(), None, "domain does not resolve");
    Snapshot::from_new(
        SnapshotId::generate(),
        now - ChronoDuration::days(days_ago),
        new,
    )
}
