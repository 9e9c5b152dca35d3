//! Full snapshot cycle: collect, synthesize, persist, notify

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{
    FailingNotifier, FixedResolver, MockLlmProvider, RecordingNotifier, acme, acme_probes,
    orchestrator, workflow,
};
use itreality_core::domain::{
    CAVEAT_MARKER, Confidence, Email, Resolution, SignalCategory, SnapshotOwner, SnapshotStatus,
};
use itreality_llm::LlmError;
use itreality_orchestrator::domain::{SnapshotRun, SnapshotStore};
use itreality_orchestrator::infrastructure::InMemorySnapshotStore;

fn owner_email() -> Email {
    Email::new("owner@acme.com").unwrap()
}

fn acme_run() -> SnapshotRun {
    let mut run = SnapshotRun::new(acme(), SnapshotOwner::for_email(&owner_email()))
        .with_contact_email("owner@acme.com");
    run.notify = Some(owner_email());
    run
}

#[tokio::test]
async fn test_acme_end_to_end() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let llm = Arc::new(MockLlmProvider::answering_all());
    let workflow = workflow(
        orchestrator(acme_probes(), Arc::new(FixedResolver(Resolution::Resolves))),
        llm.clone(),
        store.clone(),
        notifier.clone(),
    );

    let snapshot = workflow.execute(acme_run()).await.unwrap();

    assert_eq!(snapshot.status, SnapshotStatus::Completed);
    assert!(snapshot.error.is_none());
    let signals = snapshot.signals.as_ref().unwrap();
    let report = snapshot.report.as_ref().unwrap();

    assert_eq!(signals.block(SignalCategory::Dns).confidence, Confidence::High);
    assert_eq!(signals.block(SignalCategory::Tls).confidence, Confidence::High);
    assert!(signals.block(SignalCategory::Email).error.is_some());

    let email = report.narrative(SignalCategory::Email).unwrap();
    assert_eq!(email.confidence, Confidence::Low);
    assert!(
        email
            .confidence_note
            .as_deref()
            .unwrap()
            .starts_with(CAVEAT_MARKER)
    );

    let expiry = &report.top_findings[0];
    assert_eq!(expiry.category, SignalCategory::Tls);
    assert_eq!(expiry.confidence, Confidence::High);
    assert!(report.top_findings.len() <= 3);
    assert_eq!(
        report.context_url.as_deref(),
        Some("https://itreality.example/report")
    );

    let history = store
        .snapshots_by_owner(&SnapshotOwner::for_email(&owner_email()))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, snapshot.id);

    let sent = notifier.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].snapshot_id, snapshot.id);
    assert_eq!(sent[0].domain, acme());
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_unresolvable_domain_stores_failed_snapshot() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let llm = Arc::new(MockLlmProvider::answering_all());
    let workflow = workflow(
        orchestrator(acme_probes(), Arc::new(FixedResolver(Resolution::Unresolvable))),
        llm.clone(),
        store.clone(),
        notifier.clone(),
    );

    let snapshot = workflow.execute(acme_run()).await.unwrap();

    assert_eq!(snapshot.status, SnapshotStatus::Failed);
    assert!(snapshot.signals.is_none());
    assert!(snapshot.report.is_none());
    assert_eq!(snapshot.error.as_deref(), Some("domain acme.com does not resolve"));
    assert_eq!(llm.calls(), 0);
    assert!(notifier.sent.lock().await.is_empty());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_synthesis_failure_keeps_signals() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let workflow = workflow(
        orchestrator(acme_probes(), Arc::new(FixedResolver(Resolution::Resolves))),
        Arc::new(MockLlmProvider::with_error(LlmError::auth("bad key"))),
        store.clone(),
        Arc::new(RecordingNotifier::default()),
    );

    let snapshot = workflow.execute(acme_run()).await.unwrap();

    assert_eq!(snapshot.status, SnapshotStatus::Failed);
    assert!(snapshot.signals.is_some());
    assert!(snapshot.report.is_none());
    assert!(
        snapshot
            .error
            .as_deref()
            .unwrap()
            .starts_with("report synthesis failed")
    );
}

#[tokio::test]
async fn test_run_budget_exceeded_marks_snapshot_failed() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let llm = Arc::new(MockLlmProvider::answering_all().delayed(Duration::from_secs(30)));
    let workflow = workflow(
        orchestrator(acme_probes(), Arc::new(FixedResolver(Resolution::Resolves))),
        llm,
        store.clone(),
        Arc::new(RecordingNotifier::default()),
    )
    .with_run_budget(Duration::from_millis(600));

    let snapshot = workflow.execute(acme_run()).await.unwrap();

    assert_eq!(snapshot.status, SnapshotStatus::Failed);
    assert!(snapshot.signals.is_some());
    assert!(
        snapshot.error.as_deref().unwrap().contains("exceeded"),
        "{:?}",
        snapshot.error
    );
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_notification_failure_does_not_undo_snapshot() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let notifier = Arc::new(FailingNotifier::default());
    let workflow = workflow(
        orchestrator(acme_probes(), Arc::new(FixedResolver(Resolution::Resolves))),
        Arc::new(MockLlmProvider::answering_all()),
        store.clone(),
        notifier.clone(),
    );

    let snapshot = workflow.execute(acme_run()).await.unwrap();

    assert_eq!(snapshot.status, SnapshotStatus::Completed);
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(store.all().await[0].id, snapshot.id);
}
