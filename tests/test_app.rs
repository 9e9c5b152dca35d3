//! Application wiring without a database

use chrono::Utc;

use itreality::App;
use itreality_core::Config;
use itreality_core::domain::{DomainName, Email};
use itreality_orchestrator::domain::{SnapshotRequester, TickSummary};

fn offline_config() -> Config {
    let mut config = Config::default();
    config.database.url = String::new();
    config.llm.openai.api_key = Some("sk-test".to_string());
    config.notifications.webhook_url = None;
    config
}

#[tokio::test]
async fn test_builds_with_in_memory_persistence() {
    let app = App::build(offline_config()).await.unwrap();

    let requester = SnapshotRequester::anonymous(Email::new("owner@acme.com").unwrap());
    let domain = DomainName::parse("acme.com").unwrap();
    assert!(
        app.service
            .check_entitlement(&requester, &domain, Utc::now())
            .await
            .is_ok()
    );
    assert!(
        app.store
            .snapshots_by_owner(&requester.owner)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_tick_without_subscribers_does_nothing() {
    let app = App::build(offline_config()).await.unwrap();
    let summary = app.scheduler.run_tick(Utc::now()).await;
    assert_eq!(summary, TickSummary::default());
}

#[tokio::test]
async fn test_orchestrator_uses_configured_probe_timeout() {
    let mut config = offline_config();
    config.probes.probe_timeout_seconds = 7;
    let app = App::build(config).await.unwrap();
    assert_eq!(app.orchestrator.probe_timeout().as_secs(), 7);
}
