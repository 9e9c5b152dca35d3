//! Application setup and wiring

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use itreality_core::Config;
use itreality_core::config::DatabaseConfig;
use itreality_llm::{ReportSynthesizer, build_provider};
use itreality_orchestrator::domain::{EntitlementPolicy, SnapshotStore, SubscriberDirectory};
use itreality_orchestrator::infrastructure::{
    InMemorySnapshotStore, InMemorySubscriberDirectory, ProbeRegistry, SqlxSnapshotStore,
    SqlxSubscriberDirectory, build_notifier,
};
use itreality_orchestrator::{
    SignalOrchestrator, SnapshotScheduler, SnapshotService, SnapshotWorkflow,
};
use itreality_probes::ProbeFactory;

/// Fully wired services
pub struct App {
    pub config: Arc<Config>,
    pub orchestrator: Arc<SignalOrchestrator>,
    pub synthesizer: Arc<ReportSynthesizer>,
    pub store: Arc<dyn SnapshotStore>,
    pub service: Arc<SnapshotService>,
    pub scheduler: Arc<SnapshotScheduler>,
}

/// Probes and orchestrator only; enough to collect signals without an LLM
pub fn build_orchestrator(config: &Config) -> anyhow::Result<Arc<SignalOrchestrator>> {
    let factory = ProbeFactory::from_config(&config.probes).context("Failed to set up probes")?;
    let registry = ProbeRegistry::with_probes(factory.probes());
    info!(
        probes = ?registry.registered_categories(),
        timeout_secs = config.probes.probe_timeout_seconds,
        "Probe registry ready"
    );

    Ok(Arc::new(SignalOrchestrator::from_config(
        Arc::new(registry),
        factory.domain_resolver(),
        &config.probes,
    )))
}

impl App {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let orchestrator = build_orchestrator(&config)?;

        let provider = build_provider(&config.llm).context("Failed to set up the LLM provider")?;
        let synthesizer = Arc::new(ReportSynthesizer::new(provider, config.llm.clone()));

        let (store, directory) = init_persistence(&config.database).await?;
        let notifier =
            build_notifier(&config.notifications).context("Failed to set up notifications")?;

        let workflow = SnapshotWorkflow::new(
            orchestrator.clone(),
            synthesizer.clone(),
            store.clone(),
            notifier,
            &config.orchestrator,
        );
        let service = Arc::new(SnapshotService::new(
            workflow.clone(),
            EntitlementPolicy::new(&config.entitlements),
        ));
        let scheduler = Arc::new(SnapshotScheduler::new(
            directory,
            workflow,
            &config.orchestrator,
            &config.scheduler,
        ));

        Ok(Self {
            config: Arc::new(config),
            orchestrator,
            synthesizer,
            store,
            service,
            scheduler,
        })
    }
}

async fn init_persistence(
    config: &DatabaseConfig,
) -> anyhow::Result<(Arc<dyn SnapshotStore>, Arc<dyn SubscriberDirectory>)> {
    if config.url.is_empty() {
        warn!("No database configured, snapshots are kept in memory for this process only");
        return Ok((
            Arc::new(InMemorySnapshotStore::new()),
            Arc::new(InMemorySubscriberDirectory::default()),
        ));
    }

    info!("Initializing PostgreSQL database pool");
    let pool = Arc::new(
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect(&config.url)
            .await
            .context("Failed to connect to PostgreSQL")?,
    );

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&*pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations applied");
    }

    Ok((
        Arc::new(SqlxSnapshotStore::new(pool.clone())),
        Arc::new(SqlxSubscriberDirectory::new(pool)),
    ))
}
