//! Snapshot Workflow - one collection, synthesis and persist cycle.
//!
//! A [`SnapshotRun`] starts `Pending` in memory. The workflow runs signal
//! collection and report synthesis under a single wall-clock budget, moves
//! the run to `Completed` or `Failed`, inserts exactly one snapshot and then
//! notifies the owner on a best-effort basis.
//!
//! ```text
//! Caller            SnapshotWorkflow        Orchestrator   Synthesizer   Store   Notifier
//!   │                      │                     │              │          │        │
//!   ├─ execute(run) ──────►│── collect ─────────►│              │          │        │
//!   │                      │◄── SignalBundle ────┤              │          │        │
//!   │                      │── generate_report ────────────────►│          │        │
//!   │                      │◄── Report ─────────────────────────┤          │        │
//!   │                      │── insert_snapshot ───────────────────────────►│        │
//!   │                      │── send_snapshot_ready ───────────────────────────────►│
//!   │◄── Snapshot ─────────┤                     │              │          │        │
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tracing::{info, warn};

use itreality_core::config::OrchestratorConfig;
use itreality_core::domain::{NewSnapshot, Snapshot, SnapshotOutcome, SnapshotStatus};
use itreality_llm::ReportSynthesizer;

use super::signal_orchestrator::SignalOrchestrator;
use crate::domain::{
    Notifier, SnapshotReadyNotification, SnapshotRun, SnapshotStore, SnapshotTransitionError,
    StoreError,
};

/// Errors from the workflow layer.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Invalid state transition: {0}")]
    InvalidTransition(#[from] SnapshotTransitionError),

    #[error("Persistence error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct SnapshotWorkflow {
    orchestrator: Arc<SignalOrchestrator>,
    synthesizer: Arc<ReportSynthesizer>,
    store: Arc<dyn SnapshotStore>,
    notifier: Arc<dyn Notifier>,
    run_budget: Duration,
    context_url: Option<String>,
}

impl SnapshotWorkflow {
    pub fn new(
        orchestrator: Arc<SignalOrchestrator>,
        synthesizer: Arc<ReportSynthesizer>,
        store: Arc<dyn SnapshotStore>,
        notifier: Arc<dyn Notifier>,
        config: &OrchestratorConfig,
    ) -> Self {
        Self {
            orchestrator,
            synthesizer,
            store,
            notifier,
            run_budget: config.run_budget(),
            context_url: Some(config.context_url.clone()).filter(|url| !url.is_empty()),
        }
    }

    pub fn with_run_budget(mut self, run_budget: Duration) -> Self {
        self.run_budget = run_budget;
        self
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// Run the pipeline for `run`, persist the result and notify.
    ///
    /// A failed pipeline still yields `Ok` with a failed snapshot; only
    /// persistence errors are returned as `Err`.
    pub async fn execute(&self, mut run: SnapshotRun) -> Result<Snapshot, WorkflowError> {
        info!(
            run_id = %run.run_id,
            domain = %run.domain,
            owner = %run.owner,
            "Snapshot run started"
        );

        let outcome = self.produce(&run).await;
        match &outcome {
            SnapshotOutcome::Completed { report, .. } => run.transition(
                SnapshotStatus::Completed,
                Some(format!("{} top findings", report.top_findings.len())),
            )?,
            SnapshotOutcome::Failed { error, .. } => {
                run.transition(SnapshotStatus::Failed, Some(error.clone()))?
            }
        }

        let snapshot = self
            .store
            .insert_snapshot(NewSnapshot {
                domain: run.domain.clone(),
                owner: run.owner.clone(),
                outcome,
            })
            .await?;

        match &snapshot.error {
            None => info!(
                run_id = %run.run_id,
                snapshot_id = %snapshot.id,
                domain = %snapshot.domain,
                "Snapshot completed"
            ),
            Some(error) => warn!(
                run_id = %run.run_id,
                snapshot_id = %snapshot.id,
                domain = %snapshot.domain,
                %error,
                "Snapshot failed"
            ),
        }

        if snapshot.is_completed()
            && let Some(email) = run.notify.clone()
        {
            let notification = SnapshotReadyNotification {
                email,
                domain: snapshot.domain.clone(),
                snapshot_id: snapshot.id,
            };
            if let Err(e) = self.notifier.send_snapshot_ready(&notification).await {
                warn!(snapshot_id = %snapshot.id, error = %e, "Failed to send snapshot-ready notification");
            }
        }

        Ok(snapshot)
    }

    /// Collection then synthesis, sharing one deadline
    async fn produce(&self, run: &SnapshotRun) -> SnapshotOutcome {
        let deadline = Instant::now() + self.run_budget;
        let over_budget = || {
            format!(
                "snapshot run exceeded its {}s budget",
                self.run_budget.as_secs()
            )
        };

        let collection = self
            .orchestrator
            .collect_all_signals(&run.domain, run.contact_email.as_deref());
        let signals = match timeout_at(deadline, collection).await {
            Ok(Ok(signals)) => signals,
            Ok(Err(e)) => {
                return SnapshotOutcome::Failed {
                    signals: None,
                    error: e.to_string(),
                };
            }
            Err(_) => {
                return SnapshotOutcome::Failed {
                    signals: None,
                    error: over_budget(),
                };
            }
        };

        let synthesis =
            self.synthesizer
                .generate_report(&run.domain, &signals, self.context_url.as_deref());
        let synthesized = timeout_at(deadline, synthesis).await;
        match synthesized {
            Ok(Ok(report)) => SnapshotOutcome::Completed { signals, report },
            Ok(Err(e)) => SnapshotOutcome::Failed {
                signals: Some(signals),
                error: format!("report synthesis failed: {e}"),
            },
            Err(_) => SnapshotOutcome::Failed {
                signals: Some(signals),
                error: over_budget(),
            },
        }
    }
}
