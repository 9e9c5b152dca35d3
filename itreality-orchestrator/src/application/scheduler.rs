//! Periodic re-snapshots for paid subscribers

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use itreality_core::config::{OrchestratorConfig, SchedulerConfig};
use itreality_core::domain::{DomainName, Subscriber};

use super::workflow::SnapshotWorkflow;
use crate::domain::{
    SnapshotRequester, SnapshotRun, StoreError, SubscriberDirectory, SubscriberScheduleEntry,
    TickSummary, compute_schedule_with_interval,
};

pub struct SnapshotScheduler {
    directory: Arc<dyn SubscriberDirectory>,
    workflow: SnapshotWorkflow,
    max_concurrent: usize,
    interval_days: i64,
}

impl SnapshotScheduler {
    pub fn new(
        directory: Arc<dyn SubscriberDirectory>,
        workflow: SnapshotWorkflow,
        orchestrator: &OrchestratorConfig,
        scheduler: &SchedulerConfig,
    ) -> Self {
        Self {
            directory,
            workflow,
            max_concurrent: orchestrator.max_concurrent_domains.max(1),
            interval_days: scheduler.snapshot_interval_days,
        }
    }

    /// Schedule state of every domain the subscriber has snapshotted
    pub async fn schedule_for(
        &self,
        subscriber: &Subscriber,
        now: DateTime<Utc>,
    ) -> Result<Vec<SubscriberScheduleEntry>, StoreError> {
        let owner = SnapshotRequester::subscriber(subscriber).owner;
        let history = self.workflow.store().snapshots_by_owner(&owner).await?;
        Ok(compute_schedule_with_interval(&history, now, self.interval_days))
    }

    /// One scheduling pass: snapshot every due domain of every active
    /// subscriber, at most `max_concurrent` at a time.
    ///
    /// A failure on one subscriber or domain is recorded in the summary and
    /// never stops the others.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> TickSummary {
        let mut summary = TickSummary::default();

        let subscribers = match self.directory.active_basic_subscribers().await {
            Ok(subscribers) => subscribers,
            Err(e) => {
                error!(error = %e, "Failed to list subscribers");
                summary.errors.push(format!("listing subscribers: {e}"));
                return summary;
            }
        };
        summary.subscribers = subscribers.len();

        let mut runs = Vec::new();
        for subscriber in &subscribers {
            let schedule = match self.schedule_for(subscriber, now).await {
                Ok(schedule) => schedule,
                Err(e) => {
                    warn!(subscriber_id = %subscriber.id, error = %e, "Failed to load snapshot history");
                    summary
                        .errors
                        .push(format!("subscriber {}: {e}", subscriber.id));
                    continue;
                }
            };

            summary.domains_checked += schedule.len();
            let requester = SnapshotRequester::subscriber(subscriber);
            for entry in schedule.into_iter().filter(SubscriberScheduleEntry::is_due) {
                runs.push(SnapshotRun::for_requester(entry.domain, &requester, None));
            }
        }
        summary.domains_due = runs.len();

        info!(
            subscribers = summary.subscribers,
            domains_checked = summary.domains_checked,
            domains_due = summary.domains_due,
            "Scheduler tick started"
        );

        let results: Vec<(DomainName, Result<bool, String>)> = stream::iter(runs)
            .map(|run| {
                let workflow = self.workflow.clone();
                let domain = run.domain.clone();
                async move {
                    let outcome = match tokio::spawn(async move { workflow.execute(run).await }).await
                    {
                        Ok(Ok(snapshot)) => Ok(snapshot.is_completed()),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(join_error) => Err(format!("snapshot task failed: {join_error}")),
                    };
                    (domain, outcome)
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        for (domain, outcome) in results {
            match outcome {
                Ok(true) => summary.snapshots_completed += 1,
                Ok(false) => summary.snapshots_failed += 1,
                Err(e) => {
                    error!(%domain, error = %e, "Scheduled snapshot could not be stored");
                    summary.errors.push(format!("{domain}: {e}"));
                }
            }
        }

        info!(
            completed = summary.snapshots_completed,
            failed = summary.snapshots_failed,
            errors = summary.errors.len(),
            "Scheduler tick finished"
        );
        summary
    }
}
