//! Background workers

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use itreality_core::config::SchedulerConfig;
use itreality_orchestrator::SnapshotScheduler;

/// Spawn the periodic re-snapshot worker.
///
/// Each interval runs one scheduler tick; the worker exits when
/// `shutdown_token` is cancelled, after any tick in progress finishes.
pub fn spawn_scheduler_worker(
    scheduler: Arc<SnapshotScheduler>,
    config: &SchedulerConfig,
    shutdown_token: CancellationToken,
) -> JoinHandle<()> {
    let interval_hours = config.interval_hours;
    let run_on_startup = config.run_on_startup;

    tokio::spawn(async move {
        info!(interval_hours, run_on_startup, "Snapshot scheduler worker started");

        let mut interval = tokio::time::interval(Duration::from_secs(interval_hours * 3600));
        // The first tick fires immediately
        if !run_on_startup {
            interval.tick().await;
        }

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let summary = scheduler.run_tick(Utc::now()).await;
                    if !summary.errors.is_empty() {
                        warn!(errors = summary.errors.len(), "Scheduler tick finished with errors");
                    }
                }
                _ = shutdown_token.cancelled() => {
                    info!("Snapshot scheduler worker shutting down");
                    break;
                }
            }
        }
    })
}
