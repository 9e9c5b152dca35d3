//! Tick Command - run the re-snapshot scheduler once or continuously

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use itreality_core::Config;

use crate::app::App;
use crate::cli::exit_codes;
use crate::cli::output::{OutputFormat, OutputWriter};
use crate::workers::spawn_scheduler_worker;

#[derive(Args, Debug)]
pub struct TickArgs {
    /// Keep running, one tick per configured interval, until interrupted
    #[arg(long)]
    pub watch: bool,
}

pub async fn run(config: Config, output: &OutputWriter, args: &TickArgs) -> Result<i32> {
    let app = App::build(config).await?;

    if args.watch {
        if !app.config.scheduler.enabled {
            output.error("the scheduler is disabled (scheduler.enabled = false)");
            return Ok(exit_codes::CONFIG_ERROR);
        }

        let shutdown = CancellationToken::new();
        let worker =
            spawn_scheduler_worker(app.scheduler.clone(), &app.config.scheduler, shutdown.clone());

        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");
        shutdown.cancel();
        worker.await?;
        return Ok(exit_codes::SUCCESS);
    }

    let summary = app.scheduler.run_tick(Utc::now()).await;

    match output.format() {
        OutputFormat::Json => output.json(&summary)?,
        OutputFormat::Pretty => {
            output.header("Scheduler tick");
            output.line(format!("  subscribers          {}", summary.subscribers));
            output.line(format!("  domains checked      {}", summary.domains_checked));
            output.line(format!("  domains due          {}", summary.domains_due));
            output.line(format!("  snapshots completed  {}", summary.snapshots_completed));
            output.line(format!("  snapshots failed     {}", summary.snapshots_failed));
            for error in &summary.errors {
                output.error(error);
            }
        }
    }

    Ok(if summary.errors.is_empty() && summary.snapshots_failed == 0 {
        exit_codes::SUCCESS
    } else {
        exit_codes::PIPELINE_FAILED
    })
}
