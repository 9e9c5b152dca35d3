//! IT Reality CLI
//!
//! Subcommands map onto the pipeline stages: `collect` gathers signals only,
//! `report` adds the generated report, `snapshot` runs an entitlement-checked
//! on-demand snapshot, `schedule` shows when a subscriber's domains are due
//! and `tick` runs one scheduler pass (or keeps running with `--watch`).

mod commands;
mod output;

pub use output::{OutputFormat, OutputWriter};

use clap::{Parser, Subcommand};

use itreality_core::Config;

/// IT Reality - plain-language IT reports from public domain signals
#[derive(Parser, Debug)]
#[command(
    name = "itreality",
    version,
    about = "Point-in-time IT reality reports for a domain",
    long_about = "Collects publicly observable signals about a domain (DNS, email \
                  authentication, TLS, tech stack, exposure, breaches, subdomains) \
                  and turns them into a report a non-technical owner can act on."
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect signals for a domain without generating a report
    #[command(visible_alias = "c")]
    Collect(commands::collect::CollectArgs),

    /// Collect signals and generate a report, without storing anything
    #[command(visible_alias = "r")]
    Report(commands::report::ReportArgs),

    /// Request a stored snapshot, subject to plan entitlements
    #[command(visible_alias = "s")]
    Snapshot(commands::snapshot::SnapshotArgs),

    /// Show the re-snapshot schedule of a subscriber
    Schedule(commands::schedule::ScheduleArgs),

    /// Run the periodic re-snapshot scheduler
    Tick(commands::tick::TickArgs),
}

/// Dispatch a parsed command line; returns the process exit code
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<i32> {
    let output = OutputWriter::new(cli.format);

    match &cli.command {
        Commands::Collect(args) => commands::collect::run(&config, &output, args).await,
        Commands::Report(args) => commands::report::run(config, &output, args).await,
        Commands::Snapshot(args) => commands::snapshot::run(config, &output, args).await,
        Commands::Schedule(args) => commands::schedule::run(config, &output, args).await,
        Commands::Tick(args) => commands::tick::run(config, &output, args).await,
    }
}

/// Exit codes for scripting
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// The pipeline ran but produced no report (failed snapshot, unresolvable domain)
    pub const PIPELINE_FAILED: i32 = 1;
    /// Configuration or input error
    pub const CONFIG_ERROR: i32 = 2;
    /// The requester's plan does not allow the snapshot now
    pub const DENIED: i32 = 4;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = 99;
}
