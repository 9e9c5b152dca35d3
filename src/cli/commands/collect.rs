//! Collect Command - gather signals for one domain

use anyhow::Result;
use clap::Args;
use tracing::info;

use itreality_core::Config;

use super::parse_domain;
use crate::app::build_orchestrator;
use crate::cli::exit_codes;
use crate::cli::output::{OutputFormat, OutputWriter};

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Domain to probe, e.g. acme.com
    pub domain: String,

    /// Contact address passed to third-party data sources
    #[arg(long)]
    pub contact_email: Option<String>,
}

pub async fn run(config: &Config, output: &OutputWriter, args: &CollectArgs) -> Result<i32> {
    let Some(domain) = parse_domain(output, &args.domain) else {
        return Ok(exit_codes::CONFIG_ERROR);
    };

    let orchestrator = build_orchestrator(config)?;
    info!(%domain, "Collecting signals");

    let bundle = match orchestrator
        .collect_all_signals(&domain, args.contact_email.as_deref())
        .await
    {
        Ok(bundle) => bundle,
        Err(e) => {
            output.error(e.to_string());
            return Ok(exit_codes::PIPELINE_FAILED);
        }
    };

    match output.format() {
        OutputFormat::Json => output.json(&bundle)?,
        OutputFormat::Pretty => output.signals(&bundle),
    }

    Ok(exit_codes::SUCCESS)
}
