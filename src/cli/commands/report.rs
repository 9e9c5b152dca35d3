//! Report Command - collect signals and generate a report without storing it

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::time::timeout;

use itreality_core::Config;
use itreality_core::domain::{Report, SignalBundle};
use itreality_llm::{ReportSynthesizer, build_provider};

use super::parse_domain;
use crate::app::build_orchestrator;
use crate::cli::exit_codes;
use crate::cli::output::{OutputFormat, OutputWriter};

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Domain to report on
    pub domain: String,

    /// Contact address passed to third-party data sources
    #[arg(long)]
    pub contact_email: Option<String>,

    /// Link to the full report (defaults to orchestrator.context_url)
    #[arg(long)]
    pub context_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReportOutput<'a> {
    signals: &'a SignalBundle,
    report: &'a Report,
}

pub async fn run(config: Config, output: &OutputWriter, args: &ReportArgs) -> Result<i32> {
    let Some(domain) = parse_domain(output, &args.domain) else {
        return Ok(exit_codes::CONFIG_ERROR);
    };

    let orchestrator = build_orchestrator(&config)?;
    let provider = build_provider(&config.llm).context("Failed to set up the LLM provider")?;
    let synthesizer = ReportSynthesizer::new(provider, config.llm.clone());
    let context_url = args
        .context_url
        .clone()
        .unwrap_or_else(|| config.orchestrator.context_url.clone());
    let context_url = Some(context_url.as_str()).filter(|url| !url.is_empty());

    let budget = config.orchestrator.run_budget();
    let pipeline = async {
        let bundle = orchestrator
            .collect_all_signals(&domain, args.contact_email.as_deref())
            .await
            .map_err(|e| e.to_string())?;
        let report = synthesizer
            .generate_report(&domain, &bundle, context_url)
            .await
            .map_err(|e| format!("report synthesis failed: {e}"))?;
        Ok::<_, String>((bundle, report))
    };

    let (bundle, report) = match timeout(budget, pipeline).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            output.error(e);
            return Ok(exit_codes::PIPELINE_FAILED);
        }
        Err(_) => {
            output.error(format!(
                "report run exceeded its {}s budget",
                budget.as_secs()
            ));
            return Ok(exit_codes::PIPELINE_FAILED);
        }
    };

    match output.format() {
        OutputFormat::Json => output.json(&ReportOutput {
            signals: &bundle,
            report: &report,
        })?,
        OutputFormat::Pretty => {
            output.signals(&bundle);
            output.report(&report);
        }
    }

    Ok(exit_codes::SUCCESS)
}
