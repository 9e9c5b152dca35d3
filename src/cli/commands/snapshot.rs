//! Snapshot Command - on-demand snapshot subject to plan entitlements

use anyhow::Result;
use clap::Args;
use serde_json::json;
use uuid::Uuid;

use itreality_core::Config;
use itreality_core::domain::{Email, SnapshotStatus, SubscriptionTier, UserId};
use itreality_orchestrator::SnapshotRequestError;
use itreality_orchestrator::domain::SnapshotRequester;

use super::parse_domain;
use crate::app::App;
use crate::cli::exit_codes;
use crate::cli::output::{OutputFormat, OutputWriter};

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Domain to snapshot
    pub domain: String,

    /// Requester email; receives the "snapshot ready" notification
    #[arg(long)]
    pub email: String,

    /// Requester plan (free or basic)
    #[arg(long, default_value = "free")]
    pub tier: SubscriptionTier,

    /// Authenticated user id; required for the basic plan
    #[arg(long)]
    pub user_id: Option<Uuid>,

    /// Contact address passed to third-party data sources (defaults to --email)
    #[arg(long)]
    pub contact_email: Option<String>,
}

pub async fn run(config: Config, output: &OutputWriter, args: &SnapshotArgs) -> Result<i32> {
    let Some(domain) = parse_domain(output, &args.domain) else {
        return Ok(exit_codes::CONFIG_ERROR);
    };
    let email = match Email::new(args.email.as_str()) {
        Ok(email) => email,
        Err(e) => {
            output.error(format!("invalid email: {e}"));
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    let requester = match (args.user_id, args.tier) {
        (Some(id), tier) => SnapshotRequester::user(UserId::new(id), tier, Some(email)),
        (None, SubscriptionTier::Free) => SnapshotRequester::anonymous(email),
        (None, SubscriptionTier::Basic) => {
            output.error("the basic plan requires --user-id");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let app = App::build(config).await?;

    match app
        .service
        .request_snapshot(&requester, &domain, args.contact_email.as_deref())
        .await
    {
        Ok(snapshot) => {
            match output.format() {
                OutputFormat::Json => output.json(&snapshot)?,
                OutputFormat::Pretty => {
                    output.header(&format!("Snapshot {} ({})", snapshot.id, snapshot.status));
                    if let Some(signals) = &snapshot.signals {
                        output.signals(signals);
                    }
                    if let Some(report) = &snapshot.report {
                        output.report(report);
                    }
                    if let Some(error) = &snapshot.error {
                        output.error(error);
                    }
                }
            }
            Ok(match snapshot.status {
                SnapshotStatus::Completed => exit_codes::SUCCESS,
                _ => exit_codes::PIPELINE_FAILED,
            })
        }
        Err(SnapshotRequestError::Denied(denial)) => {
            match output.format() {
                OutputFormat::Json => output.json(&json!({ "denied": denial }))?,
                OutputFormat::Pretty => output.error(format!("request denied: {denial}")),
            }
            Ok(exit_codes::DENIED)
        }
        Err(e) => {
            output.error(e.to_string());
            Ok(exit_codes::INTERNAL_ERROR)
        }
    }
}
