//! Schedule Command - when each of a subscriber's domains is next due

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use uuid::Uuid;

use itreality_core::Config;
use itreality_core::domain::{Email, Subscriber, SubscriptionTier, UserId};

use crate::app::App;
use crate::cli::exit_codes;
use crate::cli::output::{OutputFormat, OutputWriter};

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Authenticated user id of the subscriber
    #[arg(long)]
    pub user_id: Uuid,

    /// Subscriber email
    #[arg(long)]
    pub email: String,
}

pub async fn run(config: Config, output: &OutputWriter, args: &ScheduleArgs) -> Result<i32> {
    let email = match Email::new(args.email.as_str()) {
        Ok(email) => email,
        Err(e) => {
            output.error(format!("invalid email: {e}"));
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    let subscriber = Subscriber {
        id: Uuid::new_v4(),
        auth_user_id: UserId::new(args.user_id),
        email,
        tier: SubscriptionTier::Basic,
    };

    let app = App::build(config).await?;
    let schedule = match app.scheduler.schedule_for(&subscriber, Utc::now()).await {
        Ok(schedule) => schedule,
        Err(e) => {
            output.error(format!("could not load snapshot history: {e}"));
            return Ok(exit_codes::INTERNAL_ERROR);
        }
    };

    match output.format() {
        OutputFormat::Json => output.json(&schedule)?,
        OutputFormat::Pretty => {
            output.header(&format!("Schedule for {}", subscriber.email));
            if schedule.is_empty() {
                output.line("  no snapshots yet");
            }
            for entry in &schedule {
                let last = entry
                    .days_since
                    .map(|days| format!("last snapshot {days} day(s) ago"))
                    .unwrap_or_else(|| "never completed".to_string());
                let next = entry
                    .next_eligible_at
                    .map(|at| format!(", next on {}", at.date_naive()))
                    .unwrap_or_default();
                output.line(format!(
                    "  {:<30} {:<6} {last}{next}",
                    entry.domain.as_str(),
                    entry.state.to_string()
                ));
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}
