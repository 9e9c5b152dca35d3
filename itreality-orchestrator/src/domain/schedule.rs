//! Freshness of tracked domains
//!
//! A domain's current state is defined by its most recent *completed*
//! snapshot. Failed runs never reset the clock, so a domain whose last run
//! failed stays due and the next tick retries it.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use itreality_core::domain::{DomainName, Snapshot, SnapshotId};

use super::value_objects::ScheduleState;

/// Days between scheduled snapshots of the same domain
pub const SNAPSHOT_INTERVAL_DAYS: i64 = 30;

/// Derived per (owner, domain) pair; never stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriberScheduleEntry {
    pub domain: DomainName,
    pub last_snapshot_id: Option<SnapshotId>,
    pub last_snapshot_at: Option<DateTime<Utc>>,
    /// Whole days since the last completed snapshot
    pub days_since: Option<i64>,
    pub next_eligible_at: Option<DateTime<Utc>>,
    pub state: ScheduleState,
}

impl SubscriberScheduleEntry {
    pub fn is_due(&self) -> bool {
        self.state == ScheduleState::Due
    }
}

/// Whole days elapsed between `from` and `now`, rounded down
pub fn days_between(from: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - from).num_days().max(0)
}

/// Schedule state for every domain in `snapshots`, sorted by domain
pub fn compute_schedule(snapshots: &[Snapshot], now: DateTime<Utc>) -> Vec<SubscriberScheduleEntry> {
    compute_schedule_with_interval(snapshots, now, SNAPSHOT_INTERVAL_DAYS)
}

pub fn compute_schedule_with_interval(
    snapshots: &[Snapshot],
    now: DateTime<Utc>,
    interval_days: i64,
) -> Vec<SubscriberScheduleEntry> {
    let mut latest: BTreeMap<&DomainName, Option<&Snapshot>> = BTreeMap::new();
    for snapshot in snapshots {
        let slot = latest.entry(&snapshot.domain).or_insert(None);
        if snapshot.is_completed() && slot.is_none_or(|current| snapshot.created_at > current.created_at)
        {
            *slot = Some(snapshot);
        }
    }

    latest
        .into_iter()
        .map(|(domain, last)| match last {
            Some(snapshot) => {
                let days_since = days_between(snapshot.created_at, now);
                let state = if days_since >= interval_days {
                    ScheduleState::Due
                } else {
                    ScheduleState::Fresh
                };
                SubscriberScheduleEntry {
                    domain: domain.clone(),
                    last_snapshot_id: Some(snapshot.id),
                    last_snapshot_at: Some(snapshot.created_at),
                    days_since: Some(days_since),
                    next_eligible_at: Some(snapshot.created_at + Duration::days(interval_days)),
                    state,
                }
            }
            None => SubscriberScheduleEntry {
                domain: domain.clone(),
                last_snapshot_id: None,
                last_snapshot_at: None,
                days_since: None,
                next_eligible_at: None,
                state: ScheduleState::Due,
            },
        })
        .collect()
}
