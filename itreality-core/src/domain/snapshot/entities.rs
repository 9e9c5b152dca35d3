//! Snapshot entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{SnapshotId, SnapshotOwner, SnapshotStatus};
use crate::domain::report::Report;
use crate::domain::signals::{DomainName, SignalBundle};

/// Terminal result of a snapshot run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SnapshotOutcome {
    Completed {
        signals: SignalBundle,
        report: Report,
    },
    Failed {
        /// Absent when collection itself aborted
        signals: Option<SignalBundle>,
        error: String,
    },
}

impl SnapshotOutcome {
    pub fn status(&self) -> SnapshotStatus {
        match self {
            Self::Completed { .. } => SnapshotStatus::Completed,
            Self::Failed { .. } => SnapshotStatus::Failed,
        }
    }
}

/// Snapshot ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnapshot {
    pub domain: DomainName,
    pub owner: SnapshotOwner,
    pub outcome: SnapshotOutcome,
}

impl NewSnapshot {
    pub fn completed(
        domain: DomainName,
        owner: SnapshotOwner,
        signals: SignalBundle,
        report: Report,
    ) -> Self {
        Self {
            domain,
            owner,
            outcome: SnapshotOutcome::Completed { signals, report },
        }
    }

    pub fn failed(
        domain: DomainName,
        owner: SnapshotOwner,
        signals: Option<SignalBundle>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            domain,
            owner,
            outcome: SnapshotOutcome::Failed {
                signals,
                error: error.into(),
            },
        }
    }
}

/// Stored snapshot. Insert-only: never updated after creation.
///
/// A completed snapshot always carries both signals and a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub domain: DomainName,
    pub owner: SnapshotOwner,
    pub signals: Option<SignalBundle>,
    pub report: Option<Report>,
    pub status: SnapshotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn from_new(id: SnapshotId, created_at: DateTime<Utc>, new: NewSnapshot) -> Self {
        let status = new.outcome.status();
        let (signals, report, error) = match new.outcome {
            SnapshotOutcome::Completed { signals, report } => (Some(signals), Some(report), None),
            SnapshotOutcome::Failed { signals, error } => (signals, None, Some(error)),
        };
        Self {
            id,
            domain: new.domain,
            owner: new.owner,
            signals,
            report,
            status,
            error,
            created_at,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SnapshotStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::UserId;

    #[test]
    fn test_failed_snapshot_has_no_report() {
        let domain = DomainName::parse("acme.com").unwrap();
        let new = NewSnapshot::failed(
            domain.clone(),
            SnapshotOwner::User(UserId::generate()),
            None,
            "domain does not resolve",
        );
        let snapshot = Snapshot::from_new(SnapshotId::generate(), Utc::now(), new);

        assert_eq!(snapshot.status, SnapshotStatus::Failed);
        assert!(snapshot.report.is_none());
        assert!(snapshot.signals.is_none());
        assert_eq!(snapshot.error.as_deref(), Some("domain does not resolve"));
        assert!(!snapshot.is_completed());
    }
}
