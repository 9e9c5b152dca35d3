//! Orchestrator entities

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use itreality_core::domain::{DomainName, Email, SnapshotOwner, SnapshotStatus};

use super::value_objects::{RunTransition, SnapshotRequester, SnapshotTransitionError};

/// One collection + synthesis + persist cycle for a domain, tracked in
/// memory until it reaches a terminal state and is stored.
#[derive(Debug, Clone)]
pub struct SnapshotRun {
    pub run_id: Uuid,
    pub domain: DomainName,
    pub owner: SnapshotOwner,
    /// Contact address handed to third-party data sources
    pub contact_email: Option<String>,
    /// Recipient of the "snapshot ready" notification
    pub notify: Option<Email>,
    pub status: SnapshotStatus,
    pub started_at: DateTime<Utc>,
    pub transitions: Vec<RunTransition>,
}

impl SnapshotRun {
    pub fn new(domain: DomainName, owner: SnapshotOwner) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            domain,
            owner,
            contact_email: None,
            notify: None,
            status: SnapshotStatus::Pending,
            started_at: Utc::now(),
            transitions: Vec::new(),
        }
    }

    pub fn for_requester(
        domain: DomainName,
        requester: &SnapshotRequester,
        contact_email: Option<String>,
    ) -> Self {
        let mut run = Self::new(domain, requester.owner.clone());
        run.contact_email =
            contact_email.or_else(|| requester.email.as_ref().map(|e| e.as_str().to_string()));
        run.notify = requester.email.clone();
        run
    }

    pub fn with_contact_email(mut self, email: impl Into<String>) -> Self {
        self.contact_email = Some(email.into());
        self
    }

    /// Move to `to`, recording the transition. Terminal states are final.
    pub fn transition(
        &mut self,
        to: SnapshotStatus,
        reason: Option<String>,
    ) -> Result<(), SnapshotTransitionError> {
        if !self.status.can_transition_to(&to) {
            return Err(SnapshotTransitionError {
                from: self.status,
                to,
            });
        }
        self.transitions.push(RunTransition {
            from: self.status,
            to,
            timestamp: Utc::now(),
            reason,
        });
        self.status = to;
        Ok(())
    }
}

/// Counts reported by one scheduler tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub subscribers: usize,
    pub domains_checked: usize,
    pub domains_due: usize,
    pub snapshots_completed: usize,
    pub snapshots_failed: usize,
    /// Infrastructure errors that skipped a subscriber or domain
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use itreality_core::domain::UserId;

    fn run() -> SnapshotRun {
        SnapshotRun::new(
            DomainName::parse("acme.com").unwrap(),
            SnapshotOwner::User(UserId::generate()),
        )
    }

    #[test]
    fn test_run_records_transitions() {
        let mut run = run();
        run.transition(SnapshotStatus::Completed, Some("report ready".into()))
            .unwrap();

        assert_eq!(run.status, SnapshotStatus::Completed);
        assert_eq!(run.transitions.len(), 1);
        assert_eq!(run.transitions[0].from, SnapshotStatus::Pending);
    }

    #[test]
    fn test_terminal_run_rejects_transition() {
        let mut run = run();
        run.transition(SnapshotStatus::Failed, None).unwrap();

        let err = run.transition(SnapshotStatus::Completed, None).unwrap_err();
        assert_eq!(err.from, SnapshotStatus::Failed);
        assert_eq!(run.status, SnapshotStatus::Failed);
    }

    #[test]
    fn test_requester_email_is_default_contact() {
        let email = Email::new("owner@acme.com").unwrap();
        let requester = SnapshotRequester::anonymous(email.clone());
        let run = SnapshotRun::for_requester(
            DomainName::parse("acme.com").unwrap(),
            &requester,
            None,
        );

        assert_eq!(run.contact_email.as_deref(), Some("owner@acme.com"));
        assert_eq!(run.notify, Some(email));
    }
}
