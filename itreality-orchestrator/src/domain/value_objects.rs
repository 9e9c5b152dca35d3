//! Orchestrator value objects

use serde::{Deserialize, Serialize};
use std::fmt;

use itreality_core::domain::{
    Email, SnapshotOwner, SnapshotStatus, Subscriber, SubscriptionTier, UserId,
};

/// Whether a tracked domain needs a new snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleState {
    /// Last completed snapshot is younger than the interval
    Fresh,
    /// Never completed, or the interval has elapsed
    Due,
}

impl fmt::Display for ScheduleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => write!(f, "fresh"),
            Self::Due => write!(f, "due"),
        }
    }
}

/// Who asked for a snapshot, and under which plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRequester {
    pub owner: SnapshotOwner,
    pub tier: SubscriptionTier,
    /// Where to send the "snapshot ready" notification
    pub email: Option<Email>,
}

impl SnapshotRequester {
    pub fn user(user_id: UserId, tier: SubscriptionTier, email: Option<Email>) -> Self {
        Self {
            owner: SnapshotOwner::User(user_id),
            tier,
            email,
        }
    }

    pub fn subscriber(subscriber: &Subscriber) -> Self {
        Self::user(
            subscriber.auth_user_id,
            subscriber.tier,
            Some(subscriber.email.clone()),
        )
    }

    /// Requester without an account; always on the free tier
    pub fn anonymous(email: Email) -> Self {
        Self {
            owner: SnapshotOwner::for_email(&email),
            tier: SubscriptionTier::Free,
            email: Some(email),
        }
    }
}

/// Recorded state transition for a snapshot run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTransition {
    pub from: SnapshotStatus,
    pub to: SnapshotStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Error returned when an invalid status transition is attempted.
#[derive(Debug, thiserror::Error)]
#[error("Invalid snapshot transition from {from} to {to}")]
pub struct SnapshotTransitionError {
    pub from: SnapshotStatus,
    pub to: SnapshotStatus,
}
