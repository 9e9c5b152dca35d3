//! Snapshot value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::subscription::{Email, EmailHash, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub Uuid);

impl SnapshotId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a snapshot belongs to: an account, or an anonymous requester keyed by
/// the hash of their email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SnapshotOwner {
    User(UserId),
    EmailHash(EmailHash),
}

impl SnapshotOwner {
    pub fn for_email(email: &Email) -> Self {
        Self::EmailHash(email.hash())
    }

    /// Discriminator persisted alongside [`SnapshotOwner::key`]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::EmailHash(_) => "email_hash",
        }
    }

    pub fn key(&self) -> String {
        match self {
            Self::User(id) => id.to_string(),
            Self::EmailHash(hash) => hash.to_string(),
        }
    }
}

impl fmt::Display for SnapshotOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.key())
    }
}

/// Snapshot status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    /// Collection or synthesis still running
    Pending,
    /// Signals collected and a validated report attached
    Completed,
    /// Run aborted; the error explains why
    Failed,
}

impl SnapshotStatus {
    /// ```text
    /// Pending ──► Completed
    ///    └──────► Failed
    /// ```
    pub fn valid_transitions(&self) -> &[SnapshotStatus] {
        match self {
            Self::Pending => &[Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => &[],
        }
    }

    pub fn can_transition_to(&self, target: &SnapshotStatus) -> bool {
        self.valid_transitions().contains(target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("Unknown snapshot status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(SnapshotStatus::Pending.can_transition_to(&SnapshotStatus::Completed));
        assert!(SnapshotStatus::Pending.can_transition_to(&SnapshotStatus::Failed));
        assert!(!SnapshotStatus::Completed.can_transition_to(&SnapshotStatus::Failed));
        assert!(!SnapshotStatus::Failed.can_transition_to(&SnapshotStatus::Pending));
        assert!(SnapshotStatus::Failed.is_terminal());
        assert!(!SnapshotStatus::Pending.is_terminal());
    }

    #[test]
    fn test_owner_key() {
        let email = Email::new("owner@acme.com").unwrap();
        let owner = SnapshotOwner::for_email(&email);
        assert_eq!(owner.kind(), "email_hash");
        assert_eq!(owner.key(), email.hash().to_string());

        let json = serde_json::to_value(&owner).unwrap();
        assert_eq!(json["kind"], "email_hash");
    }
}
