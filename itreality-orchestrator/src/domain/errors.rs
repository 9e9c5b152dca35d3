//! Orchestrator error types

use uuid::Uuid;

use itreality_core::domain::DomainName;

/// Fatal outcome of a collection run. Everything else is absorbed into
/// failed signal blocks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("domain {domain} does not resolve")]
    DomainUnresolvable { domain: DomainName },
}

/// Snapshot and subscriber persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Stored row {id} is invalid: {reason}")]
    Corrupt { id: Uuid, reason: String },
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Delivery failure reported by a [`super::Notifier`]
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
