//! Persistence interfaces

use async_trait::async_trait;

use itreality_core::domain::{NewSnapshot, Snapshot, SnapshotOwner, Subscriber};

use super::errors::StoreError;

/// Insert-only snapshot history
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist a finished run and return it with its id and timestamp.
    /// Stored snapshots are never updated.
    async fn insert_snapshot(&self, snapshot: NewSnapshot) -> Result<Snapshot, StoreError>;

    /// Every snapshot for `owner`, newest first
    async fn snapshots_by_owner(&self, owner: &SnapshotOwner) -> Result<Vec<Snapshot>, StoreError>;
}

/// Source of accounts enrolled in scheduled re-snapshots
#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    async fn active_basic_subscribers(&self) -> Result<Vec<Subscriber>, StoreError>;
}
