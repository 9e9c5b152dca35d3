use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use itreality_core::domain::{NewSnapshot, Snapshot, SnapshotId, SnapshotOwner};

use crate::domain::{SnapshotStore, StoreError};

/// Process-local snapshot store for development and tests
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<Vec<Snapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing history
    pub fn with_snapshots(snapshots: Vec<Snapshot>) -> Self {
        Self {
            snapshots: RwLock::new(snapshots),
        }
    }

    pub async fn all(&self) -> Vec<Snapshot> {
        self.snapshots.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn insert_snapshot(&self, snapshot: NewSnapshot) -> Result<Snapshot, StoreError> {
        let stored = Snapshot::from_new(SnapshotId::generate(), Utc::now(), snapshot);
        self.snapshots.write().await.push(stored.clone());

        tracing::debug!(
            snapshot_id = %stored.id,
            domain = %stored.domain,
            status = %stored.status,
            "Snapshot stored in memory"
        );
        Ok(stored)
    }

    async fn snapshots_by_owner(&self, owner: &SnapshotOwner) -> Result<Vec<Snapshot>, StoreError> {
        let mut owned: Vec<Snapshot> = self
            .snapshots
            .read()
            .await
            .iter()
            .filter(|snapshot| &snapshot.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}
