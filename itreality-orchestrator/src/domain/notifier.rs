//! Snapshot-ready notification interface

use async_trait::async_trait;
use serde::Serialize;

use itreality_core::domain::{DomainName, Email, SnapshotId};

use super::errors::NotificationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotReadyNotification {
    pub email: Email,
    pub domain: DomainName,
    pub snapshot_id: SnapshotId,
}

/// Tells an owner that a new snapshot is available.
///
/// Delivery is best-effort: callers log failures and carry on, a stored
/// snapshot is never undone because the owner could not be reached.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_snapshot_ready(
        &self,
        notification: &SnapshotReadyNotification,
    ) -> Result<(), NotificationError>;
}
