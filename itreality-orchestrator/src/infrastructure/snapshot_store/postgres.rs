use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use itreality_core::domain::{
    DomainName, EmailHash, NewSnapshot, Report, SignalBundle, Snapshot, SnapshotId, SnapshotOwner,
    SnapshotOutcome, SnapshotStatus, UserId,
};

use crate::domain::{SnapshotStore, StoreError};

/// PostgreSQL snapshot store; signals and report are stored as JSONB
pub struct SqlxSnapshotStore {
    pool: Arc<PgPool>,
}

impl SqlxSnapshotStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    id: Uuid,
    domain: String,
    owner_kind: String,
    owner_key: String,
    status: String,
    signals: Option<serde_json::Value>,
    report: Option<serde_json::Value>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SnapshotRow> for Snapshot {
    type Error = StoreError;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt { id: row.id, reason };

        let domain = DomainName::parse(&row.domain).map_err(|e| corrupt(e.to_string()))?;
        let owner = match row.owner_kind.as_str() {
            "user" => Uuid::parse_str(&row.owner_key)
                .map(|id| SnapshotOwner::User(UserId::new(id)))
                .map_err(|e| corrupt(format!("owner key: {e}")))?,
            "email_hash" => SnapshotOwner::EmailHash(EmailHash::from_hex(row.owner_key.clone())),
            other => return Err(corrupt(format!("unknown owner kind {other:?}"))),
        };
        let status: SnapshotStatus = row.status.parse().map_err(corrupt)?;
        let signals: Option<SignalBundle> = row
            .signals
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| corrupt(format!("signals: {e}")))?;
        let report: Option<Report> = row
            .report
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| corrupt(format!("report: {e}")))?;

        if status == SnapshotStatus::Completed && (signals.is_none() || report.is_none()) {
            return Err(corrupt("completed snapshot without signals and report".into()));
        }

        Ok(Snapshot {
            id: SnapshotId(row.id),
            domain,
            owner,
            signals,
            report,
            status,
            error: row.error_message,
            created_at: row.created_at,
        })
    }
}

/// Converts history rows, skipping rows that no longer decode
fn into_history(rows: Vec<SnapshotRow>) -> Vec<Snapshot> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            Snapshot::try_from(row)
                .inspect_err(|e| {
                    tracing::warn!(snapshot_id = %id, error = %e, "Skipping corrupt snapshot row");
                })
                .ok()
        })
        .collect()
}

fn database_error(err: sqlx::Error) -> StoreError {
    tracing::error!("Database error: {}", err);
    StoreError::Database(err.to_string())
}

#[async_trait]
impl SnapshotStore for SqlxSnapshotStore {
    async fn insert_snapshot(&self, snapshot: NewSnapshot) -> Result<Snapshot, StoreError> {
        let id = SnapshotId::generate();
        let status = snapshot.outcome.status();
        let (signals, report, error_message) = match &snapshot.outcome {
            SnapshotOutcome::Completed { signals, report } => (
                Some(serde_json::to_value(signals)?),
                Some(serde_json::to_value(report)?),
                None,
            ),
            SnapshotOutcome::Failed { signals, error } => (
                signals.as_ref().map(serde_json::to_value).transpose()?,
                None,
                Some(error.clone()),
            ),
        };

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO snapshots (
                id, domain, owner_kind, owner_key, status, signals, report, error_message
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(snapshot.domain.as_str())
        .bind(snapshot.owner.kind())
        .bind(snapshot.owner.key())
        .bind(status.as_str())
        .bind(signals)
        .bind(report)
        .bind(error_message)
        .fetch_one(&*self.pool)
        .await
        .map_err(database_error)?;

        tracing::info!(
            snapshot_id = %id,
            domain = %snapshot.domain,
            status = %status,
            "Snapshot inserted"
        );

        Ok(Snapshot::from_new(id, created_at, snapshot))
    }

    async fn snapshots_by_owner(&self, owner: &SnapshotOwner) -> Result<Vec<Snapshot>, StoreError> {
        let rows: Vec<SnapshotRow> = sqlx::query_as(
            r#"
            SELECT id, domain, owner_kind, owner_key, status, signals, report, error_message, created_at
            FROM snapshots
            WHERE owner_kind = $1 AND owner_key = $2
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(owner.kind())
        .bind(owner.key())
        .fetch_all(&*self.pool)
        .await
        .map_err(database_error)?;

        Ok(into_history(rows))
    }
}
