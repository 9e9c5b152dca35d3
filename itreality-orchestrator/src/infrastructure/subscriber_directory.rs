//! Subscriber directory backends

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use itreality_core::domain::{Email, Subscriber, SubscriptionTier, UserId};

use crate::domain::{StoreError, SubscriberDirectory};

/// Fixed subscriber list for development and tests
#[derive(Debug, Default, Clone)]
pub struct InMemorySubscriberDirectory {
    subscribers: Vec<Subscriber>,
}

impl InMemorySubscriberDirectory {
    pub fn new(subscribers: Vec<Subscriber>) -> Self {
        Self { subscribers }
    }
}

#[async_trait]
impl SubscriberDirectory for InMemorySubscriberDirectory {
    async fn active_basic_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self
            .subscribers
            .iter()
            .filter(|s| s.tier == SubscriptionTier::Basic)
            .cloned()
            .collect())
    }
}

/// Reads active paid subscriptions from PostgreSQL
pub struct SqlxSubscriberDirectory {
    pool: Arc<PgPool>,
}

impl SqlxSubscriberDirectory {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: Uuid,
    auth_user_id: Uuid,
    email: String,
}

#[async_trait]
impl SubscriberDirectory for SqlxSubscriberDirectory {
    async fn active_basic_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        let rows: Vec<SubscriberRow> = sqlx::query_as(
            r#"
            SELECT id, auth_user_id, email
            FROM subscribers
            WHERE tier = 'basic' AND active
            ORDER BY created_at
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error listing subscribers: {}", e);
            StoreError::Database(e.to_string())
        })?;

        let mut subscribers = Vec::with_capacity(rows.len());
        for row in rows {
            // Malformed addresses are skipped, not fatal
            match Email::new(row.email) {
                Ok(email) => subscribers.push(Subscriber {
                    id: row.id,
                    auth_user_id: UserId::new(row.auth_user_id),
                    email,
                    tier: SubscriptionTier::Basic,
                }),
                Err(reason) => {
                    tracing::warn!(subscriber_id = %row.id, %reason, "Skipping subscriber with invalid email");
                }
            }
        }
        Ok(subscribers)
    }
}
