//! Snapshot-ready notification delivery

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{info, warn};

use itreality_core::config::NotificationsConfig;

use crate::domain::{NotificationError, Notifier, SnapshotReadyNotification};

type HmacSha256 = Hmac<Sha256>;

pub const EVENT_SNAPSHOT_READY: &str = "snapshot.ready";

/// Writes notifications to the log; used when no webhook is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_snapshot_ready(
        &self,
        notification: &SnapshotReadyNotification,
    ) -> Result<(), NotificationError> {
        info!(
            email = %notification.email.as_str(),
            domain = %notification.domain,
            snapshot_id = %notification.snapshot_id,
            "Snapshot ready"
        );
        Ok(())
    }
}

#[derive(serde::Serialize)]
struct WebhookPayload<'a> {
    event: &'static str,
    #[serde(flatten)]
    notification: &'a SnapshotReadyNotification,
    sent_at: String,
}

/// Posts notifications to a webhook with an optional HMAC-SHA256 signature.
///
/// # Headers
/// - `Content-Type: application/json`
/// - `X-ITReality-Event: snapshot.ready`
/// - `X-ITReality-Timestamp: <unix_timestamp>`
/// - `X-ITReality-Signature: sha256=<hex_signature>` (when a secret is configured)
///
/// The signature is computed as: HMAC-SHA256(timestamp + "." + payload_json, secret)
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    secret: Option<String>,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl WebhookNotifier {
    pub fn new(
        url: impl Into<String>,
        secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            secret,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_backoff = backoff;
        self
    }

    /// `sha256=<hex>` over `"{timestamp}.{payload}"`
    pub fn sign(secret: &str, timestamp: i64, payload_json: &str) -> Option<String> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(format!("{}.{}", timestamp, payload_json).as_bytes());
        Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_snapshot_ready(
        &self,
        notification: &SnapshotReadyNotification,
    ) -> Result<(), NotificationError> {
        let snapshot_id = notification.snapshot_id;
        let timestamp = Utc::now().timestamp();
        let payload_json = serde_json::to_string(&WebhookPayload {
            event: EVENT_SNAPSHOT_READY,
            notification,
            sent_at: Utc::now().to_rfc3339(),
        })
        .map_err(|e| NotificationError::Serialization(e.to_string()))?;

        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("X-ITReality-Event", EVENT_SNAPSHOT_READY)
            .header("X-ITReality-Timestamp", timestamp.to_string());

        if let Some(secret) = self.secret.as_deref() {
            match Self::sign(secret, timestamp, &payload_json) {
                Some(signature) => request = request.header("X-ITReality-Signature", signature),
                None => warn!(%snapshot_id, "Failed to create HMAC for webhook signature"),
            }
        }

        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            let Some(attempt_request) = request.try_clone() else {
                return Err(NotificationError::Delivery(
                    "webhook request could not be cloned".to_string(),
                ));
            };

            match attempt_request.body(payload_json.clone()).send().await {
                Ok(response) if response.status().is_success() => {
                    info!(%snapshot_id, status = %response.status(), "Webhook delivered");
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    last_error = format!("HTTP {}: {}", status, body);
                    warn!(%snapshot_id, %status, attempt, "Webhook returned non-success status");
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(%snapshot_id, error = %e, attempt, "Webhook request failed");
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.retry_backoff * (1 << (attempt - 1))).await;
            }
        }

        Err(NotificationError::Delivery(format!(
            "gave up after {} attempts: {}",
            self.max_attempts, last_error
        )))
    }
}

/// Webhook notifier when a URL is configured, log notifier otherwise
pub fn build_notifier(config: &NotificationsConfig) -> Result<Arc<dyn Notifier>, NotificationError> {
    match config.webhook_url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => {
            info!(url, "Using webhook notifier");
            Ok(Arc::new(WebhookNotifier::new(
                url,
                config.webhook_secret.clone(),
                Duration::from_secs(config.timeout_seconds),
            )?))
        }
        None => {
            info!("No webhook configured, notifications will be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}
