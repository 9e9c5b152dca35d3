//! Concurrent signal collection
//!
//! ```text
//!                      ┌─► dns ──────────┐
//! resolves(domain) ──► ├─► email ────────┤
//!   Unresolvable ─► ✗  ├─► tls ──────────┼─► SignalBundle::assemble
//!                      ├─► …             │
//!                      └─► subdomains ───┘
//! ```
//!
//! Every probe runs on its own task under its own timeout. A probe that
//! times out or panics turns into a failed block; only a domain that does
//! not resolve at all aborts the run. Dropping the run aborts its probe
//! tasks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use itreality_core::config::ProbesConfig;
use itreality_core::domain::{
    DomainName, DomainResolver, ProbeContext, Resolution, SignalBlock, SignalBundle,
    SignalCategory,
};

use crate::domain::CollectionError;
use crate::infrastructure::ProbeRegistry;

pub struct SignalOrchestrator {
    registry: Arc<ProbeRegistry>,
    resolver: Arc<dyn DomainResolver>,
    probe_timeout: Duration,
}

impl SignalOrchestrator {
    pub fn new(
        registry: Arc<ProbeRegistry>,
        resolver: Arc<dyn DomainResolver>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            resolver,
            probe_timeout,
        }
    }

    pub fn from_config(
        registry: Arc<ProbeRegistry>,
        resolver: Arc<dyn DomainResolver>,
        config: &ProbesConfig,
    ) -> Self {
        Self::new(registry, resolver, config.probe_timeout())
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Run every registered probe against `domain` and assemble the bundle.
    ///
    /// The bundle always holds one block per category. Categories without a
    /// registered probe are failed blocks.
    pub async fn collect_all_signals(
        &self,
        domain: &DomainName,
        contact_email: Option<&str>,
    ) -> Result<SignalBundle, CollectionError> {
        match self.resolver.resolves(domain).await {
            Resolution::Resolves => debug!(%domain, "Pre-flight resolution succeeded"),
            Resolution::Unresolvable => {
                warn!(%domain, "Domain does not resolve, skipping collection");
                return Err(CollectionError::DomainUnresolvable {
                    domain: domain.clone(),
                });
            }
            Resolution::Indeterminate(reason) => {
                warn!(%domain, %reason, "Pre-flight resolution failed, collecting anyway");
            }
        }

        let ctx = Arc::new(ProbeContext::new(
            domain.clone(),
            contact_email.map(str::to_string),
        ));
        let collected_at = ctx.started_at;
        let timeout = self.probe_timeout;
        let started = Instant::now();

        let tasks = self.registry.probes().into_iter().map(|probe| {
            let category = probe.category();
            let ctx = ctx.clone();
            let handle = AbortOnDrop(tokio::spawn(async move {
                tokio::time::timeout(timeout, probe.collect(&ctx)).await
            }));

            async move {
                match handle.await {
                    Ok(Ok(block)) if block.category() == category => block,
                    Ok(Ok(block)) => {
                        error!(
                            expected = %category,
                            actual = %block.category(),
                            "Probe returned a block for the wrong category"
                        );
                        SignalBlock::failed(
                            category,
                            format!("probe returned {} signals", block.category()),
                        )
                    }
                    Ok(Err(_elapsed)) => {
                        warn!(%category, timeout_ms = timeout.as_millis() as u64, "Probe timed out");
                        SignalBlock::failed(
                            category,
                            format!("probe timed out after {}", format_timeout(timeout)),
                        )
                    }
                    Err(join_error) => {
                        error!(%category, error = %join_error, "Probe task failed");
                        SignalBlock::failed(category, format!("probe crashed: {join_error}"))
                    }
                }
            }
        });

        let blocks = join_all(tasks).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let bundle = SignalBundle::assemble(domain.clone(), blocks, collected_at, duration_ms);

        let failed: Vec<SignalCategory> = bundle.failed_categories();
        info!(
            %domain,
            duration_ms,
            failed = failed.len(),
            "Signal collection finished"
        );
        if !failed.is_empty() {
            debug!(%domain, ?failed, "Categories without usable signals");
        }

        Ok(bundle)
    }
}

/// `15s`, or `250ms` for sub-second timeouts
/// Probe task handle that aborts the task when dropped unfinished
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn format_timeout(timeout: Duration) -> String {
    if timeout.subsec_millis() == 0 && timeout.as_secs() > 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timeout() {
        assert_eq!(format_timeout(Duration::from_secs(15)), "15s");
        assert_eq!(format_timeout(Duration::from_millis(250)), "250ms");
        assert_eq!(format_timeout(Duration::from_millis(1500)), "1500ms");
    }
}
