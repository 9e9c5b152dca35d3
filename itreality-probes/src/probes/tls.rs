//! Leaf certificate inspection

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use itreality_core::domain::{
    Confidence, Probe, ProbeContext, SignalBlock, SignalCategory, SignalData, TlsSignals,
};

use crate::domain::{CertificateSource, LeafCertificate};

pub struct TlsProbe {
    certificates: Arc<dyn CertificateSource>,
    port: u16,
}

impl TlsProbe {
    pub fn new(certificates: Arc<dyn CertificateSource>, port: u16) -> Self {
        Self { certificates, port }
    }
}

/// Whole days left, rounded down so anything past `not_after` is negative.
fn days_until(
    not_after: chrono::DateTime<chrono::Utc>,
    now: chrono::DateTime<chrono::Utc>,
) -> i64 {
    (not_after - now).num_seconds().div_euclid(86_400)
}

fn to_signals(leaf: LeafCertificate, now: chrono::DateTime<chrono::Utc>) -> TlsSignals {
    TlsSignals {
        days_until_expiry: Some(days_until(leaf.not_after, now)),
        trusted: leaf.verification_error.is_none(),
        issuer: Some(leaf.issuer),
        subject: Some(leaf.subject),
        not_after: Some(leaf.not_after),
        san_count: leaf.san_count,
        protocol_version: leaf.protocol_version,
        verification_error: leaf.verification_error,
    }
}

#[async_trait]
impl Probe for TlsProbe {
    fn category(&self) -> SignalCategory {
        SignalCategory::Tls
    }

    async fn collect(&self, ctx: &ProbeContext) -> SignalBlock {
        match self
            .certificates
            .leaf_certificate(ctx.domain.as_str(), self.port)
            .await
        {
            Ok(leaf) => SignalBlock::new(
                SignalData::Tls(to_signals(leaf, ctx.started_at)),
                Confidence::High,
            ),
            Err(e) => {
                debug!(domain = %ctx.domain, error = %e, "TLS probe failed");
                SignalBlock::failed(SignalCategory::Tls, e.to_string())
            }
        }
    }
}
