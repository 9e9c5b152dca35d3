//! Certificate source abstraction

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Parsed leaf certificate as presented during the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafCertificate {
    pub issuer: String,
    pub subject: String,
    pub not_after: DateTime<Utc>,
    pub san_count: usize,
    pub protocol_version: Option<String>,
    /// Set when chain or hostname validation failed; the handshake still
    /// completes so the certificate can be inspected.
    pub verification_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TlsProbeError {
    #[error("connection to {address} failed: {message}")]
    Connect { address: String, message: String },

    #[error("TLS handshake failed: {0}")]
    Handshake(String),

    #[error("server presented no certificate")]
    NoCertificate,

    #[error("certificate could not be parsed: {0}")]
    Parse(String),

    #[error("TLS client setup failed: {0}")]
    Setup(String),
}

/// Fetches the leaf certificate a host presents
#[async_trait]
pub trait CertificateSource: Send + Sync {
    async fn leaf_certificate(&self, host: &str, port: u16)
    -> Result<LeafCertificate, TlsProbeError>;
}
