//! rustls backed [`CertificateSource`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use x509_parser::prelude::*;

use crate::domain::{CertificateSource, LeafCertificate, TlsProbeError};

/// Performs a real handshake and reports the leaf certificate.
///
/// Validation against the webpki roots is recorded rather than enforced, so
/// expired or mismatched certificates are still inspected.
pub struct RustlsCertificateSource {
    provider: Arc<CryptoProvider>,
    roots: Arc<RootCertStore>,
    timeout: Duration,
}

impl RustlsCertificateSource {
    pub fn new(timeout: Duration) -> Self {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self {
            provider: Arc::new(rustls::crypto::ring::default_provider()),
            roots: Arc::new(roots),
            timeout,
        }
    }

    fn connector(&self) -> Result<(TlsConnector, Arc<RecordingVerifier>), TlsProbeError> {
        let inner =
            WebPkiServerVerifier::builder_with_provider(self.roots.clone(), self.provider.clone())
                .build()
                .map_err(|e| TlsProbeError::Setup(e.to_string()))?;
        let verifier = Arc::new(RecordingVerifier {
            inner,
            outcome: Mutex::new(None),
        });

        let config = ClientConfig::builder_with_provider(self.provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| TlsProbeError::Setup(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(verifier.clone())
            .with_no_client_auth();

        Ok((TlsConnector::from(Arc::new(config)), verifier))
    }
}

#[async_trait]
impl CertificateSource for RustlsCertificateSource {
    async fn leaf_certificate(
        &self,
        host: &str,
        port: u16,
    ) -> Result<LeafCertificate, TlsProbeError> {
        let address = format!("{host}:{port}");
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| TlsProbeError::Setup(format!("invalid server name {host}: {e}")))?;
        let (connector, verifier) = self.connector()?;

        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| TlsProbeError::Connect {
                address: address.clone(),
                message: format!("timed out after {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| TlsProbeError::Connect {
                address: address.clone(),
                message: e.to_string(),
            })?;

        let tls = tokio::time::timeout(self.timeout, connector.connect(server_name, stream))
            .await
            .map_err(|_| TlsProbeError::Handshake("timed out".to_string()))?
            .map_err(|e| TlsProbeError::Handshake(e.to_string()))?;

        let (_, connection) = tls.get_ref();
        let leaf = connection
            .peer_certificates()
            .and_then(|chain| chain.first())
            .ok_or(TlsProbeError::NoCertificate)?;
        let protocol_version = connection.protocol_version().map(|v| format!("{v:?}"));

        let mut certificate = parse_leaf(leaf.as_ref())?;
        certificate.protocol_version = protocol_version;
        certificate.verification_error = verifier.outcome();
        Ok(certificate)
    }
}

/// Parse a DER leaf certificate
pub fn parse_leaf(der: &[u8]) -> Result<LeafCertificate, TlsProbeError> {
    let (_, cert) =
        X509Certificate::from_der(der).map_err(|e| TlsProbeError::Parse(e.to_string()))?;

    let issuer = cert
        .issuer()
        .iter_organization()
        .next()
        .and_then(|o| o.as_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| cert.issuer().to_string());
    let subject = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| cert.subject().to_string());

    let not_after = DateTime::<Utc>::from_timestamp(cert.validity().not_after.timestamp(), 0)
        .ok_or_else(|| TlsProbeError::Parse("notAfter out of range".to_string()))?;

    let san_count = match cert.subject_alternative_name() {
        Ok(Some(san)) => san.value.general_names.len(),
        Ok(None) => 0,
        Err(e) => return Err(TlsProbeError::Parse(e.to_string())),
    };

    Ok(LeafCertificate {
        issuer,
        subject,
        not_after,
        san_count,
        protocol_version: None,
        verification_error: None,
    })
}

#[derive(Debug)]
struct RecordingVerifier {
    inner: Arc<WebPkiServerVerifier>,
    outcome: Mutex<Option<String>>,
}

impl RecordingVerifier {
    fn outcome(&self) -> Option<String> {
        self.outcome.lock().ok().and_then(|guard| guard.clone())
    }
}

impl ServerCertVerifier for RecordingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if let Err(e) = self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        ) && let Ok(mut outcome) = self.outcome.lock()
        {
            *outcome = Some(e.to_string());
        }
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}
