//! Assembles the standard probe set from configuration

use std::sync::Arc;

use itreality_core::config::ProbesConfig;
use itreality_core::domain::{DomainResolver, Probe};

use crate::domain::{CertificateSource, DnsClient};
use crate::infrastructure::{
    DnsDomainResolver, RustlsCertificateSource, TrustDnsClient, build_http_client,
};
use crate::probes::{
    BreachProbe, DnsProbe, EmailAuthProbe, ExposureProbe, SubdomainProbe, TechStackProbe,
    TlsProbe,
};

#[derive(Debug, thiserror::Error)]
pub enum ProbeSetupError {
    #[error("HTTP client could not be built: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Shared network clients the probes are built from
#[derive(Clone)]
pub struct ProbeFactory {
    config: ProbesConfig,
    dns: Arc<dyn DnsClient>,
    certificates: Arc<dyn CertificateSource>,
    http: reqwest::Client,
}

impl ProbeFactory {
    /// Network-backed clients: trust-dns, rustls and reqwest
    pub fn from_config(config: &ProbesConfig) -> Result<Self, ProbeSetupError> {
        Ok(Self {
            dns: Arc::new(TrustDnsClient::new(config.dns_timeout(), config.dns_attempts)),
            certificates: Arc::new(RustlsCertificateSource::new(config.http_timeout())),
            http: build_http_client(config)?,
            config: config.clone(),
        })
    }

    pub fn with_clients(
        config: &ProbesConfig,
        dns: Arc<dyn DnsClient>,
        certificates: Arc<dyn CertificateSource>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            config: config.clone(),
            dns,
            certificates,
            http,
        }
    }

    /// One probe per category; the subdomain probe only when enabled
    pub fn probes(&self) -> Vec<Arc<dyn Probe>> {
        let config = &self.config;
        let mut probes: Vec<Arc<dyn Probe>> = vec![
            Arc::new(DnsProbe::new(
                self.dns.clone(),
                self.http.clone(),
                &config.rdap_base_url,
            )),
            Arc::new(EmailAuthProbe::new(
                self.dns.clone(),
                config.dkim_selectors.clone(),
            )),
            Arc::new(TlsProbe::new(self.certificates.clone(), config.tls_port)),
            Arc::new(TechStackProbe::new(self.http.clone())),
            Arc::new(ExposureProbe::new(self.dns.clone(), config.max_ptr_lookups)),
            Arc::new(BreachProbe::new(
                self.http.clone(),
                &config.breach_api_base_url,
                config.breach_api_key.clone(),
                &config.user_agent,
            )),
        ];
        if config.enable_subdomains {
            probes.push(Arc::new(SubdomainProbe::new(
                self.http.clone(),
                &config.crtsh_base_url,
                config.max_subdomains,
            )));
        }
        probes
    }

    pub fn domain_resolver(&self) -> Arc<dyn DomainResolver> {
        Arc::new(DnsDomainResolver::new(self.dns.clone()))
    }
}
