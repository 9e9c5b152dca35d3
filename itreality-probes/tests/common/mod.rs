//! Shared test doubles for probe tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use itreality_core::domain::{DomainName, ProbeContext};
use itreality_probes::domain::{
    CertificateSource, DnsClient, LeafCertificate, LookupError, LookupResult, TlsProbeError,
};

// ── Scripted DNS client (test double) ──────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rr {
    A,
    Aaaa,
    Ns,
    Mx,
    Txt,
    Ptr,
}

/// Answers from a fixed table; unknown names are NXDOMAIN unless a
/// blanket failure is configured.
#[derive(Default, Clone)]
pub struct FakeDns {
    answers: HashMap<(Rr, String), Result<Vec<String>, LookupError>>,
    fail_unknown: Option<String>,
}

impl FakeDns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, rr: Rr, name: &str, values: &[&str]) -> Self {
        self.answers.insert(
            (rr, name.to_string()),
            Ok(values.iter().map(|v| v.to_string()).collect()),
        );
        self
    }

    pub fn failing(mut self, rr: Rr, name: &str, message: &str) -> Self {
        self.answers.insert(
            (rr, name.to_string()),
            Err(LookupError::Failed(message.to_string())),
        );
        self
    }

    /// Every lookup not explicitly scripted fails with `message`
    pub fn fail_unknown(mut self, message: &str) -> Self {
        self.fail_unknown = Some(message.to_string());
        self
    }

    fn answer(&self, rr: Rr, name: &str) -> LookupResult<String> {
        match self.answers.get(&(rr, name.to_string())) {
            Some(Ok(values)) if values.is_empty() => Err(LookupError::NotFound),
            Some(result) => result.clone(),
            None => match &self.fail_unknown {
                Some(message) => Err(LookupError::Failed(message.clone())),
                None => Err(LookupError::NotFound),
            },
        }
    }
}

#[async_trait]
impl DnsClient for FakeDns {
    async fn ipv4(&self, name: &str) -> LookupResult<Ipv4Addr> {
        self.answer(Rr::A, name)
            .map(|v| v.iter().filter_map(|a| a.parse().ok()).collect())
    }

    async fn ipv6(&self, name: &str) -> LookupResult<Ipv6Addr> {
        self.answer(Rr::Aaaa, name)
            .map(|v| v.iter().filter_map(|a| a.parse().ok()).collect())
    }

    async fn ns(&self, name: &str) -> LookupResult<String> {
        self.answer(Rr::Ns, name)
    }

    async fn mx(&self, name: &str) -> LookupResult<String> {
        self.answer(Rr::Mx, name)
    }

    async fn txt(&self, name: &str) -> LookupResult<String> {
        self.answer(Rr::Txt, name)
    }

    async fn ptr(&self, addr: IpAddr) -> LookupResult<String> {
        self.answer(Rr::Ptr, &addr.to_string())
    }
}

// ── Fixed certificate source (test double) ─────────────────────────

pub struct FakeCertificates(pub Result<LeafCertificate, TlsProbeError>);

#[async_trait]
impl CertificateSource for FakeCertificates {
    async fn leaf_certificate(
        &self,
        _host: &str,
        _port: u16,
    ) -> Result<LeafCertificate, TlsProbeError> {
        self.0.clone()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

pub fn ctx(domain: &str) -> ProbeContext {
    ProbeContext::new(
        DomainName::parse(domain).expect("valid test domain"),
        Some("owner@acme.com".to_string()),
    )
}

pub fn http() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("itreality-test")
        .build()
        .expect("client builds")
}
