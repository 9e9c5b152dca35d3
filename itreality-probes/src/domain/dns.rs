//! DNS client abstraction

use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Failed DNS lookup.
///
/// `NotFound` is an observation (NXDOMAIN or an empty answer). `Failed`
/// means nothing could be learned: timeout, SERVFAIL, refused, network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("no records found")]
    NotFound,

    #[error("lookup failed: {0}")]
    Failed(String),
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

pub type LookupResult<T> = Result<Vec<T>, LookupError>;

/// Record lookups used by the DNS, email and exposure probes.
///
/// Names are absolute hostnames without a trailing dot; returned hostnames
/// are lowercase without a trailing dot.
#[async_trait]
pub trait DnsClient: Send + Sync {
    async fn ipv4(&self, name: &str) -> LookupResult<Ipv4Addr>;

    async fn ipv6(&self, name: &str) -> LookupResult<Ipv6Addr>;

    async fn ns(&self, name: &str) -> LookupResult<String>;

    async fn mx(&self, name: &str) -> LookupResult<String>;

    /// TXT records with multi-string records joined
    async fn txt(&self, name: &str) -> LookupResult<String>;

    async fn ptr(&self, addr: IpAddr) -> LookupResult<String>;
}

/// Answers from a lookup, treating "not found" as an empty answer
pub fn answers_or_empty<T>(result: LookupResult<T>) -> Result<Vec<T>, String> {
    match result {
        Ok(answers) => Ok(answers),
        Err(LookupError::NotFound) => Ok(Vec::new()),
        Err(LookupError::Failed(e)) => Err(e),
    }
}

pub fn normalize_hostname(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}
