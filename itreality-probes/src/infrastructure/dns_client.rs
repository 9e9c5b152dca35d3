//! trust-dns backed [`DnsClient`]

use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::op::ResponseCode;

use crate::domain::{DnsClient, LookupError, LookupResult, normalize_hostname};

/// Stub resolver against the public upstreams in [`ResolverConfig::default`]
#[derive(Clone)]
pub struct TrustDnsClient {
    resolver: TokioAsyncResolver,
}

impl TrustDnsClient {
    pub fn new(timeout: Duration, attempts: usize) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = attempts;
        // Probes look at live state; cached negatives would hide fixes
        opts.negative_max_ttl = Some(Duration::from_secs(30));
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }

    pub fn from_resolver(resolver: TokioAsyncResolver) -> Self {
        Self { resolver }
    }
}

/// Map resolver errors onto absence vs. failure.
///
/// NXDOMAIN and NOERROR-without-answers are observations; SERVFAIL,
/// REFUSED, timeouts and I/O errors are not.
fn classify(err: ResolveError) -> LookupError {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. }
            if matches!(*response_code, ResponseCode::NXDomain | ResponseCode::NoError) =>
        {
            LookupError::NotFound
        }
        _ => LookupError::Failed(err.to_string()),
    }
}

fn non_empty<T>(answers: Vec<T>) -> LookupResult<T> {
    if answers.is_empty() {
        Err(LookupError::NotFound)
    } else {
        Ok(answers)
    }
}

/// Absolute query name so the system search list is never applied
fn fqdn(name: &str) -> String {
    format!("{}.", name.trim_end_matches('.'))
}

#[async_trait]
impl DnsClient for TrustDnsClient {
    async fn ipv4(&self, name: &str) -> LookupResult<Ipv4Addr> {
        let lookup = self.resolver.ipv4_lookup(fqdn(name)).await.map_err(classify)?;
        non_empty(lookup.iter().map(|a| a.0).collect())
    }

    async fn ipv6(&self, name: &str) -> LookupResult<Ipv6Addr> {
        let lookup = self.resolver.ipv6_lookup(fqdn(name)).await.map_err(classify)?;
        non_empty(lookup.iter().map(|aaaa| aaaa.0).collect())
    }

    async fn ns(&self, name: &str) -> LookupResult<String> {
        let lookup = self.resolver.ns_lookup(fqdn(name)).await.map_err(classify)?;
        non_empty(
            lookup
                .iter()
                .map(|ns| normalize_hostname(&ns.0.to_utf8()))
                .collect(),
        )
    }

    async fn mx(&self, name: &str) -> LookupResult<String> {
        let lookup = self.resolver.mx_lookup(fqdn(name)).await.map_err(classify)?;
        let mut records: Vec<(u16, String)> = lookup
            .iter()
            .map(|mx| (mx.preference(), normalize_hostname(&mx.exchange().to_utf8())))
            .collect();
        records.sort();
        non_empty(records.into_iter().map(|(_, host)| host).collect())
    }

    async fn txt(&self, name: &str) -> LookupResult<String> {
        let lookup = self.resolver.txt_lookup(fqdn(name)).await.map_err(classify)?;
        non_empty(
            lookup
                .iter()
                .map(|txt| {
                    txt.txt_data()
                        .iter()
                        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                        .collect::<String>()
                })
                .collect(),
        )
    }

    async fn ptr(&self, addr: IpAddr) -> LookupResult<String> {
        let lookup = self.resolver.reverse_lookup(addr).await.map_err(classify)?;
        non_empty(
            lookup
                .iter()
                .map(|ptr| normalize_hostname(&ptr.0.to_utf8()))
                .collect(),
        )
    }
}
