//! Pre-flight resolution check

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use itreality_core::domain::{DomainName, DomainResolver, Resolution};

use crate::domain::{DnsClient, LookupError};

/// Decides whether a domain exists before the probes are launched.
///
/// Only an affirmative "not found" for A, AAAA and NS makes a domain
/// unresolvable; any resolver failure leaves the question open.
pub struct DnsDomainResolver {
    dns: Arc<dyn DnsClient>,
}

impl DnsDomainResolver {
    pub fn new(dns: Arc<dyn DnsClient>) -> Self {
        Self { dns }
    }
}

#[async_trait]
impl DomainResolver for DnsDomainResolver {
    async fn resolves(&self, domain: &DomainName) -> Resolution {
        let name = domain.as_str();
        let (v4, v6, ns) = tokio::join!(self.dns.ipv4(name), self.dns.ipv6(name), self.dns.ns(name));

        if v4.is_ok() || v6.is_ok() || ns.is_ok() {
            return Resolution::Resolves;
        }

        let failures: Vec<String> = [v4.err(), v6.err(), ns.err()]
            .into_iter()
            .flatten()
            .filter_map(|e| match e {
                LookupError::Failed(message) => Some(message),
                LookupError::NotFound => None,
            })
            .collect();

        if failures.is_empty() {
            debug!(domain = %domain, "No A, AAAA or NS records at apex");
            Resolution::Unresolvable
        } else {
            Resolution::Indeterminate(failures.join("; "))
        }
    }
}
