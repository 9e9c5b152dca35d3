//! Subdomains from certificate transparency logs (crt.sh)

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::debug;

use itreality_core::domain::{
    Confidence, DomainName, Probe, ProbeContext, SignalBlock, SignalCategory, SignalData,
    SubdomainSignals,
};

#[derive(Debug, Deserialize)]
struct CtEntry {
    #[serde(default)]
    name_value: String,
}

pub struct SubdomainProbe {
    http: reqwest::Client,
    base_url: String,
    max_subdomains: usize,
}

impl SubdomainProbe {
    pub fn new(http: reqwest::Client, base_url: &str, max_subdomains: usize) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_subdomains,
        }
    }

    async fn fetch(&self, domain: &DomainName) -> Result<Vec<CtEntry>, String> {
        let url = format!("{}/", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", format!("%.{domain}")), ("output", "json".to_string())])
            .send()
            .await
            .map_err(|e| format!("certificate transparency request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!(
                "certificate transparency search returned HTTP {}",
                response.status().as_u16()
            ));
        }

        response
            .json::<Vec<CtEntry>>()
            .await
            .map_err(|e| format!("certificate transparency response was not JSON: {e}"))
    }
}

/// Distinct, wildcard-stripped names strictly below `domain`
fn extract_subdomains(domain: &DomainName, entries: &[CtEntry]) -> BTreeSet<String> {
    entries
        .iter()
        .flat_map(|entry| entry.name_value.lines())
        .map(|name| {
            let name = name.trim().trim_end_matches('.').to_ascii_lowercase();
            name.strip_prefix("*.").map(str::to_string).unwrap_or(name)
        })
        .filter(|name| name != domain.as_str() && domain.contains(name))
        .filter(|name| !name.contains('*') && !name.contains(char::is_whitespace))
        .collect()
}

#[async_trait]
impl Probe for SubdomainProbe {
    fn category(&self) -> SignalCategory {
        SignalCategory::Subdomains
    }

    async fn collect(&self, ctx: &ProbeContext) -> SignalBlock {
        let entries = match self.fetch(&ctx.domain).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(domain = %ctx.domain, error = %e, "Subdomain search failed");
                return SignalBlock::failed(SignalCategory::Subdomains, e);
            }
        };

        let names = extract_subdomains(&ctx.domain, &entries);
        let total_found = names.len();
        let subdomains: Vec<String> = names.into_iter().take(self.max_subdomains).collect();

        SignalBlock::new(
            SignalData::Subdomains(SubdomainSignals {
                truncated: total_found > subdomains.len(),
                subdomains,
                total_found,
            }),
            Confidence::High,
        )
    }
}
