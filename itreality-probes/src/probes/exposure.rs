//! Hosting classification from reverse DNS and nameservers

use async_trait::async_trait;
use futures::future::join_all;
use std::net::IpAddr;
use std::sync::Arc;

use itreality_core::domain::{
    ClassificationSource, Confidence, DomainName, ExposureSignals, HostingClassification, Probe,
    ProbeContext, PtrRecord, SignalBlock, SignalCategory, SignalData,
};

use crate::domain::{DnsClient, LookupError};

/// Hostname fragments and the hosting class and provider they indicate
const HOSTING_PATTERNS: &[(&str, HostingClassification, &str)] = &[
    ("cloudflare", HostingClassification::Cdn, "Cloudflare"),
    ("cloudfront.net", HostingClassification::Cdn, "Amazon CloudFront"),
    ("akamai", HostingClassification::Cdn, "Akamai"),
    ("fastly", HostingClassification::Cdn, "Fastly"),
    ("edgecast", HostingClassification::Cdn, "Edgecast"),
    ("bunnycdn", HostingClassification::Cdn, "Bunny CDN"),
    ("amazonaws.com", HostingClassification::Cloud, "Amazon Web Services"),
    ("awsdns", HostingClassification::Cloud, "Amazon Web Services"),
    ("googleusercontent.com", HostingClassification::Cloud, "Google Cloud"),
    ("googledomains.com", HostingClassification::Cloud, "Google Cloud"),
    ("azure", HostingClassification::Cloud, "Microsoft Azure"),
    ("cloudapp.net", HostingClassification::Cloud, "Microsoft Azure"),
    ("digitalocean", HostingClassification::Cloud, "DigitalOcean"),
    ("linode", HostingClassification::Cloud, "Akamai Linode"),
    ("vultr", HostingClassification::Cloud, "Vultr"),
    ("your-server.de", HostingClassification::Cloud, "Hetzner"),
    ("hetzner", HostingClassification::Cloud, "Hetzner"),
    ("ovh", HostingClassification::Cloud, "OVHcloud"),
    ("vercel", HostingClassification::Cloud, "Vercel"),
    ("netlify", HostingClassification::Cloud, "Netlify"),
    ("secureserver.net", HostingClassification::SharedHosting, "GoDaddy"),
    ("domaincontrol.com", HostingClassification::SharedHosting, "GoDaddy"),
    ("bluehost", HostingClassification::SharedHosting, "Bluehost"),
    ("hostgator", HostingClassification::SharedHosting, "HostGator"),
    ("dreamhost", HostingClassification::SharedHosting, "DreamHost"),
    ("siteground", HostingClassification::SharedHosting, "SiteGround"),
    ("hostinger", HostingClassification::SharedHosting, "Hostinger"),
    ("websitewelcome.com", HostingClassification::SharedHosting, "HostGator"),
    ("ionos", HostingClassification::SharedHosting, "IONOS"),
    ("registrar-servers.com", HostingClassification::SharedHosting, "Namecheap"),
    ("wixdns.net", HostingClassification::SharedHosting, "Wix"),
    ("squarespacedns.com", HostingClassification::SharedHosting, "Squarespace"),
];

pub struct ExposureProbe {
    dns: Arc<dyn DnsClient>,
    max_ptr_lookups: usize,
}

impl ExposureProbe {
    pub fn new(dns: Arc<dyn DnsClient>, max_ptr_lookups: usize) -> Self {
        Self {
            dns,
            max_ptr_lookups,
        }
    }
}

fn match_pattern(hostname: &str) -> Option<(HostingClassification, &'static str)> {
    HOSTING_PATTERNS
        .iter()
        .find(|(pattern, _, _)| hostname.contains(pattern))
        .map(|(_, class, provider)| (*class, *provider))
}

/// Classify from PTR hostnames. A PTR inside the domain itself means the
/// owner runs their own address space.
pub fn classify_reverse_dns(
    domain: &DomainName,
    hostnames: &[String],
) -> Option<(HostingClassification, Option<String>)> {
    if let Some((class, provider)) = hostnames.iter().find_map(|h| match_pattern(h)) {
        return Some((class, Some(provider.to_string())));
    }
    if hostnames.iter().any(|h| domain.contains(h)) {
        return Some((HostingClassification::OnPrem, None));
    }
    None
}

pub fn classify_nameservers(nameservers: &[String]) -> Option<(HostingClassification, String)> {
    nameservers
        .iter()
        .find_map(|ns| match_pattern(ns))
        .map(|(class, provider)| (class, provider.to_string()))
}

#[async_trait]
impl Probe for ExposureProbe {
    fn category(&self) -> SignalCategory {
        SignalCategory::Exposure
    }

    async fn collect(&self, ctx: &ProbeContext) -> SignalBlock {
        let name = ctx.domain.as_str();
        let (v4, v6, ns) = tokio::join!(self.dns.ipv4(name), self.dns.ipv6(name), self.dns.ns(name));

        if let (Err(LookupError::Failed(e4)), Err(LookupError::Failed(e6))) = (&v4, &v6) {
            return SignalBlock::failed(
                SignalCategory::Exposure,
                format!("address lookups failed: A: {e4}; AAAA: {e6}"),
            );
        }

        let addresses: Vec<IpAddr> = v4
            .unwrap_or_default()
            .into_iter()
            .map(IpAddr::V4)
            .chain(v6.unwrap_or_default().into_iter().map(IpAddr::V6))
            .collect();
        let nameservers = ns.unwrap_or_default();

        let lookups = addresses
            .iter()
            .take(self.max_ptr_lookups)
            .map(|addr| async move {
                let hostname = self
                    .dns
                    .ptr(*addr)
                    .await
                    .ok()
                    .and_then(|names| names.into_iter().next());
                PtrRecord {
                    address: addr.to_string(),
                    hostname,
                }
            });
        let reverse_dns = join_all(lookups).await;

        let ptr_hostnames: Vec<String> = reverse_dns
            .iter()
            .filter_map(|r| r.hostname.clone())
            .collect();

        let (hosting, provider_hint, classified_from, confidence) =
            if let Some((class, provider)) = classify_reverse_dns(&ctx.domain, &ptr_hostnames) {
                (class, provider, Some(ClassificationSource::ReverseDns), Confidence::High)
            } else if let Some((class, provider)) = classify_nameservers(&nameservers) {
                (
                    class,
                    Some(provider),
                    Some(ClassificationSource::Nameservers),
                    Confidence::Medium,
                )
            } else {
                (HostingClassification::Unknown, None, None, Confidence::Low)
            };

        SignalBlock::new(
            SignalData::Exposure(ExposureSignals {
                addresses: addresses.iter().map(ToString::to_string).collect(),
                reverse_dns,
                hosting,
                provider_hint,
                classified_from,
            }),
            confidence,
        )
    }
}
