//! DNS records and RDAP registration data

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use itreality_core::domain::{
    Confidence, DnsSignals, DomainName, Probe, ProbeContext, SignalBlock, SignalCategory,
    SignalData,
};

use crate::domain::{DnsClient, LookupError, LookupResult};

/// Record presence plus registrar and registration date
pub struct DnsProbe {
    dns: Arc<dyn DnsClient>,
    http: reqwest::Client,
    rdap_base_url: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Registration {
    registrar: Option<String>,
    registered_at: Option<DateTime<Utc>>,
}

impl DnsProbe {
    pub fn new(dns: Arc<dyn DnsClient>, http: reqwest::Client, rdap_base_url: &str) -> Self {
        Self {
            dns,
            http,
            rdap_base_url: rdap_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn registration(&self, domain: &DomainName) -> Result<Registration, String> {
        let url = format!("{}/domain/{}", self.rdap_base_url, domain);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/rdap+json, application/json")
            .send()
            .await
            .map_err(|e| format!("RDAP request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("RDAP returned HTTP {}", response.status().as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("RDAP response was not JSON: {e}"))?;
        Ok(parse_rdap(&body))
    }
}

fn parse_rdap(body: &Value) -> Registration {
    let registered_at = body
        .get("events")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find(|event| event.get("eventAction").and_then(Value::as_str) == Some("registration"))
        .and_then(|event| event.get("eventDate").and_then(Value::as_str))
        .and_then(|date| DateTime::parse_from_rfc3339(date).ok())
        .map(|date| date.with_timezone(&Utc));

    let registrar = body
        .get("entities")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find(|entity| {
            entity
                .get("roles")
                .and_then(Value::as_array)
                .is_some_and(|roles| roles.iter().any(|r| r.as_str() == Some("registrar")))
        })
        .and_then(vcard_full_name);

    Registration {
        registrar,
        registered_at,
    }
}

/// `fn` property of a jCard: `["vcard", [["fn", {}, "text", "Name"], ...]]`
fn vcard_full_name(entity: &Value) -> Option<String> {
    entity
        .get("vcardArray")?
        .get(1)?
        .as_array()?
        .iter()
        .find(|prop| prop.get(0).and_then(Value::as_str) == Some("fn"))
        .and_then(|prop| prop.get(3))
        .and_then(Value::as_str)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

fn records<T>(result: LookupResult<T>, failures: &mut Vec<String>, kind: &str) -> Vec<T> {
    match result {
        Ok(answers) => answers,
        Err(LookupError::NotFound) => Vec::new(),
        Err(LookupError::Failed(e)) => {
            failures.push(format!("{kind}: {e}"));
            Vec::new()
        }
    }
}

#[async_trait]
impl Probe for DnsProbe {
    fn category(&self) -> SignalCategory {
        SignalCategory::Dns
    }

    async fn collect(&self, ctx: &ProbeContext) -> SignalBlock {
        let name = ctx.domain.as_str();
        let (v4, v6, ns, mx, registration) = tokio::join!(
            self.dns.ipv4(name),
            self.dns.ipv6(name),
            self.dns.ns(name),
            self.dns.mx(name),
            self.registration(&ctx.domain),
        );

        let mut failures = Vec::new();
        let a = records(v4, &mut failures, "A");
        let aaaa = records(v6, &mut failures, "AAAA");
        let ns_records = records(ns, &mut failures, "NS");
        let mx_records = records(mx, &mut failures, "MX");
        let records_ok = failures.is_empty();

        let registration = match registration {
            Ok(registration) => Some(registration),
            Err(e) => {
                debug!(domain = %ctx.domain, error = %e, "RDAP lookup failed");
                failures.push(e);
                None
            }
        };

        let confidence = match (records_ok, registration.is_some()) {
            (true, true) => Confidence::High,
            (true, false) | (false, true) => Confidence::Medium,
            (false, false) => {
                warn!(domain = %ctx.domain, "DNS probe could not observe anything");
                return SignalBlock::failed(SignalCategory::Dns, failures.join("; "));
            }
        };

        let registration = registration.unwrap_or_default();
        let domain_age_days = registration
            .registered_at
            .map(|at| (ctx.started_at - at).num_days());

        SignalBlock::new(
            SignalData::Dns(DnsSignals {
                resolvable: !a.is_empty() || !aaaa.is_empty() || !ns_records.is_empty(),
                has_a: !a.is_empty(),
                has_aaaa: !aaaa.is_empty(),
                ns_records,
                mx_records,
                registrar: registration.registrar,
                registered_at: registration.registered_at,
                domain_age_days,
            }),
            confidence,
        )
    }
}
