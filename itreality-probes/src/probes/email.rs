//! SPF, DMARC and DKIM posture

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::warn;

use itreality_core::domain::{
    CheckOutcome, Confidence, DkimCheck, DmarcCheck, DmarcPolicy, EmailSignals, Probe,
    ProbeContext, SignalBlock, SignalCategory, SignalData, SpfCheck,
};

use crate::domain::{DnsClient, LookupError};

pub struct EmailAuthProbe {
    dns: Arc<dyn DnsClient>,
    dkim_selectors: Vec<String>,
}

impl EmailAuthProbe {
    pub fn new(dns: Arc<dyn DnsClient>, dkim_selectors: Vec<String>) -> Self {
        Self {
            dns,
            dkim_selectors,
        }
    }

    /// First TXT record at `name` starting with `prefix` (case-insensitive)
    async fn tagged_record(
        &self,
        name: &str,
        prefix: &str,
    ) -> Result<Option<String>, LookupError> {
        match self.dns.txt(name).await {
            Ok(records) => Ok(records
                .into_iter()
                .map(|r| r.trim().to_string())
                .find(|r| r.to_ascii_lowercase().starts_with(&prefix.to_ascii_lowercase()))),
            Err(LookupError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn spf(&self, domain: &str, failures: &mut Vec<String>) -> SpfCheck {
        match self.tagged_record(domain, "v=spf1").await {
            Ok(Some(record)) => SpfCheck {
                status: CheckOutcome::Present,
                all_qualifier: spf_all_qualifier(&record),
                record: Some(record),
            },
            Ok(None) => SpfCheck {
                status: CheckOutcome::Absent,
                ..Default::default()
            },
            Err(e) => {
                failures.push(format!("SPF {e}"));
                SpfCheck::default()
            }
        }
    }

    async fn dmarc(&self, name: &str, failures: &mut Vec<String>) -> DmarcCheck {
        match self.tagged_record(name, "v=DMARC1").await {
            Ok(Some(record)) => DmarcCheck {
                status: CheckOutcome::Present,
                policy: DmarcPolicy::from_record(&record),
                record: Some(record),
            },
            Ok(None) => DmarcCheck {
                status: CheckOutcome::Absent,
                ..Default::default()
            },
            Err(e) => {
                failures.push(format!("DMARC {e}"));
                DmarcCheck::default()
            }
        }
    }

    async fn dkim(&self, domain: &str, failures: &mut Vec<String>) -> DkimCheck {
        let lookups = self.dkim_selectors.iter().map(|selector| async move {
            let name = format!("{selector}._domainkey.{domain}");
            (selector.clone(), self.dns.txt(&name).await)
        });
        let results = join_all(lookups).await;

        let mut found = Vec::new();
        let mut observed = 0usize;
        let mut last_error = None;
        for (selector, result) in results {
            match result {
                Ok(records) => {
                    observed += 1;
                    if records.iter().any(|r| is_dkim_key(r)) {
                        found.push(selector);
                    }
                }
                Err(LookupError::NotFound) => observed += 1,
                Err(LookupError::Failed(e)) => last_error = Some(e),
            }
        }

        let status = if !found.is_empty() {
            CheckOutcome::Present
        } else if observed > 0 {
            CheckOutcome::Absent
        } else {
            if let Some(e) = last_error {
                failures.push(format!("DKIM lookup failed: {e}"));
            }
            CheckOutcome::LookupFailed
        };

        DkimCheck {
            status,
            selectors_checked: self.dkim_selectors.clone(),
            selectors_found: found,
        }
    }
}

/// Qualifier of the `all` mechanism, `+` when written bare
fn spf_all_qualifier(record: &str) -> Option<String> {
    record
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .find_map(|term| match term.as_str() {
            "all" | "+all" => Some("+".to_string()),
            "-all" => Some("-".to_string()),
            "~all" => Some("~".to_string()),
            "?all" => Some("?".to_string()),
            _ => None,
        })
}

fn is_dkim_key(record: &str) -> bool {
    let record = record.to_ascii_lowercase();
    record.starts_with("v=dkim1") || record.split(';').any(|tag| tag.trim().starts_with("p="))
}

#[async_trait]
impl Probe for EmailAuthProbe {
    fn category(&self) -> SignalCategory {
        SignalCategory::Email
    }

    async fn collect(&self, ctx: &ProbeContext) -> SignalBlock {
        let domain = ctx.domain.as_str();
        let dmarc_name = ctx.domain.subdomain("_dmarc");

        let mut spf_failures = Vec::new();
        let mut dmarc_failures = Vec::new();
        let mut dkim_failures = Vec::new();
        let (spf, dmarc, dkim) = tokio::join!(
            self.spf(domain, &mut spf_failures),
            self.dmarc(&dmarc_name, &mut dmarc_failures),
            self.dkim(domain, &mut dkim_failures),
        );

        let signals = EmailSignals { spf, dmarc, dkim };
        let observable = signals.observable_checks();

        if observable == 0 {
            let failures: Vec<String> = spf_failures
                .into_iter()
                .chain(dmarc_failures)
                .chain(dkim_failures)
                .collect();
            warn!(domain = %ctx.domain, "All email authentication lookups failed");
            return SignalBlock::failed(
                SignalCategory::Email,
                format!(
                    "all email authentication lookups failed: {}",
                    failures.join("; ")
                ),
            );
        }

        SignalBlock::new(
            SignalData::Email(signals),
            Confidence::from_observed(observable, 3),
        )
    }
}
