//! Breach history from a Have I Been Pwned compatible API

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use itreality_core::domain::{
    BreachSignals, Confidence, Probe, ProbeContext, SignalBlock, SignalCategory, SignalData,
};

use crate::infrastructure::http::contact_user_agent;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BreachRecord {
    name: String,
    #[serde(default)]
    breach_date: Option<String>,
    #[serde(default)]
    pwn_count: u64,
}

pub struct BreachProbe {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    user_agent: String,
}

impl BreachProbe {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
        user_agent: &str,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            user_agent: user_agent.to_string(),
        }
    }

    async fn fetch(&self, ctx: &ProbeContext) -> Result<Vec<BreachRecord>, String> {
        let url = format!("{}/breaches", self.base_url);
        let mut request = self
            .http
            .get(&url)
            .query(&[("Domain", ctx.domain.as_str())])
            .header(
                reqwest::header::USER_AGENT,
                contact_user_agent(&self.user_agent, ctx.contact_email.as_deref()),
            );
        if let Some(key) = &self.api_key {
            request = request.header("hibp-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("breach source request failed: {e}"))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            StatusCode::TOO_MANY_REQUESTS => Err("breach source rate limited the request".to_string()),
            status if status.is_success() => response
                .json::<Vec<BreachRecord>>()
                .await
                .map_err(|e| format!("breach source returned malformed JSON: {e}")),
            status => Err(format!("breach source returned HTTP {}", status.as_u16())),
        }
    }
}

fn summarize(mut records: Vec<BreachRecord>) -> BreachSignals {
    let date_of = |r: &BreachRecord| {
        r.breach_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    };
    // Most recent first, then by name for a stable order
    records.sort_by(|a, b| date_of(b).cmp(&date_of(a)).then_with(|| a.name.cmp(&b.name)));

    BreachSignals {
        breach_count: records.len(),
        most_recent_breach: records.iter().filter_map(date_of).max(),
        total_pwned: records.iter().map(|r| r.pwn_count).sum(),
        breach_names: records.into_iter().map(|r| r.name).collect(),
    }
}

#[async_trait]
impl Probe for BreachProbe {
    fn category(&self) -> SignalCategory {
        SignalCategory::Hibp
    }

    async fn collect(&self, ctx: &ProbeContext) -> SignalBlock {
        match self.fetch(ctx).await {
            Ok(records) => {
                debug!(domain = %ctx.domain, breaches = records.len(), "Breach lookup complete");
                SignalBlock::new(SignalData::Hibp(summarize(records)), Confidence::High)
            }
            Err(e) => {
                warn!(domain = %ctx.domain, error = %e, "Breach lookup failed");
                SignalBlock::failed(SignalCategory::Hibp, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, date: Option<&str>, pwned: u64) -> BreachRecord {
        BreachRecord {
            name: name.to_string(),
            breach_date: date.map(str::to_string),
            pwn_count: pwned,
        }
    }

    #[test]
    fn test_summarize_orders_by_recency() {
        let signals = summarize(vec![
            record("Old", Some("2012-06-05"), 100),
            record("Recent", Some("2021-03-01"), 50),
            record("Undated", None, 1),
        ]);
        assert_eq!(signals.breach_count, 3);
        assert_eq!(signals.breach_names, vec!["Recent", "Old", "Undated"]);
        assert_eq!(signals.total_pwned, 151);
        assert_eq!(
            signals.most_recent_breach,
            NaiveDate::from_ymd_opt(2021, 3, 1)
        );
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(Vec::new()), BreachSignals::default());
    }
}
