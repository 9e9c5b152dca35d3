//! Shared HTTP client for probes

use std::time::Duration;

use itreality_core::config::ProbesConfig;

/// Client used by every HTTP-backed probe
pub fn build_http_client(config: &ProbesConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(config.http_timeout())
        .connect_timeout(Duration::from_secs(config.http_timeout_seconds.min(5)))
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
}

/// `User-Agent` that names a contact for third-party data sources
pub fn contact_user_agent(product: &str, contact_email: Option<&str>) -> String {
    match contact_email {
        Some(email) if !email.trim().is_empty() => format!("{product} (contact: {})", email.trim()),
        _ => product.to_string(),
    }
}
