//! Homepage fingerprinting from headers and body markers

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::HeaderMap;
use tracing::debug;

use itreality_core::domain::{
    Confidence, DetectionSource, Probe, ProbeContext, SignalBlock, SignalCategory, SignalData,
    TechStackSignals, Technology,
};

/// Bodies are truncated to this many bytes before matching
const MAX_BODY_BYTES: usize = 512 * 1024;

static META_GENERATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+name=["']generator["'][^>]+content=["']([^"']+)["']"#)
        .expect("valid generator regex")
});

/// Response headers that identify a CDN or edge platform
const CDN_HEADERS: &[(&str, &str)] = &[
    ("cf-ray", "Cloudflare"),
    ("x-amz-cf-id", "Amazon CloudFront"),
    ("x-fastly-request-id", "Fastly"),
    ("x-akamai-transformed", "Akamai"),
    ("x-vercel-id", "Vercel"),
    ("x-nf-request-id", "Netlify"),
    ("x-azure-ref", "Azure Front Door"),
];

/// Lowercase body substrings that identify a platform
const BODY_MARKERS: &[(&str, &str)] = &[
    ("wp-content/", "WordPress"),
    ("wp-includes/", "WordPress"),
    ("cdn.shopify.com", "Shopify"),
    ("static.wixstatic.com", "Wix"),
    ("static1.squarespace.com", "Squarespace"),
    ("drupal-settings-json", "Drupal"),
    ("/sites/default/files/", "Drupal"),
    ("/media/jui/", "Joomla"),
    ("__next_data__", "Next.js"),
    ("/_next/static/", "Next.js"),
    ("data-wf-site", "Webflow"),
    ("assets.website-files.com", "Webflow"),
];

pub struct TechStackProbe {
    http: reqwest::Client,
    /// Overrides `https://{domain}` as the fetched origin
    origin_override: Option<String>,
}

impl TechStackProbe {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            origin_override: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin_override = Some(origin.into().trim_end_matches('/').to_string());
        self
    }
}

fn push_unique(technologies: &mut Vec<Technology>, name: &str, source: DetectionSource, evidence: &str) {
    if technologies
        .iter()
        .any(|t| t.name.eq_ignore_ascii_case(name))
    {
        return;
    }
    technologies.push(Technology {
        name: name.to_string(),
        source,
        evidence: evidence.to_string(),
    });
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Technologies identified from response headers and body
pub fn fingerprint(headers: &HeaderMap, body: &str) -> Vec<Technology> {
    let mut technologies = Vec::new();

    if let Some(server) = header_value(headers, "server") {
        let product = server.split('/').next().unwrap_or(&server).trim();
        push_unique(&mut technologies, product, DetectionSource::Header, &format!("server: {server}"));
    }
    if let Some(powered_by) = header_value(headers, "x-powered-by") {
        let product = powered_by.split('/').next().unwrap_or(&powered_by).trim();
        push_unique(
            &mut technologies,
            product,
            DetectionSource::Header,
            &format!("x-powered-by: {powered_by}"),
        );
    }
    for (header, name) in CDN_HEADERS {
        if headers.contains_key(*header) {
            push_unique(&mut technologies, name, DetectionSource::Header, header);
        }
    }

    if let Some(captures) = META_GENERATOR.captures(body)
        && let Some(generator) = captures.get(1)
    {
        let generator = generator.as_str().trim();
        let product = generator
            .split_whitespace()
            .next()
            .unwrap_or(generator);
        push_unique(
            &mut technologies,
            product,
            DetectionSource::MetaGenerator,
            &format!("generator: {generator}"),
        );
    }

    let lowered = body.to_ascii_lowercase();
    for (marker, name) in BODY_MARKERS {
        if lowered.contains(marker) {
            push_unique(&mut technologies, name, DetectionSource::Body, marker);
        }
    }

    technologies
}

fn truncate_body(body: &str) -> &str {
    if body.len() <= MAX_BODY_BYTES {
        return body;
    }
    let mut end = MAX_BODY_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[async_trait]
impl Probe for TechStackProbe {
    fn category(&self) -> SignalCategory {
        SignalCategory::Techstack
    }

    async fn collect(&self, ctx: &ProbeContext) -> SignalBlock {
        let url = match &self.origin_override {
            Some(origin) => format!("{origin}/"),
            None => format!("https://{}/", ctx.domain),
        };

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(domain = %ctx.domain, error = %e, "Homepage fetch failed");
                return SignalBlock::failed(
                    SignalCategory::Techstack,
                    format!("homepage request failed: {e}"),
                );
            }
        };

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response.headers().clone();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return SignalBlock::failed(
                    SignalCategory::Techstack,
                    format!("homepage body could not be read: {e}"),
                );
            }
        };

        let technologies = fingerprint(&headers, truncate_body(&body));
        let confidence = match technologies.len() {
            0 => Confidence::Low,
            1 => Confidence::Medium,
            _ => Confidence::High,
        };

        SignalBlock::new(
            SignalData::Techstack(TechStackSignals {
                technologies,
                server_header: header_value(&headers, "server"),
                powered_by: header_value(&headers, "x-powered-by"),
                status_code: Some(status_code),
                final_url: Some(final_url),
            }),
            confidence,
        )
    }
}
