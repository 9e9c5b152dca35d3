//! Signal value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Domain name parsing error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainNameError {
    #[error("Domain cannot be empty")]
    Empty,

    #[error("Domain must have at least two labels: {0}")]
    TooFewLabels(String),

    #[error("Domain exceeds {MAX_DOMAIN_LEN} characters")]
    TooLong,

    #[error("Invalid domain label '{label}': {reason}")]
    InvalidLabel { label: String, reason: String },

    #[error("IP literals are not domains: {0}")]
    IpLiteral(String),
}

/// Normalized hostname that identifies a snapshot.
///
/// Accepts bare hostnames as well as URLs: scheme, userinfo, port, path,
/// query, fragment and a trailing dot are stripped and the result is
/// lowercased. `https://WWW.Example.com:8443/path` parses to `www.example.com`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DomainName(String);

impl DomainName {
    pub fn parse(input: &str) -> Result<Self, DomainNameError> {
        let mut rest = input.trim();

        if let Some(idx) = rest.find("://") {
            rest = &rest[idx + 3..];
        }
        if let Some(idx) = rest.find(['/', '?', '#']) {
            rest = &rest[..idx];
        }
        if let Some(idx) = rest.rfind('@') {
            rest = &rest[idx + 1..];
        }
        if rest.starts_with('[') {
            return Err(DomainNameError::IpLiteral(input.trim().to_string()));
        }
        if let Some((host, port)) = rest.rsplit_once(':')
            && port.chars().all(|c| c.is_ascii_digit())
        {
            rest = host;
        }

        let host = rest.strip_suffix('.').unwrap_or(rest).to_ascii_lowercase();

        if host.is_empty() {
            return Err(DomainNameError::Empty);
        }
        if host.len() > MAX_DOMAIN_LEN {
            return Err(DomainNameError::TooLong);
        }
        if host.parse::<std::net::IpAddr>().is_ok() {
            return Err(DomainNameError::IpLiteral(host));
        }

        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() < 2 {
            return Err(DomainNameError::TooFewLabels(host));
        }
        for label in &labels {
            validate_label(label)?;
        }

        Ok(Self(host))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of a record under this domain, e.g. `_dmarc.example.com`
    pub fn subdomain(&self, prefix: &str) -> String {
        format!("{}.{}", prefix, self.0)
    }

    /// True when `name` equals this domain or sits below it
    pub fn contains(&self, name: &str) -> bool {
        name == self.0 || name.ends_with(&format!(".{}", self.0))
    }
}

fn validate_label(label: &str) -> Result<(), DomainNameError> {
    let invalid = |reason: &str| DomainNameError::InvalidLabel {
        label: label.to_string(),
        reason: reason.to_string(),
    };

    if label.is_empty() {
        return Err(invalid("empty label"));
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(invalid("longer than 63 characters"));
    }
    if !label
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid("only letters, digits and hyphens are allowed"));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(invalid("cannot start or end with a hyphen"));
    }
    Ok(())
}

impl FromStr for DomainName {
    type Err = DomainNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DomainName {
    type Error = DomainNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl<'de> Deserialize<'de> for DomainName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How much of a category's evidence was actually observed.
///
/// Ordered `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Grade by the number of observable sub-checks out of `total`
    pub fn from_observed(observed: usize, total: usize) -> Self {
        if total > 0 && observed >= total {
            Self::High
        } else if observed > 0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("Unknown confidence: {other}")),
        }
    }
}

/// Signal category. Declaration order is the canonical block order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalCategory {
    Dns,
    Email,
    Tls,
    Techstack,
    Exposure,
    Hibp,
    Subdomains,
}

impl SignalCategory {
    pub const ALL: [SignalCategory; 7] = [
        Self::Dns,
        Self::Email,
        Self::Tls,
        Self::Techstack,
        Self::Exposure,
        Self::Hibp,
        Self::Subdomains,
    ];

    /// Tie-break rank when ordering findings; security categories come first.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Email => 0,
            Self::Tls => 1,
            Self::Hibp => 2,
            Self::Exposure => 3,
            Self::Dns => 4,
            Self::Subdomains => 5,
            Self::Techstack => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dns => "dns",
            Self::Email => "email",
            Self::Tls => "tls",
            Self::Techstack => "techstack",
            Self::Exposure => "exposure",
            Self::Hibp => "hibp",
            Self::Subdomains => "subdomains",
        }
    }

    /// Human-readable label used in prompts and fallback text
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dns => "DNS and registration",
            Self::Email => "Email authentication",
            Self::Tls => "TLS certificate",
            Self::Techstack => "Website technology",
            Self::Exposure => "Hosting exposure",
            Self::Hibp => "Breach history",
            Self::Subdomains => "Public subdomains",
        }
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("Unknown signal category: {s}"))
    }
}

/// Result of a single DNS-backed check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Present,
    Absent,
    #[default]
    LookupFailed,
}

impl CheckOutcome {
    /// Present and absent are both observations; a failed lookup is not.
    pub fn is_observable(&self) -> bool {
        !matches!(self, Self::LookupFailed)
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
            Self::LookupFailed => write!(f, "lookup_failed"),
        }
    }
}
