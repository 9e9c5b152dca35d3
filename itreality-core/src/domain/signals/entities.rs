//! Signal blocks and the per-category data they carry

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{CheckOutcome, Confidence, DomainName, SignalCategory};

/// DNS records and registration data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DnsSignals {
    /// Any A, AAAA or NS answer at the apex
    pub resolvable: bool,
    pub has_a: bool,
    pub has_aaaa: bool,
    pub ns_records: Vec<String>,
    pub mx_records: Vec<String>,
    pub registrar: Option<String>,
    pub registered_at: Option<DateTime<Utc>>,
    pub domain_age_days: Option<i64>,
}

/// DMARC policy (`p=` tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmarcPolicy {
    None,
    Quarantine,
    Reject,
}

impl DmarcPolicy {
    /// Extract the policy from a raw `v=DMARC1` record
    pub fn from_record(record: &str) -> Option<Self> {
        record
            .split(';')
            .map(str::trim)
            .find_map(|tag| tag.strip_prefix("p="))
            .and_then(|value| match value.trim().to_ascii_lowercase().as_str() {
                "none" => Some(Self::None),
                "quarantine" => Some(Self::Quarantine),
                "reject" => Some(Self::Reject),
                _ => None,
            })
    }

    /// `none` only monitors and does not protect the domain
    pub fn is_enforcing(&self) -> bool {
        !matches!(self, Self::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpfCheck {
    pub status: CheckOutcome,
    pub record: Option<String>,
    /// Qualifier of the trailing `all` mechanism: `-`, `~`, `?` or `+`
    pub all_qualifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DmarcCheck {
    pub status: CheckOutcome,
    pub record: Option<String>,
    pub policy: Option<DmarcPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DkimCheck {
    pub status: CheckOutcome,
    pub selectors_checked: Vec<String>,
    pub selectors_found: Vec<String>,
}

/// SPF, DMARC and DKIM posture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EmailSignals {
    pub spf: SpfCheck,
    pub dmarc: DmarcCheck,
    pub dkim: DkimCheck,
}

impl EmailSignals {
    pub fn observable_checks(&self) -> usize {
        [self.spf.status, self.dmarc.status, self.dkim.status]
            .iter()
            .filter(|s| s.is_observable())
            .count()
    }
}

/// Leaf certificate presented on port 443
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TlsSignals {
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub not_after: Option<DateTime<Utc>>,
    /// Negative once the certificate has expired
    pub days_until_expiry: Option<i64>,
    pub san_count: usize,
    pub protocol_version: Option<String>,
    /// Chain validated against the webpki roots for this hostname
    pub trusted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    Header,
    Body,
    MetaGenerator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    pub source: DetectionSource,
    pub evidence: String,
}

/// Homepage fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TechStackSignals {
    pub technologies: Vec<Technology>,
    pub server_header: Option<String>,
    pub powered_by: Option<String>,
    pub status_code: Option<u16>,
    pub final_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HostingClassification {
    Cloud,
    Cdn,
    SharedHosting,
    OnPrem,
    #[default]
    Unknown,
}

impl std::fmt::Display for HostingClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloud => write!(f, "cloud"),
            Self::Cdn => write!(f, "cdn"),
            Self::SharedHosting => write!(f, "shared_hosting"),
            Self::OnPrem => write!(f, "on_prem"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Evidence the hosting classification was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    ReverseDns,
    Nameservers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PtrRecord {
    pub address: String,
    pub hostname: Option<String>,
}

/// Where the domain's addresses live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExposureSignals {
    pub addresses: Vec<String>,
    pub reverse_dns: Vec<PtrRecord>,
    pub hosting: HostingClassification,
    pub provider_hint: Option<String>,
    pub classified_from: Option<ClassificationSource>,
}

/// Publicly known breaches tied to the domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BreachSignals {
    pub breach_count: usize,
    pub breach_names: Vec<String>,
    pub most_recent_breach: Option<NaiveDate>,
    pub total_pwned: u64,
}

/// Certificate-transparency subdomains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SubdomainSignals {
    pub subdomains: Vec<String>,
    /// Distinct names seen before the cap was applied
    pub total_found: usize,
    pub truncated: bool,
}

/// Category-specific block payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum SignalData {
    Dns(DnsSignals),
    Email(EmailSignals),
    Tls(TlsSignals),
    Techstack(TechStackSignals),
    Exposure(ExposureSignals),
    Hibp(BreachSignals),
    Subdomains(SubdomainSignals),
}

impl SignalData {
    pub fn category(&self) -> SignalCategory {
        match self {
            Self::Dns(_) => SignalCategory::Dns,
            Self::Email(_) => SignalCategory::Email,
            Self::Tls(_) => SignalCategory::Tls,
            Self::Techstack(_) => SignalCategory::Techstack,
            Self::Exposure(_) => SignalCategory::Exposure,
            Self::Hibp(_) => SignalCategory::Hibp,
            Self::Subdomains(_) => SignalCategory::Subdomains,
        }
    }

    /// Empty payload used by failed blocks
    pub fn empty(category: SignalCategory) -> Self {
        match category {
            SignalCategory::Dns => Self::Dns(DnsSignals::default()),
            SignalCategory::Email => Self::Email(EmailSignals::default()),
            SignalCategory::Tls => Self::Tls(TlsSignals::default()),
            SignalCategory::Techstack => Self::Techstack(TechStackSignals::default()),
            SignalCategory::Exposure => Self::Exposure(ExposureSignals::default()),
            SignalCategory::Hibp => Self::Hibp(BreachSignals::default()),
            SignalCategory::Subdomains => Self::Subdomains(SubdomainSignals::default()),
        }
    }
}

/// Output of one probe.
///
/// A block either carries (possibly partial) data, or it is failed: low
/// confidence, an error message and the category's empty payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalBlock {
    pub confidence: Confidence,
    pub collected_at: DateTime<Utc>,
    pub data: SignalData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SignalBlock {
    pub fn new(data: SignalData, confidence: Confidence) -> Self {
        Self {
            confidence,
            collected_at: Utc::now(),
            data,
            error: None,
        }
    }

    pub fn failed(category: SignalCategory, error: impl Into<String>) -> Self {
        Self {
            confidence: Confidence::Low,
            collected_at: Utc::now(),
            data: SignalData::empty(category),
            error: Some(error.into()),
        }
    }

    pub fn with_collected_at(mut self, collected_at: DateTime<Utc>) -> Self {
        self.collected_at = collected_at;
        self
    }

    pub fn category(&self) -> SignalCategory {
        self.data.category()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Low-confidence and failed blocks only support qualified statements
    pub fn needs_caveat(&self) -> bool {
        self.is_failed() || self.confidence == Confidence::Low
    }
}

/// Signals for one domain, exactly one block per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSignalBundle")]
pub struct SignalBundle {
    domain: DomainName,
    collected_at: DateTime<Utc>,
    collection_duration_ms: u64,
    dns: SignalBlock,
    email: SignalBlock,
    tls: SignalBlock,
    techstack: SignalBlock,
    exposure: SignalBlock,
    hibp: SignalBlock,
    subdomains: SignalBlock,
}

pub const NO_PROBE_REGISTERED: &str = "no probe registered";

impl SignalBundle {
    /// Build a bundle from whatever blocks were produced.
    ///
    /// Missing categories become failed blocks; if a category appears twice
    /// the first block wins.
    pub fn assemble(
        domain: DomainName,
        blocks: impl IntoIterator<Item = SignalBlock>,
        collected_at: DateTime<Utc>,
        collection_duration_ms: u64,
    ) -> Self {
        let mut slots: [Option<SignalBlock>; 7] = Default::default();
        for block in blocks {
            let idx = category_index(block.category());
            if slots[idx].is_none() {
                slots[idx] = Some(block);
            }
        }
        let mut take = |category: SignalCategory| {
            slots[category_index(category)].take().unwrap_or_else(|| {
                SignalBlock::failed(category, NO_PROBE_REGISTERED).with_collected_at(collected_at)
            })
        };

        Self {
            dns: take(SignalCategory::Dns),
            email: take(SignalCategory::Email),
            tls: take(SignalCategory::Tls),
            techstack: take(SignalCategory::Techstack),
            exposure: take(SignalCategory::Exposure),
            hibp: take(SignalCategory::Hibp),
            subdomains: take(SignalCategory::Subdomains),
            domain,
            collected_at,
            collection_duration_ms,
        }
    }

    pub fn domain(&self) -> &DomainName {
        &self.domain
    }

    pub fn collected_at(&self) -> DateTime<Utc> {
        self.collected_at
    }

    pub fn collection_duration_ms(&self) -> u64 {
        self.collection_duration_ms
    }

    pub fn block(&self, category: SignalCategory) -> &SignalBlock {
        match category {
            SignalCategory::Dns => &self.dns,
            SignalCategory::Email => &self.email,
            SignalCategory::Tls => &self.tls,
            SignalCategory::Techstack => &self.techstack,
            SignalCategory::Exposure => &self.exposure,
            SignalCategory::Hibp => &self.hibp,
            SignalCategory::Subdomains => &self.subdomains,
        }
    }

    /// Blocks in canonical category order
    pub fn blocks(&self) -> impl Iterator<Item = (SignalCategory, &SignalBlock)> {
        SignalCategory::ALL.into_iter().map(|c| (c, self.block(c)))
    }

    pub fn dns(&self) -> Option<&DnsSignals> {
        match &self.dns.data {
            SignalData::Dns(data) => Some(data),
            _ => None,
        }
    }

    pub fn email(&self) -> Option<&EmailSignals> {
        match &self.email.data {
            SignalData::Email(data) => Some(data),
            _ => None,
        }
    }

    pub fn tls(&self) -> Option<&TlsSignals> {
        match &self.tls.data {
            SignalData::Tls(data) => Some(data),
            _ => None,
        }
    }

    pub fn techstack(&self) -> Option<&TechStackSignals> {
        match &self.techstack.data {
            SignalData::Techstack(data) => Some(data),
            _ => None,
        }
    }

    pub fn exposure(&self) -> Option<&ExposureSignals> {
        match &self.exposure.data {
            SignalData::Exposure(data) => Some(data),
            _ => None,
        }
    }

    pub fn hibp(&self) -> Option<&BreachSignals> {
        match &self.hibp.data {
            SignalData::Hibp(data) => Some(data),
            _ => None,
        }
    }

    pub fn subdomains(&self) -> Option<&SubdomainSignals> {
        match &self.subdomains.data {
            SignalData::Subdomains(data) => Some(data),
            _ => None,
        }
    }

    pub fn failed_categories(&self) -> Vec<SignalCategory> {
        self.blocks()
            .filter(|(_, block)| block.is_failed())
            .map(|(category, _)| category)
            .collect()
    }
}

fn category_index(category: SignalCategory) -> usize {
    match category {
        SignalCategory::Dns => 0,
        SignalCategory::Email => 1,
        SignalCategory::Tls => 2,
        SignalCategory::Techstack => 3,
        SignalCategory::Exposure => 4,
        SignalCategory::Hibp => 5,
        SignalCategory::Subdomains => 6,
    }
}

#[derive(Deserialize)]
struct RawSignalBundle {
    domain: DomainName,
    collected_at: DateTime<Utc>,
    collection_duration_ms: u64,
    dns: SignalBlock,
    email: SignalBlock,
    tls: SignalBlock,
    techstack: SignalBlock,
    exposure: SignalBlock,
    hibp: SignalBlock,
    subdomains: SignalBlock,
}

impl TryFrom<RawSignalBundle> for SignalBundle {
    type Error = String;

    fn try_from(raw: RawSignalBundle) -> Result<Self, Self::Error> {
        let bundle = Self {
            domain: raw.domain,
            collected_at: raw.collected_at,
            collection_duration_ms: raw.collection_duration_ms,
            dns: raw.dns,
            email: raw.email,
            tls: raw.tls,
            techstack: raw.techstack,
            exposure: raw.exposure,
            hibp: raw.hibp,
            subdomains: raw.subdomains,
        };
        for (category, block) in bundle.blocks() {
            if block.category() != category {
                return Err(format!(
                    "block stored under '{}' carries '{}' data",
                    category,
                    block.category()
                ));
            }
        }
        Ok(bundle)
    }
}
