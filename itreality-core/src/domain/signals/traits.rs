//! Probe trait definition

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::entities::SignalBlock;
use super::value_objects::{DomainName, SignalCategory};

/// Inputs shared by every probe in a collection run
#[derive(Debug, Clone)]
pub struct ProbeContext {
    pub domain: DomainName,
    /// Contact address advertised to third-party data sources
    pub contact_email: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl ProbeContext {
    pub fn new(domain: DomainName, contact_email: Option<String>) -> Self {
        Self {
            domain,
            contact_email,
            started_at: Utc::now(),
        }
    }
}

/// Trait that every signal collector implements
///
/// A probe never fails: lookup errors, bad responses and parse failures are
/// reported through a failed or lower-confidence [`SignalBlock`]. The
/// orchestrator enforces the time budget.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Category of the block this probe produces
    fn category(&self) -> SignalCategory;

    async fn collect(&self, ctx: &ProbeContext) -> SignalBlock;
}

/// Outcome of the pre-flight resolution check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// At least one A, AAAA or NS answer
    Resolves,
    /// The resolver affirmatively reported that nothing exists at the apex
    Unresolvable,
    /// The resolver failed; nothing is known about the domain
    Indeterminate(String),
}

/// Pre-flight check run before any probe is launched
#[async_trait]
pub trait DomainResolver: Send + Sync {
    async fn resolves(&self, domain: &DomainName) -> Resolution;
}
