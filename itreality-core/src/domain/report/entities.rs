//! Report entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::FindingSeverity;
use crate::domain::signals::{Confidence, DomainName, SignalCategory};

/// Finding derived deterministically from signal data before generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFinding {
    pub finding_code: String,
    pub category: SignalCategory,
    pub severity: FindingSeverity,
    /// Confidence of the block the finding was derived from
    pub confidence: Confidence,
    /// Fallback wording used when the model omits the finding
    pub title: String,
    pub description: String,
}

/// Ranked finding shown at the top of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopFinding {
    pub finding_code: String,
    pub category: SignalCategory,
    pub severity: FindingSeverity,
    pub title: String,
    pub description: String,
    pub confidence: Confidence,
}

/// Plain-language explanation of one signal category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNarrative {
    pub category: SignalCategory,
    pub explanation: String,
    pub why_it_matters: String,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub domain: DomainName,
    pub owner_summary: String,
    /// At most three, most important first
    pub top_findings: Vec<TopFinding>,
    /// One per signal category, in canonical category order
    pub block_narratives: Vec<BlockNarrative>,
    pub assumptions: Vec<String>,
    pub questions: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_url: Option<String>,
}

impl Report {
    pub const MAX_TOP_FINDINGS: usize = 3;

    pub fn narrative(&self, category: SignalCategory) -> Option<&BlockNarrative> {
        self.block_narratives
            .iter()
            .find(|narrative| narrative.category == category)
    }
}

/// Serializable result of a synthesis attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportOutcome {
    pub fn from_result<E: std::fmt::Display>(result: Result<Report, E>) -> Self {
        match result {
            Ok(report) => Self {
                success: true,
                report: Some(report),
                error: None,
            },
            Err(e) => Self {
                success: false,
                report: None,
                error: Some(e.to_string()),
            },
        }
    }
}
