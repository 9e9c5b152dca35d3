//! Report value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix of every confidence note attached to a low-confidence narrative
pub const CAVEAT_MARKER: &str = "Limited confidence:";

/// Prefix of finding descriptions backed by low-confidence evidence
pub const UNVERIFIED_PREFIX: &str = "Unverified: ";

/// Finding severity, ordered `Info < Low < Medium < High < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSeverity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for FindingSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for FindingSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("Unknown severity: {other}")),
        }
    }
}

/// True when text already carries a caveat and needs no extra prefix
pub fn is_qualified(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with(UNVERIFIED_PREFIX.trim_end()) || trimmed.starts_with(CAVEAT_MARKER)
}
