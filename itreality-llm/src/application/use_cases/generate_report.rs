//! Use case for turning a signal bundle into a validated report

use chrono::Utc;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use itreality_core::config::LlmConfig;
use itreality_core::domain::{
    BlockNarrative, CAVEAT_MARKER, CandidateFinding, DomainName, Report, ReportOutcome,
    SignalBlock, SignalBundle, SignalCategory, TopFinding, UNVERIFIED_PREFIX, is_qualified,
};

use crate::domain::{CompletionRequest, LlmError, LlmProvider, derive_candidates, requires_caveat};
use crate::infrastructure::ResponseParser;
use crate::infrastructure::prompts::PromptBuilder;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("language model request failed: {0}")]
    Provider(#[from] LlmError),

    #[error("model output could not be parsed: {0}")]
    Parse(String),

    #[error("report failed schema validation: {}", .0.join("; "))]
    SchemaValidation(Vec<String>),

    #[error("signals belong to {actual}, not {expected}")]
    DomainMismatch {
        expected: DomainName,
        actual: DomainName,
    },
}

/// Report as the model writes it, before validation
#[derive(Debug, Deserialize)]
struct DraftReport {
    #[serde(default)]
    owner_summary: String,
    #[serde(default)]
    top_findings: Vec<DraftFinding>,
    #[serde(default)]
    block_narratives: Vec<DraftNarrative>,
    #[serde(default)]
    assumptions: Vec<String>,
    #[serde(default)]
    questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DraftFinding {
    finding_code: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct DraftNarrative {
    category: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    why_it_matters: String,
}

pub struct ReportSynthesizer {
    provider: Arc<dyn LlmProvider>,
    config: LlmConfig,
}

impl ReportSynthesizer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: LlmConfig) -> Self {
        Self { provider, config }
    }

    pub async fn generate_report(
        &self,
        domain: &DomainName,
        signals: &SignalBundle,
        context_url: Option<&str>,
    ) -> Result<Report, SynthesisError> {
        if signals.domain() != domain {
            return Err(SynthesisError::DomainMismatch {
                expected: domain.clone(),
                actual: signals.domain().clone(),
            });
        }

        let candidates = derive_candidates(signals);
        debug!(
            domain = %domain,
            candidates = candidates.len(),
            failed = ?signals.failed_categories(),
            "Derived finding candidates"
        );

        let request = CompletionRequest::new()
            .with_system(PromptBuilder::build_system_prompt())
            .with_user(PromptBuilder::build_report_prompt(
                signals,
                &candidates,
                context_url,
            ))
            .with_model(self.config.default_model.clone())
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens)
            .with_json_mode();

        let response = self.provider.complete(request).await?;
        if response.is_truncated() {
            warn!(domain = %domain, "Model output hit the token limit");
        }

        let draft: DraftReport = ResponseParser::parse_json(response.text())
            .map_err(|e| SynthesisError::Parse(e.to_string()))?;
        validate(&draft, &candidates)?;

        let model = if response.model.is_empty() {
            self.provider.default_model().to_string()
        } else {
            response.model.clone()
        };
        let report = assemble(domain, signals, &candidates, draft, model, context_url);

        info!(
            domain = %domain,
            findings = report.top_findings.len(),
            model = %report.model,
            "Report generated"
        );
        Ok(report)
    }

    /// `generate_report` folded into its serializable outcome
    pub async fn generate_outcome(
        &self,
        domain: &DomainName,
        signals: &SignalBundle,
        context_url: Option<&str>,
    ) -> ReportOutcome {
        let result = self.generate_report(domain, signals, context_url).await;
        if let Err(e) = &result {
            warn!(domain = %domain, error = %e, "Report generation failed");
        }
        ReportOutcome::from_result(result)
    }
}

fn validate(draft: &DraftReport, candidates: &[CandidateFinding]) -> Result<(), SynthesisError> {
    let mut problems = Vec::new();

    if draft.owner_summary.trim().is_empty() {
        problems.push("owner_summary is empty".to_string());
    }

    let mut narrated = HashSet::new();
    for narrative in &draft.block_narratives {
        match narrative.category.parse::<SignalCategory>() {
            Ok(category) => {
                if !narrated.insert(category) {
                    problems.push(format!("duplicate narrative for {category}"));
                }
                if narrative.explanation.trim().is_empty() {
                    problems.push(format!("narrative for {category} has no explanation"));
                }
            }
            Err(_) => problems.push(format!("unknown category {:?}", narrative.category)),
        }
    }
    for category in SignalCategory::ALL {
        if !narrated.contains(&category) {
            problems.push(format!("missing narrative for {category}"));
        }
    }

    let known: HashSet<&str> = candidates.iter().map(|c| c.finding_code.as_str()).collect();
    let mut seen = HashSet::new();
    for finding in &draft.top_findings {
        let code = finding.finding_code.as_str();
        if !known.contains(code) {
            problems.push(format!("unknown finding code {code:?}"));
        } else if !seen.insert(code) {
            problems.push(format!("duplicate finding {code}"));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(SynthesisError::SchemaValidation(problems))
    }
}

fn caveat_note(block: &SignalBlock) -> String {
    match &block.error {
        Some(error) => format!(
            "{CAVEAT_MARKER} this information could not be collected ({error}), so nothing here \
             is confirmed."
        ),
        None => format!(
            "{CAVEAT_MARKER} only part of this information could be observed, so treat it as \
             indicative."
        ),
    }
}

fn qualify(text: String) -> String {
    if is_qualified(&text) {
        text
    } else {
        format!("{UNVERIFIED_PREFIX}{text}")
    }
}

fn non_empty_or(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text.trim().to_string()
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Apply deterministic ranking and confidence to validated prose
fn assemble(
    domain: &DomainName,
    signals: &SignalBundle,
    candidates: &[CandidateFinding],
    draft: DraftReport,
    model: String,
    context_url: Option<&str>,
) -> Report {
    let mut prose: HashMap<String, DraftFinding> = draft
        .top_findings
        .into_iter()
        .map(|f| (f.finding_code.clone(), f))
        .collect();

    let top_findings = candidates
        .iter()
        .take(Report::MAX_TOP_FINDINGS)
        .map(|candidate| {
            let (title, description) = match prose.remove(&candidate.finding_code) {
                Some(written) => (
                    non_empty_or(written.title, &candidate.title),
                    non_empty_or(written.description, &candidate.description),
                ),
                None => (candidate.title.clone(), candidate.description.clone()),
            };
            let (title, description) = if requires_caveat(candidate.confidence) {
                (qualify(title), qualify(description))
            } else {
                (title, description)
            };
            TopFinding {
                finding_code: candidate.finding_code.clone(),
                category: candidate.category,
                severity: candidate.severity,
                title,
                description,
                confidence: candidate.confidence,
            }
        })
        .collect();

    let mut narratives: HashMap<SignalCategory, DraftNarrative> = draft
        .block_narratives
        .into_iter()
        .filter_map(|n| n.category.parse().ok().map(|c| (c, n)))
        .collect();

    let block_narratives = signals
        .blocks()
        .map(|(category, block)| {
            let written = narratives.remove(&category);
            let (explanation, why_it_matters) = written
                .map(|n| (n.explanation.trim().to_string(), n.why_it_matters.trim().to_string()))
                .unwrap_or_default();
            let explanation = if block.needs_caveat() && !is_qualified(&explanation) {
                format!("{CAVEAT_MARKER} {explanation}")
            } else {
                explanation
            };
            BlockNarrative {
                category,
                explanation,
                why_it_matters,
                confidence: block.confidence,
                confidence_note: block.needs_caveat().then(|| caveat_note(block)),
            }
        })
        .collect();

    let mut assumptions = clean_list(draft.assumptions);
    let failed = signals.failed_categories();
    if !failed.is_empty() {
        let labels: Vec<&str> = failed.iter().map(SignalCategory::label).collect();
        assumptions.push(format!(
            "Some information could not be collected this time: {}.",
            labels.join(", ")
        ));
    }

    Report {
        domain: domain.clone(),
        owner_summary: draft.owner_summary.trim().to_string(),
        top_findings,
        block_narratives,
        assumptions,
        questions: clean_list(draft.questions),
        generated_at: Utc::now(),
        model,
        context_url: context_url.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itreality_core::domain::{Confidence, FindingSeverity};

    fn candidate(code: &str, category: SignalCategory) -> CandidateFinding {
        CandidateFinding {
            finding_code: code.to_string(),
            category,
            severity: FindingSeverity::High,
            confidence: Confidence::High,
            title: format!("{code} title"),
            description: format!("{code} description"),
        }
    }

    fn draft(narrated: &[&str], findings: &[&str]) -> DraftReport {
        DraftReport {
            owner_summary: "Overall fine.".to_string(),
            top_findings: findings
                .iter()
                .map(|code| DraftFinding {
                    finding_code: code.to_string(),
                    title: String::new(),
                    description: String::new(),
                })
                .collect(),
            block_narratives: narrated
                .iter()
                .map(|category| DraftNarrative {
                    category: category.to_string(),
                    explanation: "Observed.".to_string(),
                    why_it_matters: "Matters.".to_string(),
                })
                .collect(),
            assumptions: Vec::new(),
            questions: Vec::new(),
        }
    }

    const ALL: [&str; 7] = ["dns", "email", "tls", "techstack", "exposure", "hibp", "subdomains"];

    #[test]
    fn test_validate_accepts_complete_draft() {
        let candidates = vec![candidate("DMARC_MISSING", SignalCategory::Email)];
        assert!(validate(&draft(&ALL, &["DMARC_MISSING"]), &candidates).is_ok());
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let mut narrated = ALL[..6].to_vec();
        narrated.push("dns");
        narrated.push("weather");
        let candidates = vec![candidate("DMARC_MISSING", SignalCategory::Email)];

        let err = validate(
            &draft(&narrated, &["DMARC_MISSING", "DMARC_MISSING", "MADE_UP"]),
            &candidates,
        )
        .unwrap_err();
        let SynthesisError::SchemaValidation(problems) = err else {
            panic!("expected schema validation error");
        };
        assert!(problems.contains(&"duplicate narrative for dns".to_string()));
        assert!(problems.contains(&"unknown category \"weather\"".to_string()));
        assert!(problems.contains(&"missing narrative for subdomains".to_string()));
        assert!(problems.contains(&"duplicate finding DMARC_MISSING".to_string()));
        assert!(problems.contains(&"unknown finding code \"MADE_UP\"".to_string()));
    }

    #[test]
    fn test_validate_rejects_empty_summary() {
        let mut empty = draft(&ALL, &[]);
        empty.owner_summary = "  ".to_string();
        assert!(matches!(
            validate(&empty, &[]),
            Err(SynthesisError::SchemaValidation(p)) if p == vec!["owner_summary is empty"]
        ));
    }

    #[test]
    fn test_qualify_is_idempotent() {
        let once = qualify("DMARC is missing".to_string());
        assert_eq!(once, "Unverified: DMARC is missing");
        assert_eq!(qualify(once.clone()), once);
    }
}
