use serde_json::{Value, json};

use itreality_core::domain::{CandidateFinding, SignalBundle, SignalCategory};

pub const REPORT_SYSTEM_PROMPT: &str = r#"You are an IT advisor writing for the owner of a small business who is not technical.
You will receive publicly observable signals about their domain, grouped by category, each with a confidence grade (high, medium or low) and, when collection failed, an error.
You will also receive the list of candidate findings that were derived from those signals.

Respond with a single JSON object and nothing else, using exactly this structure:
{
    "owner_summary": "Two to four sentences on the overall picture, in plain language.",
    "top_findings": [
        {
            "finding_code": "One of the candidate finding codes, copied exactly.",
            "title": "A short headline for the owner.",
            "description": "What it means for the business and what to ask their IT provider."
        }
    ],
    "block_narratives": [
        {
            "category": "One of: {categories}",
            "explanation": "What we observed in this category.",
            "why_it_matters": "Why the owner should care."
        }
    ],
    "assumptions": ["Things you assumed because the signals could not show them."],
    "questions": ["Questions the owner should ask their IT provider."]
}

Rules:
- Write exactly one block narrative for every category listed above, and no others.
- Only use finding codes from the candidate list. Pick at most three. Never invent new codes.
- Never describe something as certain when its category has low confidence or an error. Say that it could not be verified.
- Do not include any text outside the JSON object.
"#;

pub const REPORT_USER_PROMPT: &str = r#"Domain: {domain}
Signals collected at: {collected_at}
Report link: {context_url}

## Signals by category
```json
{signals_json}
```

## Candidate findings
```json
{candidates_json}
```
"#;

pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build_system_prompt() -> String {
        let categories = SignalCategory::ALL
            .iter()
            .map(SignalCategory::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        REPORT_SYSTEM_PROMPT.replace("{categories}", &categories)
    }

    /// Per-category signal JSON in canonical order
    pub fn signals_json(bundle: &SignalBundle) -> Value {
        Value::Array(
            bundle
                .blocks()
                .map(|(category, block)| {
                    let mut data = serde_json::to_value(&block.data).unwrap_or(Value::Null);
                    if let Value::Object(fields) = &mut data {
                        fields.remove("category");
                    }
                    json!({
                        "category": category,
                        "label": category.label(),
                        "confidence": block.confidence,
                        "error": block.error,
                        "data": data,
                    })
                })
                .collect(),
        )
    }

    pub fn candidates_json(candidates: &[CandidateFinding]) -> Value {
        Value::Array(
            candidates
                .iter()
                .map(|c| {
                    json!({
                        "category": c.category,
                        "confidence": c.confidence,
                        "finding_code": c.finding_code,
                        "severity": c.severity,
                        "summary": c.description,
                    })
                })
                .collect(),
        )
    }

    pub fn build_report_prompt(
        bundle: &SignalBundle,
        candidates: &[CandidateFinding],
        context_url: Option<&str>,
    ) -> String {
        let pretty = |value: Value| {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
        };

        REPORT_USER_PROMPT
            .replace("{domain}", bundle.domain().as_str())
            .replace("{collected_at}", &bundle.collected_at().to_rfc3339())
            .replace("{context_url}", context_url.unwrap_or("not provided"))
            .replace("{signals_json}", &pretty(Self::signals_json(bundle)))
            .replace("{candidates_json}", &pretty(Self::candidates_json(candidates)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use itreality_core::domain::{DomainName, SignalBlock};

    #[test]
    fn test_system_prompt_lists_categories() {
        let prompt = PromptBuilder::build_system_prompt();
        assert!(!prompt.contains("{categories}"));
        assert!(prompt.contains("dns, email, tls, techstack, exposure, hibp, subdomains"));
        assert!(prompt.contains("owner_summary"));
        assert!(prompt.contains("block_narratives"));
    }

    #[test]
    fn test_report_prompt_fills_placeholders() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let bundle = SignalBundle::assemble(
            DomainName::parse("acme.com").unwrap(),
            vec![SignalBlock::failed(SignalCategory::Email, "probe timed out after 15s")],
            at,
            1200,
        );

        let prompt = PromptBuilder::build_report_prompt(&bundle, &[], None);
        assert!(prompt.contains("Domain: acme.com"));
        assert!(prompt.contains("probe timed out after 15s"));
        assert!(prompt.contains("Report link: not provided"));
        for placeholder in ["{domain}", "{signals_json}", "{candidates_json}", "{context_url}"] {
            assert!(!prompt.contains(placeholder), "{placeholder} left in prompt");
        }
    }
}
