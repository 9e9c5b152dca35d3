//! Report synthesis against a scripted provider

mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::{MockLlmProvider, acme, acme_bundle, model_answer, weak_email_block};
use itreality_core::config::LlmConfig;
use itreality_core::domain::{
    CAVEAT_MARKER, Confidence, DomainName, SignalBundle, SignalCategory, UNVERIFIED_PREFIX,
    is_qualified,
};
use itreality_llm::domain::codes;
use itreality_llm::prompts::PromptBuilder;
use itreality_llm::{LlmError, ReportSynthesizer, SynthesisError, derive_candidates};

fn synthesizer(provider: &Arc<MockLlmProvider>) -> ReportSynthesizer {
    ReportSynthesizer::new(provider.clone(), LlmConfig::default())
}

fn answer_without(category: &str) -> String {
    let mut answer: serde_json::Value = serde_json::from_str(&model_answer(&[])).unwrap();
    answer["block_narratives"]
        .as_array_mut()
        .unwrap()
        .retain(|n| n["category"] != category);
    answer.to_string()
}

#[tokio::test]
async fn test_acme_scenario_propagates_confidence() {
    let bundle = acme_bundle();
    assert_eq!(bundle.block(SignalCategory::Dns).confidence, Confidence::High);
    assert_eq!(bundle.block(SignalCategory::Email).confidence, Confidence::Low);
    assert!(bundle.block(SignalCategory::Email).error.is_some());
    assert_eq!(bundle.block(SignalCategory::Tls).confidence, Confidence::High);

    let provider = Arc::new(MockLlmProvider::with_json_response(&model_answer(&[
        codes::EMAIL_AUTH_UNVERIFIED,
        codes::CERT_EXPIRING_SOON,
    ])));
    let report = synthesizer(&provider)
        .generate_report(&acme(), &bundle, Some("https://itreality.example/r/acme"))
        .await
        .unwrap();

    let ranked: Vec<&str> = report
        .top_findings
        .iter()
        .map(|f| f.finding_code.as_str())
        .collect();
    assert_eq!(
        ranked,
        vec![codes::CERT_EXPIRING_SOON, codes::EMAIL_AUTH_UNVERIFIED]
    );

    let expiry = &report.top_findings[0];
    assert_eq!(expiry.confidence, Confidence::High);
    assert_eq!(expiry.description, "Model description for CERT_EXPIRING_SOON.");

    let email_finding = &report.top_findings[1];
    assert_eq!(email_finding.confidence, Confidence::Low);
    assert!(email_finding.description.starts_with(UNVERIFIED_PREFIX));

    let email = report.narrative(SignalCategory::Email).unwrap();
    assert_eq!(email.confidence, Confidence::Low);
    let note = email.confidence_note.as_deref().unwrap();
    assert!(note.starts_with(CAVEAT_MARKER));
    assert!(note.contains("probe timed out after 15s"));

    let tls = report.narrative(SignalCategory::Tls).unwrap();
    assert_eq!(tls.confidence, Confidence::High);
    assert!(tls.confidence_note.is_none());

    assert_eq!(report.block_narratives.len(), SignalCategory::ALL.len());
    assert_eq!(report.model, "test-model");
    assert_eq!(
        report.context_url.as_deref(),
        Some("https://itreality.example/r/acme")
    );
    assert!(
        report
            .assumptions
            .iter()
            .any(|a| a.contains("Email authentication"))
    );

    let requests = provider.captured_requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].json_mode);
    assert!(requests[0].messages[1].content.contains(codes::CERT_EXPIRING_SOON));
}

/// Model answer that states email facts flatly although the lookup failed
fn assertive_email_answer() -> String {
    let mut answer: serde_json::Value =
        serde_json::from_str(&model_answer(&[codes::EMAIL_AUTH_UNVERIFIED])).unwrap();
    answer["top_findings"][0]["title"] = "You have no DMARC record".into();
    answer["top_findings"][0]["description"] = "Anyone can send mail as acme.com.".into();
    for narrative in answer["block_narratives"].as_array_mut().unwrap() {
        if narrative["category"] == "email" {
            narrative["explanation"] =
                "acme.com has no DMARC record and anyone can spoof it.".into();
        }
    }
    answer.to_string()
}

#[tokio::test]
async fn test_low_confidence_text_is_always_qualified() {
    let bundle = acme_bundle();
    let provider = Arc::new(MockLlmProvider::with_json_response(&assertive_email_answer()));
    let report = synthesizer(&provider)
        .generate_report(&acme(), &bundle, None)
        .await
        .unwrap();

    for finding in &report.top_findings {
        let block = bundle.block(finding.category);
        assert!(finding.confidence <= block.confidence);
        if finding.confidence == Confidence::Low {
            assert!(is_qualified(&finding.title), "{finding:?}");
            assert!(is_qualified(&finding.description), "{finding:?}");
        }
    }
    for narrative in &report.block_narratives {
        let block = bundle.block(narrative.category);
        assert_eq!(narrative.confidence, block.confidence);
        if block.needs_caveat() {
            let note = narrative.confidence_note.as_deref().unwrap_or_default();
            assert!(note.starts_with(CAVEAT_MARKER), "{narrative:?}");
            assert!(is_qualified(&narrative.explanation), "{narrative:?}");
        }
    }

    let email = report
        .top_findings
        .iter()
        .find(|f| f.finding_code == codes::EMAIL_AUTH_UNVERIFIED)
        .unwrap();
    assert_eq!(email.title, format!("{UNVERIFIED_PREFIX}You have no DMARC record"));
    assert_eq!(
        report.narrative(SignalCategory::Email).unwrap().explanation,
        format!("{CAVEAT_MARKER} acme.com has no DMARC record and anyone can spoof it.")
    );
}

#[tokio::test]
async fn test_high_confidence_prose_is_left_alone() {
    let provider = Arc::new(MockLlmProvider::with_json_response(&assertive_email_answer()));
    let report = synthesizer(&provider)
        .generate_report(&acme(), &acme_bundle(), None)
        .await
        .unwrap();

    let tls = report.narrative(SignalCategory::Tls).unwrap();
    assert_eq!(tls.explanation, "What we saw for tls.");
}

#[tokio::test]
async fn test_omitted_candidate_falls_back_to_deterministic_text() {
    let provider = Arc::new(MockLlmProvider::with_json_response(&model_answer(&[])));
    let report = synthesizer(&provider)
        .generate_report(&acme(), &acme_bundle(), None)
        .await
        .unwrap();

    assert_eq!(report.top_findings[0].title, "Website certificate expires soon");
    assert!(report.top_findings[0].description.contains("expires in 12 days"));
}

#[tokio::test]
async fn test_ranking_is_stable_across_runs() {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let domain = DomainName::parse("example.com").unwrap();
    let bundle = SignalBundle::assemble(domain.clone(), vec![weak_email_block()], at, 700);

    let mut rankings = Vec::new();
    for picks in [
        vec![codes::TLS_UNAVAILABLE],
        vec![codes::SPF_MISSING, codes::DMARC_NOT_ENFORCING],
        vec![],
    ] {
        let provider = Arc::new(MockLlmProvider::with_json_response(&model_answer(&picks)));
        let report = synthesizer(&provider)
            .generate_report(&domain, &bundle, None)
            .await
            .unwrap();
        rankings.push(
            report
                .top_findings
                .iter()
                .map(|f| (f.finding_code.clone(), f.confidence))
                .collect::<Vec<_>>(),
        );
    }

    assert_eq!(rankings[0], rankings[1]);
    assert_eq!(rankings[1], rankings[2]);
    assert_eq!(rankings[0].len(), 3);
}

#[tokio::test]
async fn test_missing_narrative_fails_validation() {
    let provider = Arc::new(MockLlmProvider::with_json_response(&answer_without("tls")));
    let outcome = synthesizer(&provider)
        .generate_outcome(&acme(), &acme_bundle(), None)
        .await;

    insta::assert_json_snapshot!(outcome, @r#"
    {
      "success": false,
      "error": "report failed schema validation: missing narrative for tls"
    }
    "#);
}

#[tokio::test]
async fn test_invented_finding_code_fails_validation() {
    let provider = Arc::new(MockLlmProvider::with_json_response(&model_answer(&[
        "OPEN_RDP_PORT",
    ])));
    let err = synthesizer(&provider)
        .generate_report(&acme(), &acme_bundle(), None)
        .await
        .unwrap_err();

    match err {
        SynthesisError::SchemaValidation(problems) => {
            assert_eq!(problems, vec!["unknown finding code \"OPEN_RDP_PORT\""]);
        }
        other => panic!("expected schema validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fenced_answer_is_accepted() {
    let fenced = format!("Here you go:\n```json\n{}\n```", model_answer(&[]));
    let provider = Arc::new(MockLlmProvider::with_json_response(&fenced));
    let report = synthesizer(&provider)
        .generate_report(&acme(), &acme_bundle(), None)
        .await;
    assert!(report.is_ok());
}

#[tokio::test]
async fn test_unparseable_answer_is_parse_error() {
    let provider = Arc::new(MockLlmProvider::with_json_response(
        "I'm sorry, I can't write that report.",
    ));
    let err = synthesizer(&provider)
        .generate_report(&acme(), &acme_bundle(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SynthesisError::Parse(_)));
}

#[tokio::test]
async fn test_provider_error_is_surfaced() {
    let provider = Arc::new(MockLlmProvider::with_error(LlmError::auth("bad key")));
    let err = synthesizer(&provider)
        .generate_report(&acme(), &acme_bundle(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SynthesisError::Provider(LlmError::Authentication(_))
    ));
}

#[tokio::test]
async fn test_domain_mismatch_is_rejected_before_generation() {
    let provider = Arc::new(MockLlmProvider::with_json_response(&model_answer(&[])));
    let other = DomainName::parse("other.org").unwrap();
    let err = synthesizer(&provider)
        .generate_report(&other, &acme_bundle(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, SynthesisError::DomainMismatch { .. }));
    assert_eq!(provider.calls().await, 0);
}

#[test]
fn test_acme_candidates_prompt_snapshot() {
    let candidates = derive_candidates(&acme_bundle());
    insta::assert_json_snapshot!(PromptBuilder::candidates_json(&candidates), @r#"
    [
      {
        "category": "tls",
        "confidence": "high",
        "finding_code": "CERT_EXPIRING_SOON",
        "severity": "medium",
        "summary": "The certificate for acme.com expires in 12 days. If it is not renewed, visitors will see a security warning."
      },
      {
        "category": "email",
        "confidence": "low",
        "finding_code": "EMAIL_AUTH_UNVERIFIED",
        "severity": "medium",
        "summary": "We could not look up the SPF, DKIM or DMARC records for acme.com, so we cannot say whether others can send email pretending to be you."
      }
    ]
    "#);
}
