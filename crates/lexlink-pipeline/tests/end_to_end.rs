//! End-to-end pipeline runs against a mock model

use lexlink_domain::{
    Authority, CaseMetadata, CaseParagraphInput, ExtractionMethod, InterpretationType,
    ParagraphIndex,
};
use lexlink_gatekeeper::{Check, QualityValidator};
use lexlink_llm::MockProvider;
use lexlink_pipeline::{Pipeline, PipelineConfig};
use std::collections::BTreeSet;
use std::fs;
use tokio_util::sync::CancellationToken;

const LIM_V_SPH: &str = "In Lim v SPH [2015] SGCA 33, the Court of Appeal held that s.7 of the \
                         Defamation Act requires proof of positive public benefit, narrowing the \
                         prior broad reading.";

const NO_STATUTE: &str = "The appellant's counsel addressed the court at length on the chronology \
                          of the dispute and the correspondence exchanged between the parties \
                          before the writ was filed.";

const BARE_ACT: &str = "The defendant relied on s.7 of the Act.";

fn config(dir: &tempfile::TempDir) -> PipelineConfig {
    let mut config = PipelineConfig::default().with_output_dir(dir.path());
    config.llm.initial_backoff_ms = 1;
    config.llm.max_backoff_ms = 5;
    config
}

fn paragraph(case_id: &str, number: u32, text: &str) -> CaseParagraphInput {
    CaseParagraphInput::new(case_id, number, text, CaseMetadata::new("SGCA"))
}

#[tokio::test]
async fn test_holding_paragraph_yields_binding_narrow_link() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config(&dir)).unwrap();
    let paragraphs = vec![paragraph("lim-v-sph", 33, LIM_V_SPH)];

    let outcome = pipeline.run(&paragraphs, &CancellationToken::new()).await;

    assert_eq!(outcome.links.len(), 1);
    let link = &outcome.links[0];
    assert_eq!(link.statute_id().to_string(), "Defamation Act§7");
    assert_eq!(link.authority(), Authority::Binding);
    assert_eq!(link.interpretation_type(), InterpretationType::Narrow);
    assert!(link.holding().is_some_and(|h| !h.is_empty()));
    assert!((0.85..=0.95).contains(&link.confidence()));
    assert_eq!(link.method(), ExtractionMethod::RuleBased);
}

#[tokio::test]
async fn test_paragraph_without_statute_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut provider = MockProvider::default();
    provider.add_response("chronology", r#"{"has_interpretation": false}"#);
    let pipeline = Pipeline::new(config(&dir))
        .unwrap()
        .with_provider(provider.clone());
    let paragraphs = vec![paragraph("tan-v-ong", 4, NO_STATUTE)];

    let outcome = pipeline.run(&paragraphs, &CancellationToken::new()).await;

    assert!(outcome.links.is_empty());
    assert!(outcome.report.results.is_empty());
    assert_eq!(outcome.statistics.rule_based_links, 0);
    assert_eq!(outcome.statistics.llm_links, 0);
}

#[tokio::test]
async fn test_bare_act_reference_yields_no_rule_link() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(PipelineConfig::rule_only().with_output_dir(dir.path())).unwrap();
    let paragraphs = vec![paragraph("koh-v-lee", 12, BARE_ACT)];

    let outcome = pipeline.run(&paragraphs, &CancellationToken::new()).await;

    assert_eq!(outcome.statistics.rule_based_links, 0);
    assert!(outcome.links.is_empty());
}

#[tokio::test]
async fn test_unmentioned_statute_fails_and_goes_to_review() {
    let dir = tempfile::tempdir().unwrap();
    let mut provider = MockProvider::default();
    provider.add_response(
        "positive public benefit",
        r#"```json
        [{"statute_name": "Evidence Act", "section": "32", "interpretation_type": "clarify", "confidence": 0.8}]
        ```"#,
    );
    let pipeline = Pipeline::new(config(&dir))
        .unwrap()
        .with_provider(provider);
    let paragraphs = vec![paragraph("lim-v-sph", 33, LIM_V_SPH)];

    let outcome = pipeline.run(&paragraphs, &CancellationToken::new()).await;

    let evidence = outcome
        .report
        .results
        .iter()
        .find(|v| v.link.statute_id().to_string() == "Evidence Act§32")
        .expect("model link validated");
    assert!(!evidence.validation.passed);
    assert_eq!(
        evidence.validation.check(Check::StatuteMentioned).map(|c| c.score),
        Some(0.0)
    );
    assert!(outcome
        .links
        .iter()
        .all(|l| l.statute_id().to_string() != "Evidence Act§32"));

    let failed_path = outcome.exports.failed_review.path();
    let failed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(failed_path).unwrap()).unwrap();
    assert_eq!(failed.as_array().unwrap().len(), 1);
    assert_eq!(failed[0]["statute_id"], "Evidence Act§32");
}

#[tokio::test]
async fn test_exports_partition_validated_links() {
    let dir = tempfile::tempdir().unwrap();
    let mut provider = MockProvider::default();
    provider.add_response(
        "positive public benefit",
        r#"{"links": [
            {"statute_name": "Defamation Act", "section": "7", "interpretation_type": "narrow",
             "confidence": 0.8, "fact_pattern_tags": ["Newspaper", "public figure"]},
            {"statute_name": "Companies Act", "section": "216", "confidence": 0.7}
        ]}"#,
    );
    let pipeline = Pipeline::new(config(&dir))
        .unwrap()
        .with_provider(provider);
    let paragraphs = vec![
        paragraph("lim-v-sph", 33, LIM_V_SPH),
        paragraph("tan-v-ong", 4, NO_STATUTE),
    ];

    let outcome = pipeline.run(&paragraphs, &CancellationToken::new()).await;
    assert!(outcome.exports.all_written());

    let merged = outcome
        .links
        .iter()
        .find(|l| l.statute_id().to_string() == "Defamation Act§7")
        .expect("merged link accepted");
    assert_eq!(merged.method(), ExtractionMethod::Merged);
    let tags: BTreeSet<&str> = merged.fact_pattern_tags().iter().map(String::as_str).collect();
    assert_eq!(tags, BTreeSet::from(["newspaper", "public figure"]));

    // Accepted links and review records partition the validated set
    let accepted = fs::read_to_string(outcome.exports.links.path()).unwrap();
    let accepted_count = accepted.lines().filter(|l| !l.trim().is_empty()).count();
    let failed: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(outcome.exports.failed_review.path()).unwrap())
            .unwrap();
    assert_eq!(accepted_count, outcome.links.len());
    assert_eq!(accepted_count + failed.len(), outcome.report.results.len());
    assert_eq!(failed.len(), outcome.report.failing().count());

    // The accepted set is exactly what filter_passing keeps
    let validator = QualityValidator::new(pipeline.config().validation.clone());
    let all_links: Vec<_> = outcome.report.results.iter().map(|v| v.link.clone()).collect();
    let passing = validator.filter_passing(all_links, &ParagraphIndex::new(&paragraphs));
    assert_eq!(passing, outcome.links);

    let stats: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(outcome.exports.statistics.path()).unwrap())
            .unwrap();
    assert_eq!(stats["paragraphs"], 2);
    assert_eq!(stats["links_by_method"]["merged"], 1);
    assert_eq!(stats["cost"]["calls"], 1);
}

#[tokio::test]
async fn test_exhausted_budget_keeps_rule_links() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir);
    config.llm.budget_usd = Some(0.0);
    let provider = MockProvider::default();
    let pipeline = Pipeline::new(config).unwrap().with_provider(provider.clone());
    let paragraphs = vec![paragraph("lim-v-sph", 33, LIM_V_SPH)];

    let outcome = pipeline.run(&paragraphs, &CancellationToken::new()).await;

    assert_eq!(provider.call_count(), 0);
    assert_eq!(outcome.statistics.llm.refused, 1);
    assert!(outcome.statistics.cost.budget_exhausted);
    assert_eq!(outcome.links.len(), 1);
    assert_eq!(outcome.links[0].method(), ExtractionMethod::RuleBased);
}

#[tokio::test]
async fn test_failing_model_drops_only_its_contribution() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir);
    config.llm.max_attempts = 2;
    let mut provider = MockProvider::default();
    provider.add_error("positive public benefit");
    let pipeline = Pipeline::new(config).unwrap().with_provider(provider.clone());
    let paragraphs = vec![paragraph("lim-v-sph", 33, LIM_V_SPH)];

    let outcome = pipeline.run(&paragraphs, &CancellationToken::new()).await;

    assert_eq!(provider.call_count(), 2);
    assert_eq!(outcome.statistics.llm.failed, 1);
    assert_eq!(outcome.statistics.cost.failed_calls, 2);
    assert_eq!(outcome.links.len(), 1);
    assert_eq!(outcome.links[0].method(), ExtractionMethod::RuleBased);
}
