//! Batch validation reporting and failed-link export

use crate::validator::{Check, QualityValidator, ValidatedLink};
use crate::GatekeeperError;
use lexlink_domain::{ExtractedLink, ExtractionMethod, ParagraphIndex, StatuteId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// At most this many failing links are listed in the text summary
const SUMMARY_FAILURE_LIMIT: usize = 10;

/// Aggregate statistics for a validated batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    /// Links validated
    pub total: usize,
    /// Links that passed validation
    pub passed: usize,
    /// Links that failed validation
    pub failed: usize,
    /// `passed / total`, 0 for an empty batch
    pub pass_rate: f64,
    /// Mean aggregate score
    pub avg_score: f64,
    /// Mean link confidence
    pub avg_confidence: f64,
    /// How often each check missed full marks
    pub failures_by_check: BTreeMap<Check, usize>,
}

/// Validated links plus their statistics
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Every link with its score, in input order
    pub results: Vec<ValidatedLink>,
    /// Batch statistics
    pub stats: ValidationStats,
}

impl ValidationReport {
    /// Build a report from validated links
    pub fn new(results: Vec<ValidatedLink>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|v| v.validation.passed).count();
        let mean = |sum: f64| if total == 0 { 0.0 } else { sum / total as f64 };

        let mut failures_by_check = BTreeMap::new();
        for failed in results.iter().flat_map(|v| v.validation.failed_checks()) {
            *failures_by_check.entry(failed.check).or_insert(0) += 1;
        }

        let stats = ValidationStats {
            total,
            passed,
            failed: total - passed,
            pass_rate: mean(passed as f64),
            avg_score: mean(results.iter().map(|v| v.validation.aggregate).sum()),
            avg_confidence: mean(results.iter().map(|v| v.link.confidence()).sum()),
            failures_by_check,
        };
        Self { results, stats }
    }

    /// Links that passed
    pub fn passing(&self) -> impl Iterator<Item = &ValidatedLink> {
        self.results.iter().filter(|v| v.validation.passed)
    }

    /// Links that failed
    pub fn failing(&self) -> impl Iterator<Item = &ValidatedLink> {
        self.results.iter().filter(|v| !v.validation.passed)
    }

    /// Consume the report, keeping the passing links
    pub fn into_passing_links(self) -> Vec<ExtractedLink> {
        self.results
            .into_iter()
            .filter(|v| v.validation.passed)
            .map(|v| v.link)
            .collect()
    }

    /// Human-readable report
    pub fn summary(&self) -> String {
        let s = &self.stats;
        let rule = "=".repeat(70);
        let mut out = format!(
            "{rule}\nINTERPRETATION LINK QUALITY VALIDATION REPORT\n{rule}\n\
             Total Links: {}\n\
             Passed: {} ({:.1}%)\n\
             Failed: {} ({:.1}%)\n\
             Average Score: {:.2}\n\
             Average Confidence: {:.2}\n",
            s.total,
            s.passed,
            s.pass_rate * 100.0,
            s.failed,
            if s.total == 0 { 0.0 } else { (1.0 - s.pass_rate) * 100.0 },
            s.avg_score,
            s.avg_confidence,
        );

        if !s.failures_by_check.is_empty() {
            out.push_str("\nCheck failures:\n");
            for (check, count) in &s.failures_by_check {
                out.push_str(&format!("  {}: {}\n", check, count));
            }
        }

        if s.failed > 0 {
            out.push_str("\nFailed Links:\n");
            for failed in self.failing().take(SUMMARY_FAILURE_LIMIT) {
                out.push_str(&format!(
                    "\n  {} → {}\n  Score: {:.2}\n",
                    failed.link.statute_id(),
                    failed.link.paragraph(),
                    failed.validation.aggregate
                ));
                for check in failed.validation.failed_checks() {
                    out.push_str(&format!("    ✗ {}: {}\n", check.check, check.detail));
                }
            }
            if s.failed > SUMMARY_FAILURE_LIMIT {
                out.push_str(&format!("\n  ... and {} more\n", s.failed - SUMMARY_FAILURE_LIMIT));
            }
        }

        out.push_str(&rule);
        out
    }
}

/// One failed check in the review export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckFailure {
    /// Which check
    pub check: Check,
    /// Its sub-score
    pub score: f64,
    /// Explanation
    pub details: String,
}

/// A failing link as exported for manual review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedReview {
    /// Statute identifier
    pub statute_id: StatuteId,
    /// Case identifier
    pub case_id: String,
    /// Paragraph number
    pub paragraph_number: u32,
    /// Extraction method
    pub method: ExtractionMethod,
    /// Aggregate score
    pub score: f64,
    /// Checks without full marks
    pub failed_checks: Vec<CheckFailure>,
    /// Leading excerpt of the source paragraph, if it was available
    pub case_text: Option<String>,
    /// Holding, if any
    pub holding: Option<String>,
}

/// Wraps a [`QualityValidator`] for batch reporting and review export
#[derive(Debug, Clone, Default)]
pub struct BatchValidator {
    validator: QualityValidator,
}

impl BatchValidator {
    /// Create a batch validator
    pub fn new(validator: QualityValidator) -> Self {
        Self { validator }
    }

    /// The underlying validator
    pub fn validator(&self) -> &QualityValidator {
        &self.validator
    }

    /// Validate links and compute statistics
    pub fn validate_and_report(
        &self,
        links: impl IntoIterator<Item = ExtractedLink>,
        paragraphs: &ParagraphIndex<'_>,
    ) -> ValidationReport {
        let report = ValidationReport::new(self.validator.validate_batch(links, paragraphs));
        info!(
            total = report.stats.total,
            passed = report.stats.passed,
            failed = report.stats.failed,
            pass_rate = report.stats.pass_rate,
            "Validation complete"
        );
        report
    }

    /// Review records for every failing link in `report`
    pub fn failed_for_review(&self, report: &ValidationReport, paragraphs: &ParagraphIndex<'_>) -> Vec<FailedReview> {
        let excerpt_chars = self.validator.config().review_excerpt_chars;
        report
            .failing()
            .map(|failed| {
                let link = &failed.link;
                FailedReview {
                    statute_id: link.statute_id().clone(),
                    case_id: link.paragraph().case_id.clone(),
                    paragraph_number: link.paragraph().paragraph_number,
                    method: link.method(),
                    score: failed.validation.aggregate,
                    failed_checks: failed
                        .validation
                        .failed_checks()
                        .map(|c| CheckFailure {
                            check: c.check,
                            score: c.score,
                            details: c.detail.clone(),
                        })
                        .collect(),
                    case_text: paragraphs
                        .get(link.paragraph())
                        .map(|p| excerpt(p.text(), excerpt_chars)),
                    holding: link.holding().map(str::to_string),
                }
            })
            .collect()
    }

    /// Export failing links as a JSON array for manual review
    ///
    /// Returns the number of links written.
    pub fn export_failed_for_review(
        &self,
        report: &ValidationReport,
        paragraphs: &ParagraphIndex<'_>,
        output_path: impl AsRef<Path>,
    ) -> Result<usize, GatekeeperError> {
        let records = self.failed_for_review(report, paragraphs);
        let mut writer = BufWriter::new(File::create(output_path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writer.flush()?;

        info!(
            count = records.len(),
            path = %output_path.as_ref().display(),
            "Exported failed links for review"
        );
        Ok(records.len())
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexlink_domain::{
        Authority, CaseMetadata, CaseParagraphInput, InterpretationType, LinkDraft, ParagraphRef,
    };

    const LIM: &str = "In Lim v SPH [2015] SGCA 33, the Court of Appeal held that s.7 of the \
                       Defamation Act requires proof of positive public benefit, narrowing the \
                       prior broad reading.";

    fn link(statute: &str, n: u32) -> ExtractedLink {
        ExtractedLink::new(LinkDraft {
            statute_id: StatuteId::parse(statute).unwrap(),
            paragraph: ParagraphRef::new("lim-v-sph", n),
            interpretation_type: InterpretationType::Narrow,
            authority: Authority::Binding,
            confidence: 0.9,
            boost_factor: 0.95,
            method: ExtractionMethod::RuleBased,
            holding: Some("The Court of Appeal held that s.7 requires proof.".to_string()),
            fact_pattern_tags: Vec::new(),
        })
        .unwrap()
    }

    fn paragraphs() -> Vec<CaseParagraphInput> {
        vec![
            CaseParagraphInput::new("lim-v-sph", 33, LIM, CaseMetadata::new("SGCA")),
            CaseParagraphInput::new("lim-v-sph", 34, LIM.repeat(3), CaseMetadata::new("SGCA")),
        ]
    }

    fn report() -> (BatchValidator, ValidationReport, Vec<CaseParagraphInput>) {
        let paragraphs = paragraphs();
        let batch = BatchValidator::default();
        let report = batch.validate_and_report(
            vec![link("Defamation Act§7", 33), link("Evidence Act§32", 33), link("Penal Code§300", 34)],
            &ParagraphIndex::new(&paragraphs),
        );
        (batch, report, paragraphs)
    }

    #[test]
    fn test_report_statistics() {
        let (_, report, _) = report();
        let stats = &report.stats;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.failed, 2);
        assert!((stats.pass_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((stats.avg_confidence - 0.9).abs() < 1e-9);
        assert_eq!(stats.failures_by_check.get(&Check::StatuteMentioned), Some(&2));
    }

    #[test]
    fn test_passing_and_failing_partition() {
        let (_, report, _) = report();
        assert_eq!(report.passing().count() + report.failing().count(), report.results.len());
        let passing = report.clone().into_passing_links();
        assert_eq!(passing, vec![link("Defamation Act§7", 33)]);
    }

    #[test]
    fn test_summary_lists_failures() {
        let (_, report, _) = report();
        let summary = report.summary();
        assert!(summary.contains("Total Links: 3"));
        assert!(summary.contains("Evidence Act§32"));
        assert!(summary.contains("✗ statute_mentioned"));
    }

    #[test]
    fn test_empty_report() {
        let report = ValidationReport::new(Vec::new());
        assert_eq!(report.stats.pass_rate, 0.0);
        assert!(report.summary().contains("Total Links: 0"));
    }

    #[test]
    fn test_failed_for_review_matches_failing_set() {
        let (batch, report, paragraphs) = report();
        let index = ParagraphIndex::new(&paragraphs);
        let review = batch.failed_for_review(&report, &index);

        let failing: Vec<_> = report.failing().map(|v| v.link.statute_id().clone()).collect();
        let exported: Vec<_> = review.iter().map(|r| r.statute_id.clone()).collect();
        assert_eq!(failing, exported);

        let long = review.iter().find(|r| r.paragraph_number == 34).unwrap();
        let text = long.case_text.as_deref().unwrap();
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), 203);
        assert!(long.failed_checks.iter().any(|c| c.check == Check::StatuteMentioned));
    }

    #[test]
    fn test_export_failed_for_review() {
        let (batch, report, paragraphs) = report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed.json");

        let written = batch
            .export_failed_for_review(&report, &ParagraphIndex::new(&paragraphs), &path)
            .unwrap();
        assert_eq!(written, 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<FailedReview> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].statute_id.to_string(), "Evidence Act§32");
        assert!(contents.contains("\"statute_mentioned\""));
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let (batch, report, paragraphs) = report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("failed.json");
        let result = batch.export_failed_for_review(&report, &ParagraphIndex::new(&paragraphs), &path);
        assert!(matches!(result, Err(GatekeeperError::Io(_))));
    }
}
