//! Statistics collected during a pipeline run

use chrono::{DateTime, Utc};
use lexlink_domain::{ExtractedLink, ExtractionMethod};
use lexlink_extractor::{CostSummary, LlmExtractionStats};
use lexlink_gatekeeper::ValidationStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Counters for one run, exported as the statistics artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Run identifier (UUIDv7, so runs sort by start time)
    pub run_id: Uuid,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished, if it has
    pub finished_at: Option<DateTime<Utc>>,

    /// Paragraphs in the batch
    pub paragraphs: usize,

    /// Links produced by the rule-based extractor
    pub rule_based_links: usize,

    /// Links produced by the LLM-assisted extractor
    pub llm_links: usize,

    /// Links after merging, per method
    pub links_by_method: BTreeMap<ExtractionMethod, usize>,

    /// Keys produced more than once
    pub duplicates: usize,

    /// Keys whose sources disagreed
    pub conflicts: usize,

    /// Pass/fail counts from the quality gate
    pub validation: ValidationStats,

    /// LLM-assisted batch counters
    pub llm: LlmExtractionStats,

    /// Model usage and spend
    pub cost: CostSummary,

    /// Whether the run was cancelled before finishing
    pub cancelled: bool,
}

impl RunStatistics {
    /// Start statistics for a new run
    pub fn new(paragraphs: usize) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            started_at: Utc::now(),
            finished_at: None,
            paragraphs,
            rule_based_links: 0,
            llm_links: 0,
            links_by_method: BTreeMap::new(),
            duplicates: 0,
            conflicts: 0,
            validation: ValidationStats::default(),
            llm: LlmExtractionStats::default(),
            cost: CostSummary::default(),
            cancelled: false,
        }
    }

    /// Record the merged link set
    pub fn record_merged(&mut self, links: &[ExtractedLink], duplicates: usize, conflicts: usize) {
        self.links_by_method.clear();
        for link in links {
            *self.links_by_method.entry(link.method()).or_insert(0) += 1;
        }
        self.duplicates = duplicates;
        self.conflicts = conflicts;
    }

    /// Mark the run finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Links after merging
    pub fn total_links(&self) -> usize {
        self.links_by_method.values().sum()
    }

    /// Wall-clock duration in seconds, once finished
    pub fn duration_secs(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    /// Generate a summary report of the run
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Pipeline Run Summary".to_string(),
            "====================".to_string(),
            format!("Run: {}", self.run_id),
            format!("Paragraphs: {}", self.paragraphs),
        ];
        if let Some(secs) = self.duration_secs() {
            lines.push(format!("Duration: {:.1}s", secs));
        }
        if self.cancelled {
            lines.push("Status: cancelled (partial results)".to_string());
        }
        lines.push(String::new());

        lines.push("Extraction:".to_string());
        lines.push(format!("  Rule-based links: {}", self.rule_based_links));
        lines.push(format!("  LLM-assisted links: {}", self.llm_links));
        lines.push(format!(
            "  LLM paragraphs: {} screened, {} pre-filtered, {} failed, {} refused",
            self.llm.screened, self.llm.prefiltered_out, self.llm.failed, self.llm.refused
        ));
        lines.push(String::new());

        lines.push(format!("Merged links: {}", self.total_links()));
        for (method, count) in &self.links_by_method {
            lines.push(format!("  {}: {}", method, count));
        }
        lines.push(format!("  Duplicates: {}", self.duplicates));
        lines.push(format!("  Conflicts: {}", self.conflicts));
        lines.push(String::new());

        lines.push(format!(
            "Validation: {} passed, {} failed ({:.1}% pass rate)",
            self.validation.passed,
            self.validation.failed,
            self.validation.pass_rate * 100.0
        ));
        lines.push(format!("LLM cost: {}", self.cost));

        lines.join("\n")
    }
}
