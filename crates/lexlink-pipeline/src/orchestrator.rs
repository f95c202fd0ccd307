//! Pipeline orchestrator
//!
//! Drives one batch through every stage:
//!
//! ```text
//! Configured → ExtractingRule → ExtractingLlm → Merging → Validating → Exporting → Done
//! ```
//!
//! Nothing after [`Pipeline::new`] can fail. Extractor problems cost links,
//! not the run; export problems are reported in the [`ExportReport`].
//! Cancellation stops extraction early and the run still merges, validates
//! and exports whatever was found.

use crate::export::{export_all, ArtifactPaths, ExportReport};
use crate::merge::merge_links;
use crate::{PipelineConfig, PipelineError, RunStatistics};
use lexlink_domain::{CaseParagraphInput, Completion, ExtractedLink, LlmProvider, ParagraphIndex};
use lexlink_extractor::{CostTracker, LlmAssistedExtractor, LlmExtraction, RuleBasedExtractor};
use lexlink_gatekeeper::{BatchValidator, QualityValidator, ValidationReport};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Stage of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Configuration validated, nothing run yet
    Configured,
    /// Rule-based extraction
    ExtractingRule,
    /// LLM-assisted extraction
    ExtractingLlm,
    /// Deduplicating links from both extractors
    Merging,
    /// Quality gate
    Validating,
    /// Writing artifacts
    Exporting,
    /// Finished
    Done,
}

impl Stage {
    /// Stable snake_case label
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Configured => "configured",
            Stage::ExtractingRule => "extracting_rule",
            Stage::ExtractingLlm => "extracting_llm",
            Stage::Merging => "merging",
            Stage::Validating => "validating",
            Stage::Exporting => "exporting",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider placeholder for a pipeline without a language model
///
/// Has no values, so a `Pipeline<RuleOnly>` can never make a model call.
#[derive(Debug, Clone, Copy)]
pub enum RuleOnly {}

#[async_trait::async_trait]
impl LlmProvider for RuleOnly {
    type Error = Infallible;

    async fn generate(&self, _prompt: &str) -> Result<Completion, Self::Error> {
        match *self {}
    }

    fn model_name(&self) -> &str {
        match *self {}
    }
}

/// Everything a run produced
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Links that passed the quality gate, sorted by key
    pub links: Vec<ExtractedLink>,
    /// Every merged link with its validation score
    pub report: ValidationReport,
    /// Run counters, as exported
    pub statistics: RunStatistics,
    /// Where each artifact went, or why it did not
    pub exports: ExportReport,
}

/// Batch orchestrator for extraction, merging, validation and export
///
/// # Examples
///
/// ```no_run
/// use lexlink_pipeline::{Pipeline, PipelineConfig};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(paragraphs: Vec<lexlink_domain::CaseParagraphInput>) -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = Pipeline::new(PipelineConfig::rule_only())?;
/// let outcome = pipeline.run(&paragraphs, &CancellationToken::new()).await;
/// println!("{}", outcome.statistics.summary());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<P = RuleOnly> {
    config: PipelineConfig,
    rule: RuleBasedExtractor,
    validator: BatchValidator,
    pool: Arc<rayon::ThreadPool>,
    provider: Option<Arc<P>>,
}

impl Pipeline {
    /// Validate the configuration and build a pipeline without a model
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;

        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("lexlink-rule-{}", i));
        if let Some(workers) = config.rule_workers {
            builder = builder.num_threads(workers);
        }
        let pool = builder.build()?;

        Ok(Self {
            rule: RuleBasedExtractor::new(config.rule.clone()),
            validator: BatchValidator::new(QualityValidator::new(config.validation.clone())),
            pool: Arc::new(pool),
            provider: None,
            config,
        })
    }
}

impl<P> Pipeline<P> {
    /// Use `provider` for the LLM-assisted phase
    pub fn with_provider<Q: LlmProvider>(self, provider: Q) -> Pipeline<Q> {
        Pipeline {
            config: self.config,
            rule: self.rule,
            validator: self.validator,
            pool: self.pool,
            provider: Some(Arc::new(provider)),
        }
    }

    /// The configuration this pipeline runs with
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl<P: LlmProvider> Pipeline<P> {
    /// Run the whole batch
    ///
    /// Never fails. If `cancel` fires, extraction stops early and the links
    /// found so far are still merged, validated and exported.
    pub async fn run(
        &self,
        paragraphs: &[CaseParagraphInput],
        cancel: &CancellationToken,
    ) -> PipelineOutcome {
        let mut stats = RunStatistics::new(paragraphs.len());
        let cost = Arc::new(CostTracker::new(
            self.config.llm.pricing,
            self.config.llm.budget_usd,
        ));
        info!(run_id = %stats.run_id, paragraphs = paragraphs.len(), stage = %Stage::Configured, "Pipeline run started");

        enter(Stage::ExtractingRule);
        let rule_links = self.extract_rule_based(paragraphs, cancel).await;
        stats.rule_based_links = rule_links.len();

        enter(Stage::ExtractingLlm);
        let llm = self.extract_llm(paragraphs, &cost, cancel).await;
        stats.llm_links = llm.links.len();
        stats.llm = llm.stats;
        stats.cost = cost.summary();

        enter(Stage::Merging);
        let merged = merge_links(rule_links, llm.links);
        stats.record_merged(&merged.links, merged.duplicates, merged.conflicts);
        info!(
            links = merged.links.len(),
            duplicates = merged.duplicates,
            conflicts = merged.conflicts,
            "Merge complete"
        );

        enter(Stage::Validating);
        let index = ParagraphIndex::new(paragraphs);
        let report = self.validator.validate_and_report(merged.links, &index);
        let failed = self.validator.failed_for_review(&report, &index);
        stats.validation = report.stats.clone();

        stats.cancelled = cancel.is_cancelled();
        if stats.cancelled {
            warn!(run_id = %stats.run_id, "Run cancelled, exporting partial results");
        }
        stats.finish();

        enter(Stage::Exporting);
        let paths = ArtifactPaths::for_run(&self.config.output_dir, stats.run_id);
        let exports = export_all(&paths, report.passing(), &failed, &stats);
        for (artifact, error) in exports.failures() {
            warn!(artifact, error, "Artifact not written");
        }

        enter(Stage::Done);
        info!("{}", stats.summary());

        let links = report.passing().map(|v| v.link.clone()).collect();
        PipelineOutcome {
            links,
            report,
            statistics: stats,
            exports,
        }
    }

    async fn extract_rule_based(
        &self,
        paragraphs: &[CaseParagraphInput],
        cancel: &CancellationToken,
    ) -> Vec<ExtractedLink> {
        if !self.config.enable_rule_based {
            debug!("Rule-based extraction disabled");
            return Vec::new();
        }
        if cancel.is_cancelled() {
            return Vec::new();
        }

        let extractor = self.rule.clone();
        let pool = Arc::clone(&self.pool);
        let batch = paragraphs.to_vec();
        let joined = tokio::task::spawn_blocking(move || {
            pool.install(|| extractor.extract_batch(&batch))
        })
        .await;

        match joined {
            Ok(links) => {
                info!(
                    links = links.len(),
                    workers = self.pool.current_num_threads(),
                    "Rule-based extraction complete"
                );
                links
            }
            Err(e) => {
                warn!(error = %e, "Rule-based extraction aborted, continuing without its links");
                Vec::new()
            }
        }
    }

    async fn extract_llm(
        &self,
        paragraphs: &[CaseParagraphInput],
        cost: &Arc<CostTracker>,
        cancel: &CancellationToken,
    ) -> LlmExtraction {
        if !self.config.enable_llm {
            debug!("LLM-assisted extraction disabled");
            return LlmExtraction::default();
        }
        let Some(provider) = &self.provider else {
            warn!("LLM-assisted extraction enabled but no provider configured, skipping");
            return LlmExtraction::default();
        };

        let extractor = match LlmAssistedExtractor::new(
            Arc::clone(provider),
            self.config.llm.clone(),
            Arc::clone(cost),
        ) {
            Ok(extractor) => extractor,
            Err(e) => {
                warn!(error = %e, "LLM-assisted extraction misconfigured, skipping");
                return LlmExtraction::default();
            }
        };
        let extraction = extractor.extract_batch(paragraphs, cancel).await;
        info!(cost = %cost.summary(), "LLM usage");
        extraction
    }
}

fn enter(stage: Stage) {
    debug!(stage = %stage, "Entering stage");
}
