//! Lexlink Pipeline
//!
//! Batch orchestration for interpretation link extraction.
//!
//! # Overview
//!
//! A run takes a batch of case paragraphs and:
//! - **Extracts** candidate links with the rule-based extractor on a rayon
//!   pool, then with the LLM-assisted extractor when a provider is attached
//! - **Merges** both link sets by `(statute_id, case_id, paragraph_number)`,
//!   rule-based fields taking precedence and fact-pattern tags unioned
//! - **Validates** every merged link through the gatekeeper
//! - **Exports** accepted links, failed links for review, and run statistics
//!
//! # Usage
//!
//! ```no_run
//! use lexlink_domain::{CaseMetadata, CaseParagraphInput};
//! use lexlink_pipeline::{Pipeline, PipelineConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let paragraphs = vec![CaseParagraphInput::new(
//!         "lim-v-sph",
//!         33,
//!         "The Court of Appeal held that s.7 of the Defamation Act requires proof of \
//!          positive public benefit, narrowing the prior broad reading.",
//!         CaseMetadata::new("SGCA"),
//!     )];
//!
//!     let pipeline = Pipeline::new(PipelineConfig::rule_only().with_output_dir("output"))?;
//!     let outcome = pipeline.run(&paragraphs, &CancellationToken::new()).await;
//!
//!     println!("{}", outcome.statistics.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use lexlink_pipeline::PipelineConfig;
//!
//! let config = PipelineConfig::default();
//! let config = PipelineConfig::strict();
//! let config = PipelineConfig::lenient();
//! let config = PipelineConfig::rule_only();
//! ```

#![warn(missing_docs)]

mod config;
mod error;
pub mod export;
mod merge;
mod metrics;
mod orchestrator;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use export::{
    export_all, export_failed_review, export_results, save_statistics, ArtifactPaths,
    ExportReport, ExportStatus, LinkRecord,
};
pub use merge::{merge_links, MergeOutcome};
pub use metrics::RunStatistics;
pub use orchestrator::{Pipeline, PipelineOutcome, RuleOnly, Stage};
