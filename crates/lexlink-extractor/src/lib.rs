//! Lexlink Extractor
//!
//! Turns case paragraphs into candidate interpretation links.
//!
//! # Overview
//!
//! Two independent extraction paths produce [`ExtractedLink`]s keyed by
//! `(statute_id, case_id, paragraph_number)`:
//!
//! - **Rule-based**: citation regexes, an ordered interpretation rule table,
//!   authority determination and holding extraction. Deterministic, CPU-bound
//!   and run on a rayon pool.
//! - **LLM-assisted**: a keyword pre-filter, then a structured prompt to a
//!   language model behind the [`LlmProvider`](lexlink_domain::LlmProvider)
//!   seam. Concurrency-limited, with timeouts, retries and a spending budget.
//!
//! Both paths resolve statute names through the same [`StatuteIdMapper`], so
//! the same provision found twice lands on the same key and can be merged
//! downstream.
//!
//! # Architecture
//!
//! ```text
//! Paragraphs ─┬→ RuleBasedExtractor ──┐
//!             └→ LlmAssistedExtractor ┴→ links → merge → Gatekeeper
//! ```
//!
//! # Example Usage
//!
//! ```
//! use lexlink_domain::{CaseMetadata, CaseParagraphInput};
//! use lexlink_extractor::RuleBasedExtractor;
//!
//! let paragraph = CaseParagraphInput::new(
//!     "lim-v-sph",
//!     33,
//!     "The Court of Appeal held that s.7 of the Defamation Act requires proof of \
//!      positive public benefit, narrowing the prior broad reading.",
//!     CaseMetadata::new("SGCA"),
//! );
//!
//! let links = RuleBasedExtractor::default().extract(&paragraph);
//! assert_eq!(links[0].statute_id().to_string(), "Defamation Act§7");
//! ```
//!
//! [`ExtractedLink`]: lexlink_domain::ExtractedLink

#![warn(missing_docs)]

pub mod authority;
pub mod citation;
pub mod classifier;
mod config;
mod cost;
mod error;
pub mod holding;
mod llm_assisted;
mod parser;
mod prompt;
mod rule_based;
mod statute_map;
mod types;


pub use authority::AuthorityDeterminer;
pub use citation::{CitationExtractor, StatuteCitation};
pub use classifier::{Classification, InterpretationClassifier};
pub use config::{LlmExtractorConfig, Pricing, RuleConfig};
pub use cost::{CostSummary, CostTracker};
pub use error::ExtractorError;
pub use holding::HoldingExtractor;
pub use llm_assisted::LlmAssistedExtractor;
pub use parser::parse_llm_response;
pub use prompt::PromptBuilder;
pub use rule_based::RuleBasedExtractor;
pub use statute_map::StatuteIdMapper;
pub use types::{LlmExtraction, LlmExtractionStats, LlmLinkCandidate};
