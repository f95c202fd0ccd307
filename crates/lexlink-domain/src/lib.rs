//! Lexlink Domain Layer
//!
//! This crate contains the shared data model for the interpretation link
//! pipeline: the paragraphs that go in, the links that come out, and the
//! trait seam for the external language model.
//!
//! ## Key Concepts
//!
//! - **Case paragraph**: one immutable unit of extraction work
//! - **Statute id**: a normalized `Act§Section` identifier
//! - **Extracted link**: a scored association between a statute provision
//!   and a case paragraph that interprets it
//! - **Link key**: `(statute_id, case_id, paragraph_number)`, the identity
//!   used for deduplication
//!
//! ## Architecture
//!
//! Pure data and validation only. Extraction, validation and orchestration
//! live in the other `lexlink-*` crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod case;
pub mod error;
pub mod link;
pub mod statute;
pub mod traits;

// Re-exports for convenience
pub use case::{CaseMetadata, CaseParagraphInput, CourtLevel, ParagraphIndex, ParagraphRef, ParagraphRole};
pub use error::{LinkError, StatuteIdError};
pub use link::{Authority, ExtractedLink, ExtractionMethod, InterpretationType, LinkDraft, LinkKey};
pub use statute::StatuteId;
pub use traits::{Completion, LlmProvider, TokenUsage};
