//! Lexlink Gatekeeper
//!
//! Quality control for extracted interpretation links.
//!
//! The Gatekeeper provides:
//! - Per-link scoring on independent checks (statute mentioned, confidence in
//!   range, authority consistency, holding presence, text alignment)
//! - A weighted aggregate and a configurable pass threshold
//! - Batch statistics and a human-readable report
//! - Export of failing links, with their check breakdown, for manual review
//!
//! Validation annotates links; it never changes them.
//!
//! # Examples
//!
//! ```
//! use lexlink_domain::ParagraphIndex;
//! use lexlink_gatekeeper::{BatchValidator, QualityValidator, ValidationConfig};
//!
//! let batch = BatchValidator::new(QualityValidator::new(ValidationConfig::default()));
//! let report = batch.validate_and_report(Vec::new(), &ParagraphIndex::new(&[]));
//! assert_eq!(report.stats.total, 0);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod report;
mod validator;

pub use config::{CheckWeights, ValidationConfig};
pub use error::GatekeeperError;
pub use report::{BatchValidator, CheckFailure, FailedReview, ValidationReport, ValidationStats};
pub use validator::{Check, CheckResult, QualityValidator, ValidatedLink, ValidationScore};
