//! Error types for the domain model

use thiserror::Error;

/// Errors raised while building a [`StatuteId`](crate::StatuteId)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatuteIdError {
    /// Statute name was empty after normalization
    #[error("statute name is empty")]
    EmptyName,

    /// Section reference did not start with a number
    #[error("invalid section reference: {0:?}")]
    InvalidSection(String),

    /// Canonical form was missing the `§` separator
    #[error("malformed statute id: {0:?}")]
    Malformed(String),
}

/// Errors raised while building an [`ExtractedLink`](crate::ExtractedLink)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    /// Confidence was NaN or outside [0, 1]
    #[error("confidence out of range: {0}")]
    ConfidenceOutOfRange(f64),

    /// Boost factor was NaN or outside [0, 1]
    #[error("boost factor out of range: {0}")]
    BoostOutOfRange(f64),

    /// Paragraph reference had an empty case id
    #[error("case id is empty")]
    EmptyCaseId,

    /// Statute id was invalid
    #[error(transparent)]
    Statute(#[from] StatuteIdError),
}
