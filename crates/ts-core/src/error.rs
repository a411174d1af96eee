//! Validation errors for domain types.

use thiserror::Error;

/// Validation errors raised when constructing domain values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// The input did not parse as a canonical `YYYY-MM-DD` calendar day.
    #[error("invalid calendar day: {value:?}")]
    InvalidDay { value: String },

    /// The input did not match the issue key pattern.
    #[error("invalid issue key: {value:?}")]
    InvalidIssueKey { value: String },

    /// Internal issue identifiers are strictly positive.
    #[error("issue id must be a positive integer")]
    InvalidIssueId,

    /// Record identifiers are opaque but must be non-empty.
    #[error("record id cannot be empty")]
    EmptyRecordId,

    /// Tracked durations are strictly positive.
    #[error("hours must be greater than zero, got {value}")]
    NonPositiveHours { value: f64 },
}
