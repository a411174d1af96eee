//! Source-ledger time records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::day::WorkDay;
use crate::error::DomainError;

/// A validated identifier for a source-ledger record.
///
/// The source system treats these as opaque; they only need to be non-empty
/// and stable, since they become the correlation marker in the target ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Creates an identifier after validation.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::EmptyRecordId);
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of tracked time pulled from the source ledger.
///
/// Immutable once constructed; the tracked duration is strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeRecord {
    id: RecordId,
    hours: f64,
    notes: String,
    day: WorkDay,
}

impl TimeRecord {
    /// Creates a record, rejecting non-positive or non-finite durations.
    pub fn new(
        id: RecordId,
        hours: f64,
        notes: impl Into<String>,
        day: WorkDay,
    ) -> Result<Self, DomainError> {
        if !hours.is_finite() || hours <= 0.0 {
            return Err(DomainError::NonPositiveHours { value: hours });
        }
        Ok(Self {
            id,
            hours,
            notes: notes.into(),
            day,
        })
    }

    /// The source-ledger identifier.
    #[must_use]
    pub const fn id(&self) -> &RecordId {
        &self.id
    }

    /// The tracked duration in hours.
    #[must_use]
    pub const fn hours(&self) -> f64 {
        self.hours
    }

    /// The free-text notes attached to the record.
    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// The calendar day the time was tracked on.
    #[must_use]
    pub const fn day(&self) -> WorkDay {
        self.day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> WorkDay {
        s.parse().unwrap()
    }

    #[test]
    fn record_id_rejects_empty() {
        assert!(RecordId::new("").is_err());
        assert_eq!(RecordId::new("123").unwrap().as_str(), "123");
    }

    #[test]
    fn record_id_allows_opaque_text() {
        let id = RecordId::new("i / am / a / complex / id").unwrap();
        assert_eq!(id.as_str(), "i / am / a / complex / id");
    }

    #[test]
    fn rejects_non_positive_hours() {
        let id = RecordId::new("1").unwrap();
        for hours in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            assert!(
                TimeRecord::new(id.clone(), hours, "notes", day("2022-08-05")).is_err(),
                "hours {hours}"
            );
        }
    }

    #[test]
    fn stores_fields() {
        let record = TimeRecord::new(
            RecordId::new("123").unwrap(),
            0.1,
            "hello",
            day("2022-08-07"),
        )
        .unwrap();
        assert_eq!(record.id().as_str(), "123");
        assert!((record.hours() - 0.1).abs() < f64::EPSILON);
        assert_eq!(record.notes(), "hello");
        assert_eq!(record.day(), day("2022-08-07"));
    }
}
