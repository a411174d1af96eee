//! Work-log entries and the note-splitting derivation.
//!
//! # Algorithm Summary
//!
//! 1. Split the record's notes on `,` into ordered fragments
//! 2. Associate each fragment with the last issue key it names, or with the
//!    fallback issue when it names none
//! 3. Divide the record's duration evenly across the distinct fragments,
//!    truncating any remainder
//!
//! The derivation is deterministic, so re-running it for the same record
//! always yields the same ordered entries. Together with the correlation
//! marker embedded in each description this makes retries idempotent.

use crate::day::WorkDay;
use crate::issue::{IssueKey, IssueRef};
use crate::record::TimeRecord;

const MARKER_PREFIX: &str = "harvest:";
const SECONDS_PER_HOUR: f64 = 3600.0;

/// A prospective (or existing) entry in the target ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLogEntry {
    /// The work item this entry logs time against.
    pub issue: IssueRef,
    /// Free text; derived entries end with the correlation marker.
    pub description: String,
    /// Logged duration in whole seconds.
    pub seconds: u64,
    /// The calendar day the time applies to.
    pub day: WorkDay,
}

impl WorkLogEntry {
    /// Derives the ordered work-log entries for one source record.
    ///
    /// Never returns an empty vector: notes without any issue key collapse
    /// to a single entry against `fallback`.
    ///
    /// Fragments that trim to the same text collide: the later fragment's
    /// issue wins while the earlier fragment keeps its position. Keying by
    /// trimmed text makes this unavoidable; callers relying on the entry
    /// count should be aware of it.
    #[must_use]
    pub fn split_record(record: &TimeRecord, fallback: &IssueRef) -> Vec<Self> {
        let mut issues: Vec<(String, IssueRef)> = Vec::new();

        for fragment in record.notes().split(',') {
            let (text, issue) = match IssueKey::last_in(fragment) {
                Some(key) => (fragment.trim().to_string(), IssueRef::from_key(key)),
                None => (
                    format!("{fragment} {}", fallback.key()).trim().to_string(),
                    fallback.clone(),
                ),
            };

            match issues.iter_mut().find(|(existing, _)| *existing == text) {
                Some((_, slot)) => *slot = issue,
                None => issues.push((text, issue)),
            }
        }

        // Truncating division: the remainder is discarded, not redistributed
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "hours are validated positive and finite"
        )]
        let seconds = (record.hours() * SECONDS_PER_HOUR / issues.len() as f64) as u64;

        issues
            .into_iter()
            .map(|(text, issue)| Self {
                issue,
                description: format!("{text} {}{}", MARKER_PREFIX, record.id()),
                seconds,
                day: record.day(),
            })
            .collect()
    }

    /// Whether this entry was created by a prior run for exactly `record`.
    ///
    /// True iff the days match and the description ends with the exact
    /// marker for the record's id. Matching is anchored to the end of the
    /// description so a longer id cannot match as a suffix of another.
    #[must_use]
    pub fn belongs_to(&self, record: &TimeRecord) -> bool {
        self.day == record.day()
            && self
                .description
                .strip_suffix(record.id().as_str())
                .is_some_and(|rest| rest.ends_with(MARKER_PREFIX))
    }

    /// Whether two entries occupy the same (work item, day) slot.
    ///
    /// Coarser than [`belongs_to`](Self::belongs_to): internal ids and
    /// markers are ignored, only the key and the day decide.
    #[must_use]
    pub fn same_slot(&self, other: &Self) -> bool {
        self.day == other.day && self.issue.key() == other.issue.key()
    }
}
