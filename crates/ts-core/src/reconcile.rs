//! The reconciliation engine.
//!
//! Pulls nothing itself: the four external capabilities (fetch source
//! records, resolve an issue key, fetch existing work logs, create a work
//! log) are injected as trait objects' worth of behavior, with one
//! production implementation per vendor API.
//!
//! The engine keeps no state between invocations and performs no retries.
//! Re-running [`Reconciler::reconcile`] after a partial failure is safe:
//! derivation is deterministic and previously created entries are
//! recognized through the correlation marker, so only the missing entries
//! are attempted again.

use async_trait::async_trait;
use thiserror::Error;

use crate::issue::{IssueId, IssueKey, IssueRef};
use crate::record::TimeRecord;
use crate::worklog::WorkLogEntry;

/// Boxed error type collaborators surface their failures through.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Yields all time records for a source-ledger project.
#[async_trait]
pub trait FetchTimeRecords {
    async fn fetch_time_records(&self, project_id: &str) -> Result<Vec<TimeRecord>, BoxError>;
}

/// Resolves a human-readable issue key to its stable internal identifier.
#[async_trait]
pub trait ResolveIssue {
    async fn resolve(&self, key: &IssueKey) -> Result<IssueId, BoxError>;
}

/// Returns the target-ledger entries already correlated to a record.
///
/// Implementations are expected to return only entries satisfying
/// [`WorkLogEntry::belongs_to`] for the given record.
#[async_trait]
pub trait FetchWorkLogs {
    async fn fetch_work_logs(&self, record: &TimeRecord) -> Result<Vec<WorkLogEntry>, BoxError>;
}

/// Persists one entry in the target ledger.
#[async_trait]
pub trait CreateWorkLog {
    async fn create_work_log(&self, entry: &WorkLogEntry) -> Result<(), BoxError>;
}

/// Failures surfaced by a reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Reading existing work logs failed; nothing was created.
    #[error("failed to fetch existing work logs for record {record_id}")]
    FetchExisting {
        record_id: String,
        #[source]
        source: BoxError,
    },

    /// A create call failed; remaining candidates were not attempted.
    #[error("failed to create work log {description:?}")]
    CreateEntry {
        description: String,
        #[source]
        source: BoxError,
    },
}

/// Counts reported by one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    /// Entries created in the target ledger.
    pub created: usize,
    /// Candidates suppressed because their slot was already represented.
    pub skipped: usize,
}

/// Reconciles one source record at a time into the target ledger.
pub struct Reconciler<F, C> {
    fallback: IssueRef,
    fetch_work_logs: F,
    create_work_log: C,
}

impl<F, C> Reconciler<F, C>
where
    F: FetchWorkLogs,
    C: CreateWorkLog,
{
    /// Creates an engine writing unattributable time against `fallback`.
    pub const fn new(fallback: IssueRef, fetch_work_logs: F, create_work_log: C) -> Self {
        Self {
            fallback,
            fetch_work_logs,
            create_work_log,
        }
    }

    /// Ensures every derived entry for `record` exists in the target ledger.
    ///
    /// Candidates whose (work item, day) slot already has some
    /// representation are skipped regardless of which record produced that
    /// representation; the rest are created in derivation order. The first
    /// failed create aborts the remaining candidates for this record.
    pub async fn reconcile(&self, record: &TimeRecord) -> Result<ReconcileOutcome, ReconcileError> {
        let existing = self
            .fetch_work_logs
            .fetch_work_logs(record)
            .await
            .map_err(|source| ReconcileError::FetchExisting {
                record_id: record.id().to_string(),
                source,
            })?;

        let candidates = WorkLogEntry::split_record(record, &self.fallback);
        let total = candidates.len();

        let to_create: Vec<WorkLogEntry> = candidates
            .into_iter()
            .filter(|candidate| !existing.iter().any(|log| candidate.same_slot(log)))
            .collect();

        let skipped = total - to_create.len();
        tracing::debug!(
            record_id = %record.id(),
            candidates = total,
            skipped,
            "derived work-log candidates"
        );

        let mut created = 0;
        for entry in &to_create {
            self.create_work_log
                .create_work_log(entry)
                .await
                .map_err(|source| ReconcileError::CreateEntry {
                    description: entry.description.clone(),
                    source,
                })?;
            created += 1;
            tracing::debug!(issue = %entry.issue, seconds = entry.seconds, "created work log");
        }

        Ok(ReconcileOutcome { created, skipped })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::day::WorkDay;
    use crate::record::RecordId;

    fn day(s: &str) -> WorkDay {
        s.parse().unwrap()
    }

    fn record(id: &str, hours: f64, notes: &str, spent: &str) -> TimeRecord {
        TimeRecord::new(RecordId::new(id).unwrap(), hours, notes, day(spent)).unwrap()
    }

    fn key_ref(key: &str) -> IssueRef {
        IssueRef::from_key(IssueKey::new(key).unwrap())
    }

    fn entry(issue: &str, description: &str, seconds: u64, spent: &str) -> WorkLogEntry {
        WorkLogEntry {
            issue: key_ref(issue),
            description: description.to_string(),
            seconds,
            day: day(spent),
        }
    }

    struct FixedWorkLogs(Vec<WorkLogEntry>);

    #[async_trait]
    impl FetchWorkLogs for FixedWorkLogs {
        async fn fetch_work_logs(
            &self,
            _record: &TimeRecord,
        ) -> Result<Vec<WorkLogEntry>, BoxError> {
            Ok(self.0.clone())
        }
    }

    struct FailingFetch;

    #[async_trait]
    impl FetchWorkLogs for FailingFetch {
        async fn fetch_work_logs(
            &self,
            _record: &TimeRecord,
        ) -> Result<Vec<WorkLogEntry>, BoxError> {
            Err("ledger unreachable".into())
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        created: Mutex<Vec<WorkLogEntry>>,
        fail_after: Option<usize>,
    }

    impl RecordingWriter {
        fn failing_after(count: usize) -> Self {
            Self {
                created: Mutex::new(Vec::new()),
                fail_after: Some(count),
            }
        }

        fn entries(&self) -> Vec<WorkLogEntry> {
            self.created.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CreateWorkLog for RecordingWriter {
        async fn create_work_log(&self, entry: &WorkLogEntry) -> Result<(), BoxError> {
            let mut created = self.created.lock().unwrap();
            if self.fail_after.is_some_and(|limit| created.len() >= limit) {
                return Err("write rejected".into());
            }
            created.push(entry.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn creates_only_entries_missing_from_the_ledger() {
        let existing = vec![
            entry("EXISTING-1", "description harvest:123", 1, "2022-08-09"),
            entry("EXISTING-2", "description harvest:123", 1, "2022-08-09"),
        ];
        let writer = RecordingWriter::default();
        let reconciler = Reconciler::new(key_ref("FALLBACK-1"), FixedWorkLogs(existing), writer);

        let outcome = reconciler
            .reconcile(&record(
                "123",
                4.0,
                "EXISTING-1, EXISTING-2, NEW-1, something else",
                "2022-08-09",
            ))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome { created: 2, skipped: 2 });
        assert_eq!(
            reconciler.create_work_log.entries(),
            vec![
                entry("NEW-1", "NEW-1 harvest:123", 3600, "2022-08-09"),
                entry(
                    "FALLBACK-1",
                    "something else FALLBACK-1 harvest:123",
                    3600,
                    "2022-08-09"
                ),
            ]
        );
    }

    #[tokio::test]
    async fn suppression_is_by_slot_not_by_marker() {
        // The existing entry carries a different record's marker; the slot
        // is taken all the same.
        let existing = vec![entry("AB-1", "old work harvest:999", 600, "2022-08-09")];
        let writer = RecordingWriter::default();
        let reconciler = Reconciler::new(key_ref("FALLBACK-1"), FixedWorkLogs(existing), writer);

        let outcome = reconciler
            .reconcile(&record("123", 1.0, "AB-1", "2022-08-09"))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome { created: 0, skipped: 1 });
        assert!(reconciler.create_work_log.entries().is_empty());
    }

    #[tokio::test]
    async fn existing_entry_on_another_day_does_not_suppress() {
        let existing = vec![entry("AB-1", "old work harvest:123", 600, "2022-08-08")];
        let writer = RecordingWriter::default();
        let reconciler = Reconciler::new(key_ref("FALLBACK-1"), FixedWorkLogs(existing), writer);

        let outcome = reconciler
            .reconcile(&record("123", 1.0, "AB-1", "2022-08-09"))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome { created: 1, skipped: 0 });
    }

    #[tokio::test]
    async fn fetch_failure_aborts_without_creating() {
        let writer = RecordingWriter::default();
        let reconciler = Reconciler::new(key_ref("FALLBACK-1"), FailingFetch, writer);

        let err = reconciler
            .reconcile(&record("123", 1.0, "AB-1", "2022-08-09"))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::FetchExisting { ref record_id, .. } if record_id == "123"));
        assert!(reconciler.create_work_log.entries().is_empty());
    }

    #[tokio::test]
    async fn create_failure_aborts_remaining_candidates() {
        let writer = RecordingWriter::failing_after(1);
        let reconciler = Reconciler::new(key_ref("FALLBACK-1"), FixedWorkLogs(Vec::new()), writer);

        let err = reconciler
            .reconcile(&record("123", 3.0, "AB-1, AB-2, AB-3", "2022-08-09"))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::CreateEntry { ref description, .. }
            if description == "AB-2 harvest:123"));
        assert_eq!(
            reconciler.create_work_log.entries(),
            vec![entry("AB-1", "AB-1 harvest:123", 3600, "2022-08-09")]
        );
    }

    #[tokio::test]
    async fn rerun_after_partial_failure_only_attempts_the_missing_entries() {
        // First run created AB-1 then failed; the retry sees AB-1 in the
        // ledger and resumes with the remaining slots.
        let existing = vec![entry("AB-1", "AB-1 harvest:123", 3600, "2022-08-09")];
        let writer = RecordingWriter::default();
        let reconciler = Reconciler::new(key_ref("FALLBACK-1"), FixedWorkLogs(existing), writer);

        let outcome = reconciler
            .reconcile(&record("123", 3.0, "AB-1, AB-2, AB-3", "2022-08-09"))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome { created: 2, skipped: 1 });
        assert_eq!(
            reconciler.create_work_log.entries(),
            vec![
                entry("AB-2", "AB-2 harvest:123", 3600, "2022-08-09"),
                entry("AB-3", "AB-3 harvest:123", 3600, "2022-08-09"),
            ]
        );
    }
}
