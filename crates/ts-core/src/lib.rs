//! Core domain logic for timesync.
//!
//! This crate contains the reconciliation engine and its value types:
//! - Splitting a source record's notes into per-issue work-log candidates
//! - Correlation predicates deciding what already exists in the ledger
//! - The [`Reconciler`] orchestrating fetch, dedup, and create

mod day;
mod error;
mod issue;
mod record;
pub mod reconcile;
mod worklog;

pub use day::WorkDay;
pub use error::DomainError;
pub use issue::{IssueId, IssueKey, IssueRef};
pub use reconcile::{
    BoxError, CreateWorkLog, FetchTimeRecords, FetchWorkLogs, ReconcileError, ReconcileOutcome,
    Reconciler, ResolveIssue,
};
pub use record::{RecordId, TimeRecord};
pub use worklog::WorkLogEntry;
