//! Tempo v4 work-log API integration for timesync.
//!
//! Two halves: a thin HTTP [`Client`] for the worklogs endpoint, and the
//! [`TempoReader`]/[`TempoWriter`] adapters that implement the engine's
//! collaborator traits on top of it. The v4 API addresses issues by their
//! internal id, so both adapters lean on a [`ResolveIssue`] collaborator to
//! translate the human-readable keys found in time-record notes.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ts_core::{
    BoxError, CreateWorkLog, DomainError, FetchWorkLogs, IssueId, IssueKey, IssueRef, ResolveIssue,
    TimeRecord, WorkLogEntry,
};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const TEMPO_WORKLOGS_URL: &str = "https://api.tempo.io/4/worklogs";
const PAGE_LIMIT: &str = "1000";

/// Work-log ledger client errors.
#[derive(Debug, Error)]
pub enum TempoError {
    /// The provided credentials were unusable before any request was made.
    #[error("invalid Tempo credentials: {reason}")]
    InvalidCredentials { reason: &'static str },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The API answered with an unexpected status.
    #[error("request to {url} not successful: {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    /// The endpoint URL did not parse.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// A result row carried no recognizable issue key.
    #[error("no issue key recognizable in work log from {url:?}")]
    MissingIssueKey { url: String },
    /// A result row violated a domain invariant.
    #[error("invalid work log in response: {0}")]
    InvalidEntry(#[from] DomainError),
}

/// Tempo v4 worklogs client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    author_account_id: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("author_account_id", &self.author_account_id)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client against the public Tempo API.
    pub fn new(
        token: impl Into<String>,
        author_account_id: impl Into<String>,
    ) -> Result<Self, TempoError> {
        Self::with_base_url(TEMPO_WORKLOGS_URL, token, author_account_id)
    }

    /// Creates a client against a custom worklogs endpoint.
    pub fn with_base_url(
        base_url: &str,
        token: impl Into<String>,
        author_account_id: impl Into<String>,
    ) -> Result<Self, TempoError> {
        let token = token.into();
        let author_account_id = author_account_id.into();
        if token.trim().is_empty() {
            return Err(TempoError::InvalidCredentials {
                reason: "access token cannot be empty",
            });
        }
        if author_account_id.trim().is_empty() {
            return Err(TempoError::InvalidCredentials {
                reason: "author account id cannot be empty",
            });
        }

        let base_url =
            Url::parse(base_url).map_err(|err| TempoError::InvalidUrl(err.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(TempoError::ClientBuild)?;

        Ok(Self {
            http,
            base_url,
            token,
            author_account_id,
        })
    }

    /// Fetches the ledger entries correlated to `record`.
    ///
    /// Queries the union of `issues` restricted to the record's day, then
    /// keeps only rows that [`WorkLogEntry::belongs_to`] the record.
    pub async fn work_logs(
        &self,
        record: &TimeRecord,
        issues: &[IssueId],
    ) -> Result<Vec<WorkLogEntry>, TempoError> {
        let mut url = self.base_url.clone();
        {
            // Tempo expects repeated `issueId` parameters, not bracket syntax
            let mut query = url.query_pairs_mut();
            for issue in issues {
                query.append_pair("issueId", &issue.to_string());
            }
            let day = record.day().to_string();
            query.append_pair("from", &day);
            query.append_pair("to", &day);
            query.append_pair("limit", PAGE_LIMIT);
        }

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(TempoError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        let payload: WorkLogsResponse = response.json().await?;
        let mut entries = Vec::new();
        for row in payload.results {
            let entry = row.into_entry()?;
            if entry.belongs_to(record) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Persists one entry against the issue's internal id.
    pub async fn add_work_log(
        &self,
        entry: &WorkLogEntry,
        issue: IssueId,
    ) -> Result<(), TempoError> {
        let payload = WorkLogPayload {
            author_account_id: &self.author_account_id,
            description: &entry.description,
            issue_id: issue.value(),
            start_date: entry.day.to_string(),
            time_spent_seconds: entry.seconds,
        };

        let response = self
            .http
            .post(self.base_url.clone())
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(TempoError::Status {
                url: self.base_url.to_string(),
                status,
                body,
            });
        }

        tracing::debug!(issue = %entry.issue, seconds = entry.seconds, "work log persisted");
        Ok(())
    }
}

/// [`FetchWorkLogs`] against the Tempo v4 API.
///
/// Owns the fallback issue so the queried issue set matches exactly what
/// derivation will produce for the record.
pub struct TempoReader<R> {
    client: Client,
    fallback: IssueRef,
    resolver: R,
}

impl<R: ResolveIssue + Sync> TempoReader<R> {
    pub const fn new(client: Client, fallback: IssueRef, resolver: R) -> Self {
        Self {
            client,
            fallback,
            resolver,
        }
    }

    /// Resolves the distinct issue keys the record's notes reference,
    /// reusing the fallback's id when it is already known.
    async fn issue_ids(&self, record: &TimeRecord) -> Result<Vec<IssueId>, BoxError> {
        let mut keys: Vec<IssueKey> = Vec::new();
        for candidate in WorkLogEntry::split_record(record, &self.fallback) {
            if !keys.contains(candidate.issue.key()) {
                keys.push(candidate.issue.key().clone());
            }
        }

        let mut ids = Vec::with_capacity(keys.len());
        for key in &keys {
            let known = (key == self.fallback.key())
                .then(|| self.fallback.id())
                .flatten();
            let id = match known {
                Some(id) => id,
                None => self.resolver.resolve(key).await?,
            };
            ids.push(id);
        }
        Ok(ids)
    }
}

#[async_trait]
impl<R: ResolveIssue + Sync> FetchWorkLogs for TempoReader<R> {
    async fn fetch_work_logs(&self, record: &TimeRecord) -> Result<Vec<WorkLogEntry>, BoxError> {
        let issues = self.issue_ids(record).await?;
        Ok(self.client.work_logs(record, &issues).await?)
    }
}

/// [`CreateWorkLog`] against the Tempo v4 API.
pub struct TempoWriter<R> {
    client: Client,
    resolver: R,
}

impl<R: ResolveIssue + Sync> TempoWriter<R> {
    pub const fn new(client: Client, resolver: R) -> Self {
        Self { client, resolver }
    }
}

#[async_trait]
impl<R: ResolveIssue + Sync> CreateWorkLog for TempoWriter<R> {
    async fn create_work_log(&self, entry: &WorkLogEntry) -> Result<(), BoxError> {
        let issue = match entry.issue.id() {
            Some(id) => id,
            None => self.resolver.resolve(entry.issue.key()).await?,
        };
        Ok(self.client.add_work_log(entry, issue).await?)
    }
}

#[derive(Debug, Deserialize)]
struct WorkLogsResponse {
    results: Vec<WorkLogRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkLogRow {
    issue: IssueField,
    time_spent_seconds: u64,
    description: String,
    start_date: String,
}

#[derive(Debug, Deserialize)]
struct IssueField {
    #[serde(rename = "self")]
    self_url: String,
    id: Option<u64>,
}

impl WorkLogRow {
    fn into_entry(self) -> Result<WorkLogEntry, TempoError> {
        // The self URL usually names the key; older rows only mention it in
        // the description, so scan that as a fallback.
        let key = IssueKey::from_self_url(&self.issue.self_url)
            .or_else(|| IssueKey::first_in(&self.description))
            .ok_or(TempoError::MissingIssueKey {
                url: self.issue.self_url.clone(),
            })?;
        let issue = match self.issue.id.and_then(|id| IssueId::new(id).ok()) {
            Some(id) => IssueRef::with_id(key, id),
            None => IssueRef::from_key(key),
        };

        Ok(WorkLogEntry {
            issue,
            description: self.description,
            seconds: self.time_spent_seconds,
            day: self.start_date.parse::<ts_core::WorkDay>()?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkLogPayload<'a> {
    author_account_id: &'a str,
    description: &'a str,
    issue_id: u64,
    start_date: String,
    time_spent_seconds: u64,
}
