//! Jira REST v3 issue directory client for timesync.
//!
//! The work-log ledger's v4 API addresses issues by their stable internal
//! id, so human-readable keys taken from time-record notes have to be
//! resolved through the tracker first.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use ts_core::{BoxError, IssueId, IssueKey, ResolveIssue};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Issue directory errors.
#[derive(Debug, Error)]
pub enum JiraError {
    /// The provided credentials were unusable before any request was made.
    #[error("invalid Jira credentials: {reason}")]
    InvalidCredentials { reason: &'static str },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The tracker did not yield an id for the key.
    #[error("could not retrieve issue id for key {key}: server responded with {status}: {body}")]
    IssueNotFound {
        key: IssueKey,
        status: StatusCode,
        body: String,
    },
    /// The response carried an id that is not a positive integer.
    #[error("invalid issue id in response: {value:?}")]
    InvalidId { value: String },
}

/// Jira REST v3 client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    user: String,
    token: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client for the tracker at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, JiraError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let user = user.into();
        let token = token.into();
        if base_url.is_empty() {
            return Err(JiraError::InvalidCredentials {
                reason: "base URL cannot be empty",
            });
        }
        if user.trim().is_empty() {
            return Err(JiraError::InvalidCredentials {
                reason: "user cannot be empty",
            });
        }
        if token.trim().is_empty() {
            return Err(JiraError::InvalidCredentials {
                reason: "API token cannot be empty",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(JiraError::ClientBuild)?;

        Ok(Self {
            http,
            base_url,
            user,
            token,
        })
    }

    /// Resolves a human-readable key to the tracker's internal id.
    pub async fn issue_id(&self, key: &IssueKey) -> Result<IssueId, JiraError> {
        let url = format!("{}/rest/api/3/issue/{key}", self.base_url);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.user, Some(&self.token))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(JiraError::IssueNotFound {
                key: key.clone(),
                status,
                body,
            });
        }

        let payload: IssueResponse = response.json().await?;
        let parsed = payload
            .id
            .parse::<u64>()
            .ok()
            .and_then(|id| IssueId::new(id).ok());
        match parsed {
            Some(id) => Ok(id),
            None => Err(JiraError::InvalidId { value: payload.id }),
        }
    }
}

#[async_trait]
impl ResolveIssue for Client {
    async fn resolve(&self, key: &IssueKey) -> Result<IssueId, BoxError> {
        Ok(self.issue_id(key).await?)
    }
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    id: String,
}
