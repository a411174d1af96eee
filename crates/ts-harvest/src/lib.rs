//! Harvest v2 API integration for timesync.
//!
//! Pulls time entries for a project from the source ledger, following the
//! `links.next` pagination until the listing is exhausted.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

use ts_core::{BoxError, DomainError, FetchTimeRecords, RecordId, TimeRecord};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const HARVEST_TIME_ENTRIES_URL: &str = "https://api.harvestapp.com/v2/time_entries";
const USER_AGENT: &str = concat!("timesync/", env!("CARGO_PKG_VERSION"));

/// Source-ledger client errors.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The provided credentials were unusable before any request was made.
    #[error("invalid Harvest credentials: {reason}")]
    InvalidCredentials { reason: &'static str },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The API answered with an unexpected status.
    #[error("request to {url} not successful: {status}")]
    Status { url: String, status: StatusCode },
    /// A page link or endpoint URL did not parse.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// A returned row violated a domain invariant.
    #[error("invalid time record in response: {0}")]
    InvalidRecord(#[from] DomainError),
}

/// Harvest v2 time-entries client.
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    account_id: String,
    token: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("account_id", &self.account_id)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client against the public Harvest API.
    pub fn new(
        account_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, HarvestError> {
        Self::with_base_url(HARVEST_TIME_ENTRIES_URL, account_id, token)
    }

    /// Creates a client against a custom time-entries endpoint.
    pub fn with_base_url(
        base_url: &str,
        account_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, HarvestError> {
        let account_id = account_id.into();
        let token = token.into();
        if account_id.trim().is_empty() {
            return Err(HarvestError::InvalidCredentials {
                reason: "account id cannot be empty",
            });
        }
        if token.trim().is_empty() {
            return Err(HarvestError::InvalidCredentials {
                reason: "access token cannot be empty",
            });
        }

        let base_url =
            Url::parse(base_url).map_err(|err| HarvestError::InvalidUrl(err.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(HarvestError::ClientBuild)?;

        Ok(Self {
            http,
            base_url,
            account_id,
            token,
        })
    }

    /// Fetches all time records for a project, in listing order.
    pub async fn time_records(&self, project_id: &str) -> Result<Vec<TimeRecord>, HarvestError> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("project_id", project_id);

        let mut records = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next {
            let page = self.fetch_page(url).await?;
            for row in page.time_entries {
                records.push(row.into_record()?);
            }
            next = page
                .links
                .next
                .map(|link| Url::parse(&link).map_err(|err| HarvestError::InvalidUrl(err.to_string())))
                .transpose()?;
        }

        tracing::debug!(project_id, count = records.len(), "fetched time records");
        Ok(records)
    }

    async fn fetch_page(&self, url: Url) -> Result<PageResponse, HarvestError> {
        let response = self
            .http
            .get(url.clone())
            .header("Harvest-Account-Id", &self.account_id)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(HarvestError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl FetchTimeRecords for Client {
    async fn fetch_time_records(&self, project_id: &str) -> Result<Vec<TimeRecord>, BoxError> {
        Ok(self.time_records(project_id).await?)
    }
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    time_entries: Vec<TimeRow>,
    links: PageLinks,
}

#[derive(Debug, Deserialize)]
struct PageLinks {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeRow {
    id: u64,
    hours: f64,
    notes: Option<String>,
    spent_date: String,
}

impl TimeRow {
    fn into_record(self) -> Result<TimeRecord, DomainError> {
        TimeRecord::new(
            RecordId::new(self.id.to_string())?,
            self.hours,
            self.notes.unwrap_or_default(),
            self.spent_date.parse()?,
        )
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> Client {
        Client::with_base_url(&format!("{}/time_entries", server.uri()), "acc-1", "secret")
            .unwrap()
    }

    #[test]
    fn rejects_empty_credentials() {
        assert!(matches!(
            Client::new("", "token"),
            Err(HarvestError::InvalidCredentials { .. })
        ));
        assert!(matches!(
            Client::new("acc", "  "),
            Err(HarvestError::InvalidCredentials { .. })
        ));
    }

    #[test]
    fn debug_redacts_token() {
        let client = Client::new("acc-1", "super-secret").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn follows_pagination_and_maps_rows() {
        let server = MockServer::start().await;

        let page_one = serde_json::json!({
            "time_entries": [
                {"id": 636_709_355, "hours": 10.0, "notes": "AB-1, AB-2", "spent_date": "2022-09-05"},
            ],
            "links": {"next": format!("{}/time_entries?page=2", server.uri())},
        });
        let page_two = serde_json::json!({
            "time_entries": [
                {"id": 636_709_356, "hours": 0.5, "notes": null, "spent_date": "2022-09-06"},
            ],
            "links": {"next": null},
        });

        Mock::given(method("GET"))
            .and(path("/time_entries"))
            .and(query_param("project_id", "777"))
            .and(header("Harvest-Account-Id", "acc-1"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_one))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/time_entries"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_two))
            .expect(1)
            .mount(&server)
            .await;

        let records = client_for(&server).time_records("777").await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id().as_str(), "636709355");
        assert_eq!(records[0].notes(), "AB-1, AB-2");
        assert_eq!(records[0].day().to_string(), "2022-09-05");
        // null notes map to an empty string
        assert_eq!(records[1].notes(), "");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/time_entries"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).time_records("777").await.unwrap_err();
        assert!(matches!(
            err,
            HarvestError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn rows_violating_domain_invariants_are_errors() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "time_entries": [
                {"id": 1, "hours": 0.0, "notes": "x", "spent_date": "2022-09-05"},
            ],
            "links": {"next": null},
        });
        Mock::given(method("GET"))
            .and(path("/time_entries"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = client_for(&server).time_records("777").await.unwrap_err();
        assert!(matches!(err, HarvestError::InvalidRecord(_)));
    }
}
