//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use ts_core::{DomainError, IssueKey, IssueRef};

/// Application configuration.
///
/// All credentials are passed to the vendor clients explicitly; nothing in
/// the engine reads the environment on its own.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Harvest account the time records are pulled from.
    pub harvest_account_id: String,
    /// Harvest personal access token.
    pub harvest_token: String,
    /// Harvest project whose records are reconciled.
    pub harvest_project_id: String,
    /// Jira site base URL, e.g. `https://example.atlassian.net`.
    pub jira_base_url: String,
    /// Jira user (e-mail) for basic auth.
    pub jira_user: String,
    /// Jira API token.
    pub jira_token: String,
    /// Tempo API bearer token.
    pub tempo_token: String,
    /// Jira account id the created work logs are attributed to.
    pub tempo_author_account_id: String,
    /// Issue key that receives time no note could be attributed to.
    pub fallback_issue: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("harvest_account_id", &self.harvest_account_id)
            .field("harvest_token", &"[REDACTED]")
            .field("harvest_project_id", &self.harvest_project_id)
            .field("jira_base_url", &self.jira_base_url)
            .field("jira_user", &self.jira_user)
            .field("jira_token", &"[REDACTED]")
            .field("tempo_token", &"[REDACTED]")
            .field("tempo_author_account_id", &self.tempo_author_account_id)
            .field("fallback_issue", &self.fallback_issue)
            .finish()
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TIMESYNC_*)
        figment = figment.merge(Env::prefixed("TIMESYNC_"));

        figment.extract()
    }

    /// Parses the configured fallback issue key into a reference.
    pub fn fallback_ref(&self) -> Result<IssueRef, DomainError> {
        Ok(IssueRef::from_key(IssueKey::new(&self.fallback_issue)?))
    }
}

/// Returns the platform-specific config directory for timesync.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("timesync"))
}
