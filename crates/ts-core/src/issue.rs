//! Issue identity types for the work-log ledger.
//!
//! A work item is addressed by a human-readable key such as `AB12-123`.
//! Newer tracker API generations additionally require a stable internal
//! identifier, so [`IssueRef`] carries the key plus an optional id rather
//! than modelling the two generations as separate types.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Matches a key-shaped substring anywhere in free text.
static KEY_SCAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][A-Z0-9]*-[1-9][0-9]*").unwrap());

/// Matches a full string that is exactly one issue key.
static KEY_EXACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9]*-[1-9][0-9]*$").unwrap());

/// A validated human-readable issue key, e.g. `AB12-123`.
///
/// The project part is uppercase letters and digits starting with a letter;
/// the numeric suffix is a positive integer with no leading zero. No
/// surrounding whitespace is tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IssueKey(String);

impl IssueKey {
    /// Creates a key after validating it against the exact pattern.
    pub fn new(key: impl Into<String>) -> Result<Self, DomainError> {
        let key = key.into();
        if !KEY_EXACT.is_match(&key) {
            return Err(DomainError::InvalidIssueKey { value: key });
        }
        Ok(Self(key))
    }

    /// Derives a key from the trailing path segment of a tracker "self" URL.
    ///
    /// Returns `None` when the trailing segment is not key-shaped.
    #[must_use]
    pub fn from_self_url(url: &str) -> Option<Self> {
        let segment = url.rsplit('/').next()?;
        Self::new(segment).ok()
    }

    /// Finds the first key-shaped substring in free text.
    ///
    /// Last-resort correlation fallback when no direct association exists.
    #[must_use]
    pub fn first_in(text: &str) -> Option<Self> {
        KEY_SCAN.find(text).map(|found| Self(found.as_str().to_string()))
    }

    /// Finds the last key-shaped substring in free text.
    #[must_use]
    pub fn last_in(text: &str) -> Option<Self> {
        KEY_SCAN
            .find_iter(text)
            .last()
            .map(|found| Self(found.as_str().to_string()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IssueKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IssueKey> for String {
    fn from(key: IssueKey) -> Self {
        key.0
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for IssueKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A stable internal issue identifier, strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueId(u64);

impl IssueId {
    /// Creates an identifier, rejecting zero.
    pub const fn new(id: u64) -> Result<Self, DomainError> {
        if id == 0 {
            return Err(DomainError::InvalidIssueId);
        }
        Ok(Self(id))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reference to a work item: a key, optionally paired with the internal id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueRef {
    key: IssueKey,
    id: Option<IssueId>,
}

impl IssueRef {
    /// A key-only reference, for deployments where the key round-trips.
    #[must_use]
    pub const fn from_key(key: IssueKey) -> Self {
        Self { key, id: None }
    }

    /// A reference carrying the tracker-internal identifier.
    #[must_use]
    pub const fn with_id(key: IssueKey, id: IssueId) -> Self {
        Self { key, id: Some(id) }
    }

    /// The human-readable key.
    #[must_use]
    pub const fn key(&self) -> &IssueKey {
        &self.key
    }

    /// The internal identifier, when known.
    #[must_use]
    pub const fn id(&self) -> Option<IssueId> {
        self.id
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}
