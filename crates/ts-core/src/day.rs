//! Calendar-day value type.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// A calendar day with no time-of-day and no timezone.
///
/// Parsing is strict: the input must round-trip byte-for-byte through the
/// canonical `YYYY-MM-DD` formatter, so unpadded components, numerically
/// invalid dates, and trailing time fractions are all rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkDay(NaiveDate);

impl WorkDay {
    /// Returns the underlying calendar date.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for WorkDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for WorkDay {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = NaiveDate::parse_from_str(s, DAY_FORMAT).map_err(|_| {
            DomainError::InvalidDay {
                value: s.to_string(),
            }
        })?;

        // chrono is lenient about zero-padding, so require the canonical form
        if parsed.format(DAY_FORMAT).to_string() != s {
            return Err(DomainError::InvalidDay {
                value: s.to_string(),
            });
        }

        Ok(Self(parsed))
    }
}

impl TryFrom<String> for WorkDay {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WorkDay> for String {
    fn from(day: WorkDay) -> Self {
        day.to_string()
    }
}

impl fmt::Display for WorkDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_formats_canonical_days() {
        let day: WorkDay = "2022-08-05".parse().unwrap();
        assert_eq!(day.to_string(), "2022-08-05");
    }

    #[test]
    fn rejects_unparseable_input() {
        assert!("foo".parse::<WorkDay>().is_err());
        assert!("".parse::<WorkDay>().is_err());
    }

    #[test]
    fn rejects_numerically_invalid_dates() {
        // 2022 was not a leap year
        assert!("2022-02-29".parse::<WorkDay>().is_err());
        assert!("2022-13-01".parse::<WorkDay>().is_err());
    }

    #[test]
    fn rejects_trailing_time_fraction() {
        assert!("2022-02-28 01:02:03".parse::<WorkDay>().is_err());
        assert!("2022-02-28T00:00:00Z".parse::<WorkDay>().is_err());
    }

    #[test]
    fn rejects_non_canonical_padding() {
        assert!("2022-2-5".parse::<WorkDay>().is_err());
        assert!("2022-02-5".parse::<WorkDay>().is_err());
    }

    #[test]
    fn equality_is_structural() {
        let a: WorkDay = "2022-08-05".parse().unwrap();
        let b: WorkDay = "2022-08-05".parse().unwrap();
        let c: WorkDay = "2022-08-06".parse().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);
    }

    #[test]
    fn serde_round_trips_as_string() {
        let day: WorkDay = "2022-08-05".parse().unwrap();
        let json = serde_json::to_string(&day).unwrap();
        assert_eq!(json, "\"2022-08-05\"");
        let parsed: WorkDay = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, day);
    }

    #[test]
    fn serde_rejects_malformed_days() {
        let result: Result<WorkDay, _> = serde_json::from_str("\"2022-02-29\"");
        assert!(result.is_err());
    }
}
