//! Sprint seeds: `YYYY_WNN` period tokens.
//!
//! A seed is the input that the name generator maps to a sprint name. The
//! document-writing paths only accept the strict period form so that every
//! sprint page in a workspace is keyed by its ISO week.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error for strings that are not a `YYYY_WNN` seed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`seed` must match format YYYY_WNN (e.g. 2026_W04), got {0:?}")]
pub struct InvalidSeed(pub String);

/// A validated `YYYY_WNN` sprint seed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SprintSeed(String);

impl SprintSeed {
    /// Parses a seed.
    ///
    /// Surrounding whitespace is ignored when checking the shape but kept in
    /// the seed, since the name is derived from the text as received.
    ///
    /// The accepted shape is exactly four ASCII digits, `_W`, and two ASCII
    /// digits. Week numbers are not range-checked beyond the digit count.
    ///
    /// # Examples
    ///
    /// ```
    /// use sprint_namer::types::SprintSeed;
    ///
    /// assert!(SprintSeed::parse("2026_W04").is_ok());
    /// assert!(SprintSeed::parse(" 2026_W04 ").is_ok());
    /// assert!(SprintSeed::parse("2026-W04").is_err());
    /// assert!(SprintSeed::parse("2026_W4").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, InvalidSeed> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();

        let well_formed = bytes.len() == 8
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && &bytes[4..6] == b"_W"
            && bytes[6..].iter().all(u8::is_ascii_digit);

        if well_formed {
            Ok(SprintSeed(s.to_string()))
        } else {
            Err(InvalidSeed(s.to_string()))
        }
    }

    /// Derives the seed for the ISO week containing `at`.
    ///
    /// ISO weeks start on Monday and belong to the year that contains their
    /// Thursday, so the first days of January can fall in the previous year's
    /// last week (and late December in the next year's week 1).
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let week = at.iso_week();
        SprintSeed(format!("{:04}_W{:02}", week.year(), week.week()))
    }

    /// Derives a seed from an RFC 3339 timestamp, falling back to `now` when the
    /// timestamp is missing or unparsable.
    pub fn from_timestamp_or(timestamp: Option<&str>, now: DateTime<Utc>) -> Self {
        let at = timestamp
            .and_then(|ts| DateTime::parse_from_rfc3339(ts.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now);
        Self::from_datetime(at)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SprintSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SprintSeed {
    type Error = InvalidSeed;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        SprintSeed::parse(&s)
    }
}

impl From<SprintSeed> for String {
    fn from(seed: SprintSeed) -> Self {
        seed.0
    }
}
