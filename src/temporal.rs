//! # Temporal Module
//!
//! Calendar-date handling for both sources: normalization of hand-entered
//! spreadsheet dates, ISO parsing for exported dates, and inclusive date spans.
//! Dates carry no time of day and render as ISO 8601 (`YYYY-MM-DD`), so their
//! string forms compare in calendar order.

use crate::diagnostics::RowError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

static ORDINAL_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("valid regex"));

static QUALIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)\s*$").expect("valid regex"));

/// Serde adapter writing dates as `YYYY-MM-DD` strings.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(date)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_iso_date(&raw).map_err(serde::de::Error::custom)
    }
}

/// Strip ordinal suffixes and parenthesized qualifiers, then trim.
///
/// `"October 9th, 2020 (EXT)"` becomes `"October 9, 2020"`. Only a trailing
/// parenthetical is removed.
pub fn clean_date_text(raw: &str) -> String {
    let without_ordinals = ORDINAL_SUFFIX_RE.replace_all(raw, "$1");
    let without_qualifiers = QUALIFIER_RE.replace_all(&without_ordinals, "");
    without_qualifiers.trim().to_string()
}

/// Parse a hand-entered "Month Day, Year" date.
///
/// Only the month-in-words format is accepted; anything else is a
/// [`RowError::ParseFailure`] carrying the original text.
pub fn normalize(raw: &str) -> Result<Date, RowError> {
    let cleaned = clean_date_text(raw);
    let format =
        format_description!("[month repr:long case_sensitive:false] [day padding:none], [year]");
    Date::parse(&cleaned, &format).map_err(|_| RowError::ParseFailure {
        raw: raw.to_string(),
    })
}

/// Parse an exported `YYYY-MM-DD` date.
pub fn parse_iso_date(raw: &str) -> Result<Date, RowError> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(raw.trim(), &format).map_err(|_| RowError::ParseFailure {
        raw: raw.to_string(),
    })
}

/// Parse an RFC 3339 timestamp such as a video publish time.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, RowError> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).map_err(|_| RowError::ParseFailure {
        raw: raw.to_string(),
    })
}

/// Render a date as ISO 8601.
pub fn iso(date: Date) -> String {
    date.to_string()
}

/// An inclusive calendar interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateSpan {
    #[serde(with = "iso_date")]
    pub start: Date,
    #[serde(with = "iso_date")]
    pub end: Date,
}

impl DateSpan {
    /// Create a span, rejecting `end < start`. Single-day spans are allowed.
    pub fn new(start: Date, end: Date) -> Result<Self, RowError> {
        if end < start {
            return Err(RowError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).whole_days() + 1
    }

    /// Smallest span covering both.
    pub fn hull(&self, other: &DateSpan) -> DateSpan {
        DateSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Evenly spaced dates from `start`, `step_days` apart, never past `end`.
    /// A zero step is treated as one day.
    pub fn sample_dates(&self, step_days: u32) -> Vec<Date> {
        let step_days = step_days.max(1);
        let step = Duration::days(i64::from(step_days));
        let mut dates = Vec::with_capacity(self.len_days() as usize / step_days as usize + 1);
        let mut current = Some(self.start);
        while let Some(date) = current {
            if date > self.end {
                break;
            }
            dates.push(date);
            current = date.checked_add(step);
        }
        dates
    }
}

impl fmt::Display for DateSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
