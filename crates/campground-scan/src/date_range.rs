use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::scan_types::ParseError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const WEEKDAY_FORMAT: &str = "%a";

/// Parses an ISO 8601 calendar date (`YYYY-MM-DD`)
pub fn parse_date(value: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|source| ParseError::InvalidDate {
        value: value.to_string(),
        source,
    })
}

/// A stay window: check-in on `start`, check-out on `end`.
///
/// The end is always strictly after the start, so every range covers at
/// least one night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting an end that is not after the start
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ParseError> {
        if end <= start {
            return Err(ParseError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses a range from two `YYYY-MM-DD` strings
    pub fn parse(start: &str, end: &str) -> Result<Self, ParseError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Check-in date
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Check-out date
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of nights between check-in and check-out
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Canonical weekday-annotated key for this range
    pub fn key(&self) -> RangeKey {
        RangeKey::new(self)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Parses the lookup's `YYYY-MM-DD -> YYYY-MM-DD` notation
impl FromStr for DateRange {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once("->")
            .ok_or_else(|| ParseError::InvalidRangeFormat(s.trim().to_string()))?;
        Self::parse(start, end)
    }
}

/// Canonical display key of a [`DateRange`], e.g.
/// `2024-07-05 (Fri) -> 2024-07-07 (Sun)`.
///
/// Used as the equality unit across classification, aggregation and
/// change detection. Two ranges with the same dates always produce the
/// same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RangeKey(String);

impl RangeKey {
    /// Builds the key for a range
    pub fn new(range: &DateRange) -> Self {
        Self(format!(
            "{} ({}) -> {} ({})",
            range.start.format(DATE_FORMAT),
            range.start.format(WEEKDAY_FORMAT),
            range.end.format(DATE_FORMAT),
            range.end.format(WEEKDAY_FORMAT),
        ))
    }

    /// Builds the key straight from two `YYYY-MM-DD` strings
    pub fn from_dates(start: &str, end: &str) -> Result<Self, ParseError> {
        DateRange::parse(start, end).map(|range| Self::new(&range))
    }

    /// The key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RangeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RangeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
