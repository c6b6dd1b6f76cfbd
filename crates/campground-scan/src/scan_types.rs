use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use validator::Validate;

use crate::classifier::TierFilter;
use crate::date_range::DateRange;

/// One contiguous available window for one site, as reported by the lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteAvailability {
    /// Campground the site belongs to
    pub campground_id: String,
    /// Site identifier within the campground
    pub site_id: String,
    /// Check-in and check-out dates of the window
    pub range: DateRange,
}

impl SiteAvailability {
    /// Creates a new availability record
    pub fn new(
        campground_id: impl Into<String>,
        site_id: impl Into<String>,
        range: DateRange,
    ) -> Self {
        Self {
            campground_id: campground_id.into(),
            site_id: site_id.into(),
            range,
        }
    }
}

/// Everything one lookup reported
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupResult {
    /// Campgrounds named by the lookup, including those with no open window
    pub campgrounds: Vec<String>,
    /// Open windows in output order
    pub records: Vec<SiteAvailability>,
}

impl From<Vec<SiteAvailability>> for LookupResult {
    fn from(records: Vec<SiteAvailability>) -> Self {
        Self {
            campgrounds: Vec::new(),
            records,
        }
    }
}

/// Configuration consumed by the poll loop
#[derive(Debug, Clone, Validate)]
pub struct ScanConfig {
    /// Minimum number of nights a window must offer to be classified
    #[validate(range(min = 1, message = "Minimum nights must be at least 1"))]
    pub min_nights: u32,

    /// Tiers whose ranges feed change detection
    #[validate(custom(function = "validate_tier_filter"))]
    pub tier_filter: TierFilter,

    /// Minutes between polls, 0 for a single one-shot run
    pub poll_frequency_minutes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_nights: 1,
            tier_filter: TierFilter::all(),
            poll_frequency_minutes: 30,
        }
    }
}

impl ScanConfig {
    /// Validates the configuration, turning validator errors into a [`ScanError`]
    pub fn validated(self) -> Result<Self, ScanError> {
        self.validate()
            .map_err(|e| ScanError::Validation(format!("Invalid scan configuration: {}", e)))?;
        Ok(self)
    }

    /// Whether the loop stops after the first poll
    pub fn is_one_shot(&self) -> bool {
        self.poll_frequency_minutes == 0
    }

    /// Sleep between polls, `None` in one-shot mode
    pub fn poll_interval(&self) -> Option<Duration> {
        if self.is_one_shot() {
            None
        } else {
            Some(Duration::from_secs(
                self.poll_frequency_minutes.saturating_mul(60),
            ))
        }
    }
}

fn validate_tier_filter(filter: &TierFilter) -> Result<(), validator::ValidationError> {
    if filter.is_empty() {
        let mut error = validator::ValidationError::new("empty_tier_filter");
        error.message = Some("At least one tier must be selected".into());
        return Err(error);
    }
    Ok(())
}

/// Errors raised while parsing dates, ranges and raw lookup records
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    /// Date not in `YYYY-MM-DD` form
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        /// The offending input
        value: String,
        /// Underlying chrono error
        #[source]
        source: chrono::ParseError,
    },

    /// End date not strictly after start date
    #[error("Invalid date range: {end} is not after {start}")]
    InvalidRange {
        /// Check-in date
        start: NaiveDate,
        /// Check-out date
        end: NaiveDate,
    },

    /// Range text without a `->` separator
    #[error("Invalid range format '{0}': expected 'YYYY-MM-DD -> YYYY-MM-DD'")]
    InvalidRangeFormat(String),

    /// A lookup output line that could not be turned into a record
    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number in the lookup output
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// Unknown tier name
    #[error("Unknown tier '{0}': expected priority, regular or ignored")]
    UnknownTier(String),
}

/// Custom error type for scan operations
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Malformed input data
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The external availability lookup failed
    #[error("Acquisition error: {0}")]
    Acquisition(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Failure writing a report
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
