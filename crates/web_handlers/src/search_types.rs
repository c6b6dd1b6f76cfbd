use std::collections::HashSet;

use actix_web::HttpResponse;
use campground_scan::{ScanError, Tier, TierFilter};
use chrono::{DateTime, Utc};
use rec_gov::{NearbyCampground, RecGovError, RecreationArea};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request structure for a one-shot availability search
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Park (campground) id to search
    #[validate(length(min = 1, message = "Park ID is required"))]
    pub park_id: String,

    /// First date of the search window, `YYYY-MM-DD`
    #[validate(length(min = 1, message = "Start date is required"))]
    pub start_date: String,

    /// Last date of the search window, `YYYY-MM-DD`
    #[validate(length(min = 1, message = "End date is required"))]
    pub end_date: String,

    /// Minimum stay length
    #[validate(range(min = 1, message = "Nights must be at least 1"))]
    pub nights: u32,

    /// `weekends`, `flexible` or anything else for all dates
    #[serde(default)]
    pub search_preference: Option<String>,
}

/// Which tiers a search returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPreference {
    /// Priority ranges only
    Weekends,
    /// Priority and regular ranges
    Flexible,
    /// Every tier
    All,
}

impl SearchPreference {
    /// Parses the preference label sent by clients; unknown labels mean all dates
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some("weekends") => SearchPreference::Weekends,
            Some("flexible") => SearchPreference::Flexible,
            _ => SearchPreference::All,
        }
    }

    /// Tiers included in the response
    pub fn tier_filter(&self) -> TierFilter {
        match self {
            SearchPreference::Weekends => TierFilter::from_tiers([Tier::Priority]),
            SearchPreference::Flexible => TierFilter::from_tiers([Tier::Priority, Tier::Regular]),
            SearchPreference::All => TierFilter::all(),
        }
    }
}

/// One available range of one campground
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResultEntry {
    /// Campground id
    pub campground: String,
    /// Weekday-annotated range key
    pub range: String,
    /// Number of sites available for the range
    pub sites: u32,
    /// Display line
    pub text: String,
}

/// Search results grouped by tier; tiers not requested stay empty
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    /// Weekend-anchored stays
    pub priority: Vec<SearchResultEntry>,
    /// Acceptable stays
    pub regular: Vec<SearchResultEntry>,
    /// Everything else
    pub ignored: Vec<SearchResultEntry>,
}

impl SearchResults {
    /// Bucket for a tier
    pub fn tier_mut(&mut self, tier: Tier) -> &mut Vec<SearchResultEntry> {
        match tier {
            Tier::Priority => &mut self.priority,
            Tier::Regular => &mut self.regular,
            Tier::Ignored => &mut self.ignored,
        }
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.priority.len() + self.regular.len() + self.ignored.len()
    }

    /// Whether no tier has entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Response structure for a search
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Always true on success
    pub success: bool,
    /// Results grouped by tier
    pub results: SearchResults,
}

/// Request structure for the nearby campground search
#[derive(Debug, Deserialize, Validate)]
pub struct CampsiteSearchRequest {
    /// Latitude in degrees
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,

    /// Longitude in degrees
    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub longitude: f64,
}

/// Response structure for the nearby campground search
#[derive(Debug, Serialize, Deserialize)]
pub struct CampsiteSearchResponse {
    /// Always true on success
    pub success: bool,
    /// Campgrounds near the requested point
    pub campsites: Vec<NearbyCampground>,
}

/// Query string of the recreation area name search
#[derive(Debug, Deserialize, Validate)]
pub struct RecreationAreaQuery {
    /// Name fragment to look for
    #[validate(length(min = 1, message = "Query is required"))]
    pub query: String,
}

/// Response structure for the recreation area name search
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecreationAreaResponse {
    /// Always true on success
    pub success: bool,
    /// Recreation areas whose name contains the query
    pub recreation_areas: Vec<RecreationArea>,
}

/// Search usage counters shared by all workers
#[derive(Debug, Default)]
pub struct SearchStats {
    /// Searches served since start
    pub total_searches: u64,
    /// Time of the latest search
    pub last_search: Option<DateTime<Utc>>,
    /// Distinct client addresses seen
    pub clients: HashSet<String>,
}

impl SearchStats {
    /// Counts one search from `client`
    pub fn record(&mut self, client: Option<&str>, at: DateTime<Utc>) {
        self.total_searches += 1;
        self.last_search = Some(at);
        if let Some(client) = client {
            self.clients.insert(client.to_string());
        }
    }

    /// Number of distinct clients
    pub fn unique_clients(&self) -> usize {
        self.clients.len()
    }
}

/// Errors returned by the API handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request body or parameters
    #[error("Validation error: {0}")]
    Validation(String),

    /// The availability lookup failed
    #[error("Lookup failed: {0}")]
    Lookup(String),

    /// recreation.gov request failed
    #[error("Recreation.gov error: {0}")]
    Upstream(#[from] RecGovError),

    /// Feature not configured on this server
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<ScanError> for ApiError {
    fn from(error: ScanError) -> Self {
        match error {
            ScanError::Parse(_) | ScanError::Validation(_) => ApiError::Validation(error.to_string()),
            other => ApiError::Lookup(other.to_string()),
        }
    }
}

impl actix_web::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": "validation_error",
                "message": msg
            })),
            ApiError::Lookup(msg) => HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "lookup_failed",
                "message": msg
            })),
            ApiError::Upstream(RecGovError::RateLimited) => {
                HttpResponse::TooManyRequests().json(serde_json::json!({
                    "success": false,
                    "error": "rate_limited",
                    "message": "Recreation.gov is rate limiting requests, try again later"
                }))
            }
            ApiError::Upstream(e) => HttpResponse::BadGateway().json(serde_json::json!({
                "success": false,
                "error": "upstream_error",
                "message": e.to_string()
            })),
            ApiError::Unavailable(msg) => {
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "success": false,
                    "error": "service_unavailable",
                    "message": msg
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::ResponseError;
    use actix_web::http::StatusCode;

    use super::*;

    #[test]
    fn test_preference_labels() {
        assert_eq!(SearchPreference::from_label(Some("weekends")), SearchPreference::Weekends);
        assert_eq!(SearchPreference::from_label(Some("flexible")), SearchPreference::Flexible);
        assert_eq!(SearchPreference::from_label(Some("all")), SearchPreference::All);
        assert_eq!(SearchPreference::from_label(None), SearchPreference::All);

        let flexible = SearchPreference::Flexible.tier_filter();
        assert!(flexible.contains(Tier::Regular));
        assert!(!flexible.contains(Tier::Ignored));
    }

    #[test]
    fn test_request_validation() {
        let request: SearchRequest = serde_json::from_value(serde_json::json!({
            "parkId": "232447",
            "startDate": "2024-07-01",
            "endDate": "2024-07-31",
            "nights": 0
        }))
        .unwrap();
        assert!(request.search_preference.is_none());
        assert!(request.validate().is_err());

        let out_of_range = CampsiteSearchRequest {
            latitude: 91.0,
            longitude: 0.0,
        };
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn test_recreation_area_response_shape() {
        let response = RecreationAreaResponse {
            success: true,
            recreation_areas: vec![RecreationArea {
                id: "2991".to_string(),
                name: "Yosemite National Park".to_string(),
            }],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["recreationAreas"][0]["RecAreaName"], "Yosemite National Park");

        assert!(RecreationAreaQuery { query: String::new() }.validate().is_err());
    }

    #[test]
    fn test_stats_count_unique_clients() {
        let mut stats = SearchStats::default();
        let now = Utc::now();
        stats.record(Some("10.0.0.1"), now);
        stats.record(Some("10.0.0.1"), now);
        stats.record(None, now);

        assert_eq!(stats.total_searches, 3);
        assert_eq!(stats.unique_clients(), 1);
        assert_eq!(stats.last_search, Some(now));
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::from(ScanError::Validation("bad".to_string()))
                .error_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ScanError::Acquisition("down".to_string()))
                .error_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Upstream(RecGovError::RateLimited)
                .error_response()
                .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
