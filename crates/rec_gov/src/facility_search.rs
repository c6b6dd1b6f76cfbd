use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Default RIDB endpoint
pub const DEFAULT_RIDB_BASE_URL: &str = "https://ridb.recreation.gov/api/v1";

/// Radius used by the nearby search, in miles
pub const DEFAULT_SEARCH_RADIUS_MILES: u32 = 200;

const CAMPGROUND_FACILITY_TYPE: &str = "Campground";

/// Errors returned by the RIDB client
#[derive(Debug, thiserror::Error)]
pub enum RecGovError {
    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Too many requests
    #[error("Rate limited by recreation.gov")]
    RateLimited,

    /// Missing or rejected API key
    #[error("Authentication with recreation.gov failed")]
    AuthenticationFailed,

    /// Unknown resource
    #[error("Resource not found")]
    NotFound,

    /// Any other non-success status
    #[error("API error: {0}")]
    Api(String),

    /// Client could not be configured
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RecGovError {
    /// Maps a non-success HTTP status to an error
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            429 => RecGovError::RateLimited,
            401 | 403 => RecGovError::AuthenticationFailed,
            404 => RecGovError::NotFound,
            _ => RecGovError::Api(format!("HTTP {}", status)),
        }
    }
}

/// RIDB list envelope
#[derive(Debug, Deserialize)]
pub struct RidbResponse<T> {
    /// Returned records
    #[serde(rename = "RECDATA", default = "Vec::new")]
    pub rec_data: Vec<T>,
}

/// Facility record as returned by `/facilities`
#[derive(Debug, Clone, Deserialize)]
pub struct RidbFacility {
    /// RIDB facility id
    #[serde(rename = "FacilityID")]
    pub facility_id: String,

    /// Display name
    #[serde(rename = "FacilityName")]
    pub facility_name: String,

    /// Free-text description, may contain HTML
    #[serde(rename = "FacilityDescription", default)]
    pub description: Option<String>,

    /// Facility kind, e.g. `Campground`
    #[serde(rename = "FacilityTypeDescription", default)]
    pub facility_type: Option<String>,

    /// Latitude in degrees
    #[serde(rename = "FacilityLatitude", default)]
    pub latitude: Option<f64>,

    /// Longitude in degrees
    #[serde(rename = "FacilityLongitude", default)]
    pub longitude: Option<f64>,
}

/// Recreation area record as returned by `/recareas`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecreationArea {
    /// RIDB recreation area id
    #[serde(rename = "RecAreaID")]
    pub id: String,
    /// Display name
    #[serde(rename = "RecAreaName")]
    pub name: String,
}

/// Campground summary returned to API clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NearbyCampground {
    /// Facility name
    pub name: String,
    /// Facility id, usable as a park id for availability lookups
    pub id: String,
    /// Free-text description, may contain HTML
    pub description: Option<String>,
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
}

impl From<RidbFacility> for NearbyCampground {
    fn from(facility: RidbFacility) -> Self {
        Self {
            name: facility.facility_name,
            id: facility.facility_id,
            description: facility.description,
            latitude: facility.latitude,
            longitude: facility.longitude,
        }
    }
}

/// Keeps only campground facilities
pub fn campgrounds_from_facilities(facilities: Vec<RidbFacility>) -> Vec<NearbyCampground> {
    facilities
        .into_iter()
        .filter(|f| f.facility_type.as_deref() == Some(CAMPGROUND_FACILITY_TYPE))
        .map(NearbyCampground::from)
        .collect()
}

/// Keeps recreation areas whose name contains the query, ignoring case
pub fn matching_recreation_areas(areas: Vec<RecreationArea>, query: &str) -> Vec<RecreationArea> {
    let query = query.to_lowercase();
    areas
        .into_iter()
        .filter(|area| area.name.to_lowercase().contains(&query))
        .collect()
}

/// Client for the RIDB facility endpoints
#[derive(Clone)]
pub struct FacilitySearchClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FacilitySearchClient {
    /// Create a new client against `base_url`
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, RecGovError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RecGovError::Config("API key must not be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RecGovError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build a client from `RECREATION_API_KEY` and optional `RIDB_BASE_URL`
    pub fn from_env() -> Result<Self, RecGovError> {
        let api_key = std::env::var("RECREATION_API_KEY")
            .map_err(|_| RecGovError::Config("RECREATION_API_KEY is not set".to_string()))?;
        let base_url =
            std::env::var("RIDB_BASE_URL").unwrap_or_else(|_| DEFAULT_RIDB_BASE_URL.to_string());
        Self::new(api_key, base_url)
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Campgrounds within `radius_miles` of a point
    pub async fn campgrounds_near(
        &self,
        latitude: f64,
        longitude: f64,
        radius_miles: u32,
    ) -> Result<Vec<NearbyCampground>, RecGovError> {
        log::debug!(
            "Searching campgrounds within {} miles of ({}, {})",
            radius_miles,
            latitude,
            longitude
        );

        let url = format!("{}/facilities", self.base_url);
        let params = [
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("radius", radius_miles.to_string()),
            ("activity", "CAMPING".to_string()),
            ("apikey", self.api_key.clone()),
        ];

        let response = self.client.get(&url).query(&params).send().await?;
        if !response.status().is_success() {
            return Err(RecGovError::from_status(response.status()));
        }

        let body: RidbResponse<RidbFacility> = response.json().await?;
        let campgrounds = campgrounds_from_facilities(body.rec_data);
        log::info!("🏕️ Found {} campgrounds nearby", campgrounds.len());
        Ok(campgrounds)
    }

    /// Recreation areas whose name matches `query`
    pub async fn search_recreation_areas(
        &self,
        query: &str,
    ) -> Result<Vec<RecreationArea>, RecGovError> {
        let url = self.recreation_area_url(query);
        log::debug!("Searching recreation areas for '{}'", query);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(RecGovError::from_status(response.status()));
        }

        let body: RidbResponse<RecreationArea> = response.json().await?;
        let total = body.rec_data.len();
        let areas = matching_recreation_areas(body.rec_data, query);
        log::info!(
            "🏞️ {} of {} recreation areas match '{}'",
            areas.len(),
            total,
            query
        );
        Ok(areas)
    }

    fn recreation_area_url(&self, query: &str) -> String {
        format!(
            "{}/recareas?query={}&activity=CAMPING&limit=50",
            self.base_url,
            urlencoding::encode(query)
        )
    }
}
