use actix_web::{HttpRequest, HttpResponse, Result, web};
use chrono::Utc;
use rec_gov::DEFAULT_SEARCH_RADIUS_MILES;
use validator::Validate;

use crate::search_service::{SearchService, SearchState};
use crate::search_types::*;

/// Runs a one-shot availability search for one park
pub async fn search(
    state: web::Data<SearchState>,
    req: HttpRequest,
    request: web::Json<SearchRequest>,
) -> Result<HttpResponse, ApiError> {
    // Validate the request
    request
        .validate()
        .map_err(|e| ApiError::Validation(format!("Validation error: {}", e)))?;

    record_search(&state, &req, &request);

    let results = SearchService::new(&state).search(&request).await?;

    Ok(HttpResponse::Ok().json(SearchResponse {
        success: true,
        results,
    }))
}

/// Lists campgrounds near a point
pub async fn search_campsites(
    state: web::Data<SearchState>,
    request: web::Json<CampsiteSearchRequest>,
) -> Result<HttpResponse, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(format!("Validation error: {}", e)))?;

    let client = state.facility_client.as_ref().ok_or_else(|| {
        ApiError::Unavailable("Campground search requires RECREATION_API_KEY".to_string())
    })?;

    let campsites = client
        .campgrounds_near(
            request.latitude,
            request.longitude,
            DEFAULT_SEARCH_RADIUS_MILES,
        )
        .await?;

    Ok(HttpResponse::Ok().json(CampsiteSearchResponse {
        success: true,
        campsites,
    }))
}

/// Finds camping recreation areas by name
pub async fn recreation_areas(
    state: web::Data<SearchState>,
    params: web::Query<RecreationAreaQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = RecreationAreaQuery {
        query: params.into_inner().query.trim().to_string(),
    };
    query
        .validate()
        .map_err(|e| ApiError::Validation(format!("Validation error: {}", e)))?;

    let client = state.facility_client.as_ref().ok_or_else(|| {
        ApiError::Unavailable("Recreation area search requires RECREATION_API_KEY".to_string())
    })?;

    let recreation_areas = client.search_recreation_areas(&query.query).await?;

    Ok(HttpResponse::Ok().json(RecreationAreaResponse {
        success: true,
        recreation_areas,
    }))
}

/// Health check endpoint
pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().body("OK"))
}

/// Registers every route of the API
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/api")
            .route("/search", web::post().to(search))
            .route("/search_campsites", web::post().to(search_campsites))
            .route("/recreation_areas", web::get().to(recreation_areas)),
    );
}

fn record_search(state: &SearchState, req: &HttpRequest, request: &SearchRequest) {
    let connection = req.connection_info();
    let client = connection.realip_remote_addr();

    log::info!(
        "🔍 Search: park={} dates={}..{} nights={} preference={}",
        request.park_id,
        request.start_date,
        request.end_date,
        request.nights,
        request.search_preference.as_deref().unwrap_or("all")
    );

    match state.stats.lock() {
        Ok(mut stats) => {
            let now = Utc::now();
            stats.record(client, now);
            log::info!(
                "📊 Total searches: {}, last search: {}, unique users: {}, current user: {}",
                stats.total_searches,
                now.format("%Y-%m-%d %H:%M:%S"),
                stats.unique_clients(),
                client.unwrap_or("unknown")
            );
        }
        Err(e) => log::warn!("Search statistics unavailable: {}", e),
    }
}
