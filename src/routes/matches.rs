use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::config::MatchingSettings;
use crate::core::{MatchError, MatchOutcome, Matcher};
use crate::models::{
    parse_candidates, ErrorResponse, FindHelpersRequest, FindHelpersResponse, HealthResponse,
    ScoreHelpersRequest, EMPTY_MATCHES_MESSAGE,
};
use crate::services::{DirectoryClient, DirectoryError};
use std::sync::Arc;

/// Candidates fetched per requested match, to leave room for filtering
const CANDIDATE_POOL_FACTOR: usize = 5;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<DirectoryClient>,
    pub matcher: Matcher,
    pub matching: MatchingSettings,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/score", web::post().to(score_helpers))
        .route("/matches/find", web::post().to(find_helpers));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn error_response(status: actix_web::http::StatusCode, error: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}

fn match_error_response(err: MatchError) -> HttpResponse {
    match err {
        MatchError::InvalidArgument(message) => error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Invalid argument",
            message,
        ),
    }
}

fn directory_error_response(err: DirectoryError) -> HttpResponse {
    match err {
        DirectoryError::NotFound(message) => {
            error_response(actix_web::http::StatusCode::NOT_FOUND, "Not found", message)
        }
        other => error_response(
            actix_web::http::StatusCode::BAD_GATEWAY,
            "Backend request failed",
            other.to_string(),
        ),
    }
}

fn build_response(outcome: MatchOutcome) -> FindHelpersResponse {
    let empty_message = outcome
        .is_empty()
        .then(|| EMPTY_MATCHES_MESSAGE.to_string());

    FindHelpersResponse {
        match_run_id: uuid::Uuid::new_v4().to_string(),
        matches: outcome.matches,
        total_candidates: outcome.total_candidates,
        skipped_malformed: outcome.skipped_malformed,
        excluded: outcome.excluded,
        empty_message,
    }
}

/// Score an inline candidate pool
///
/// POST /api/v1/matches/score
///
/// Request body:
/// ```json
/// {
///   "request": { "id": "r1", "serviceType": "shopping", "scheduledTime": "..." },
///   "candidates": [ { "id": "h1", "averageRating": 4.5 } ],
///   "filters": { "maxDistanceKm": 20 },
///   "limit": 20
/// }
/// ```
async fn score_helpers(
    state: web::Data<AppState>,
    req: web::Json<ScoreHelpersRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        );
    }

    let ScoreHelpersRequest {
        request,
        candidates,
        filters,
        limit,
    } = req.into_inner();

    let (candidates, unparsed) = parse_candidates(candidates);

    let mut outcome = match state
        .matcher
        .try_find_matches(request.as_ref(), candidates, filters.as_ref())
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::info!("Rejected scoring request: {}", e);
            return match_error_response(e);
        }
    };

    outcome.record_unparsed(unparsed);

    if let Some(limit) = limit {
        outcome.truncate(limit as usize);
    }

    tracing::info!(
        "Scored {} candidates, returning {} matches",
        outcome.total_candidates,
        outcome.matches.len()
    );

    HttpResponse::Ok().json(build_response(outcome))
}

/// Find helpers for a stored service request
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "requestId": "string",
///   "filters": { "minRating": 4.0, "requiredServices": ["shopping"] },
///   "limit": 20
/// }
/// ```
async fn find_helpers(
    state: web::Data<AppState>,
    req: web::Json<FindHelpersRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_helpers request: {:?}", errors);
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        );
    }

    let request_id = &req.request_id;
    let limit = state.matching.effective_limit(req.limit);
    let filters = req
        .filters
        .clone()
        .unwrap_or_else(|| state.matching.default_filters());

    tracing::info!("Finding helpers for request: {}, limit: {}", request_id, limit);

    let service_request = match state.directory.get_service_request(request_id).await {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("Failed to fetch service request {}: {}", request_id, e);
            return directory_error_response(e);
        }
    };

    let candidates = match state
        .directory
        .query_candidates(&service_request, filters.max_distance_km, limit * CANDIDATE_POOL_FACTOR)
        .await
    {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to query candidates for {}: {}", request_id, e);
            return directory_error_response(e);
        }
    };

    tracing::debug!("Found {} candidates for {}", candidates.len(), request_id);

    let mut outcome = match state.matcher.find_matches(&service_request, candidates, &filters) {
        Ok(outcome) => outcome,
        Err(e) => return match_error_response(e),
    };
    outcome.truncate(limit);

    tracing::info!(
        "Returning {} helpers for request {} (from {} candidates)",
        outcome.matches.len(),
        request_id,
        outcome.total_candidates
    );

    HttpResponse::Ok().json(build_response(outcome))
}
