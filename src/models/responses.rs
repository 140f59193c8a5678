use serde::{Deserialize, Serialize};
use crate::models::domain::{ExclusionCounts, MatchResult};

/// Shown by clients when no helper survives the filters
pub const EMPTY_MATCHES_MESSAGE: &str = "No matching helpers found. Try adjusting your filters.";

/// Response for the scoring endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindHelpersResponse {
    pub match_run_id: String,
    pub matches: Vec<MatchResult>,
    pub total_candidates: usize,
    pub skipped_malformed: usize,
    pub excluded: ExclusionCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
