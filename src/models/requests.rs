use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;
use crate::models::domain::{HelperCandidate, MatchFilterConfig, ServiceRequest};

/// Request to score an inline candidate pool
///
/// `request` and `filters` are optional at the wire level so that a missing
/// value reaches the scorer and is reported as an invalid argument.
/// Candidates stay raw until [`parse_candidates`] so that one malformed
/// entry cannot reject the whole pool.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoreHelpersRequest {
    #[serde(default)]
    pub request: Option<ServiceRequest>,
    #[serde(default)]
    pub candidates: Vec<Value>,
    #[serde(default)]
    pub filters: Option<MatchFilterConfig>,
    #[validate(range(min = 1, max = 100))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Parse an inline pool, returning the helpers and how many entries were dropped
pub fn parse_candidates(raw: Vec<Value>) -> (Vec<HelperCandidate>, usize) {
    let mut dropped = 0;
    let candidates = raw
        .into_iter()
        .filter_map(|value| match HelperCandidate::from_json(value) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                tracing::debug!("Dropping unparseable candidate: {}", e);
                dropped += 1;
                None
            }
        })
        .collect();

    (candidates, dropped)
}

/// Request to fetch a stored service request and rank nearby helpers
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindHelpersRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "request_id", rename = "requestId")]
    pub request_id: String,
    #[serde(default)]
    pub filters: Option<MatchFilterConfig>,
    /// Falls back to the configured default limit when omitted
    #[validate(range(min = 1, max = 100))]
    #[serde(default)]
    pub limit: Option<u16>,
}
