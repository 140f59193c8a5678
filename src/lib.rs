//! CareMatch - helper matching for a senior-care services marketplace
//!
//! This library provides the scoring algorithm that ranks helpers for an
//! elderly user's service request. Candidates pass a set of hard filters
//! (distance, rating, services, availability, gender) and are then ranked by
//! a weighted 0-100 score.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{find_matching_helpers, MatchError, MatchOutcome, Matcher, distance::haversine_distance};
pub use crate::models::{HelperCandidate, MatchFilterConfig, MatchResult, ScoringWeights, ServiceRequest};
