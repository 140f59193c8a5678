// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Day, ExclusionCounts, ExclusionReason, GeoPoint, HelperCandidate, MatchFilterConfig,
    MatchFilterConfigBuilder, MatchResult, ScoreBreakdown, ScoringWeights, ServiceRequest,
    TimeWindow, WeeklyAvailability, DEFAULT_MAX_DISTANCE_KM,
};
pub use requests::{parse_candidates, FindHelpersRequest, ScoreHelpersRequest};
pub use responses::{ErrorResponse, FindHelpersResponse, HealthResponse, EMPTY_MATCHES_MESSAGE};
