// Core algorithm exports
pub mod availability;
pub mod distance;
pub mod filters;
pub mod matcher;
pub mod scoring;

pub use availability::{availability_status, recency_factor, AvailabilityStatus};
pub use distance::{calculate_bounding_box, distance_between, haversine_distance, is_within_bounding_box, BoundingBox};
pub use filters::{check_hard_filters, DistanceFilter, Eligibility};
pub use matcher::{find_matching_helpers, sort_matches, MatchError, MatchOutcome, Matcher};
pub use scoring::{calculate_match_score, ScoringContext};
