use chrono::{DateTime, Utc};
use crate::core::availability::availability_status;
use crate::core::distance::{calculate_bounding_box, distance_between, is_within_bounding_box, BoundingBox};
use crate::models::{ExclusionReason, GeoPoint, HelperCandidate, MatchFilterConfig, ServiceRequest};

/// Case-insensitive comparison for free-form labels (services, skills, languages)
#[inline]
pub fn same_label(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Whether any label in `haystack` matches `needle`
#[inline]
pub fn contains_label<S: AsRef<str>>(haystack: &[S], needle: &str) -> bool {
    haystack.iter().any(|item| same_label(item.as_ref(), needle))
}

/// Distance filter inputs precomputed once per matching call
#[derive(Debug, Clone, Copy)]
pub struct DistanceFilter {
    origin: GeoPoint,
    max_distance_km: f64,
    bounding_box: BoundingBox,
}

impl DistanceFilter {
    pub fn new(origin: GeoPoint, max_distance_km: f64) -> Self {
        Self {
            origin,
            max_distance_km,
            bounding_box: calculate_bounding_box(origin.lat, origin.lng, max_distance_km),
        }
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// Distance from the origin, or `None` if the point is outside the
    /// maximum distance. The boundary itself is inclusive.
    pub fn within(&self, point: GeoPoint) -> Option<f64> {
        // Stage 1: cheap bounding box pre-filter
        if !is_within_bounding_box(point.lat, point.lng, &self.bounding_box) {
            return None;
        }

        // Stage 2: exact great-circle distance
        let distance_km = distance_between(self.origin, point);
        (distance_km <= self.max_distance_km).then_some(distance_km)
    }
}

/// Outcome of the hard-filter pass for one candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eligibility {
    /// Distance to the request, when both sides are located
    pub distance_km: Option<f64>,
}

/// Apply every hard filter to a candidate
///
/// Returns the first failing filter as an exclusion reason. Filters run in
/// a fixed order: distance, rating, services, availability, gender.
pub fn check_hard_filters(
    candidate: &HelperCandidate,
    request: &ServiceRequest,
    config: &MatchFilterConfig,
    distance_filter: Option<&DistanceFilter>,
) -> Result<Eligibility, ExclusionReason> {
    let distance_km = match (distance_filter, candidate.resolved_location()) {
        (Some(filter), Some(point)) => {
            Some(filter.within(point).ok_or(ExclusionReason::Distance)?)
        }
        _ => None,
    };

    if !passes_rating_floor(candidate, config.min_rating) {
        return Err(ExclusionReason::Rating);
    }

    if !offers_required_service(candidate, &config.required_services) {
        return Err(ExclusionReason::Services);
    }

    if config.use_availability && !is_available(candidate, request.scheduled_time) {
        return Err(ExclusionReason::Availability);
    }

    if !matches_gender(candidate, config.gender_preference()) {
        return Err(ExclusionReason::Gender);
    }

    Ok(Eligibility { distance_km })
}

/// New helpers without a rating are provisionally eligible
#[inline]
pub fn passes_rating_floor(candidate: &HelperCandidate, min_rating: f64) -> bool {
    match candidate.average_rating {
        Some(rating) => rating >= min_rating,
        None => true,
    }
}

/// An empty requirement list places no restriction
#[inline]
pub fn offers_required_service(candidate: &HelperCandidate, required: &[String]) -> bool {
    if required.is_empty() {
        return true;
    }

    candidate
        .services()
        .iter()
        .any(|offered| contains_label(required, offered))
}

/// Helpers without a declared schedule are assumed available
#[inline]
pub fn is_available(candidate: &HelperCandidate, scheduled_time: DateTime<Utc>) -> bool {
    !availability_status(candidate, scheduled_time).is_excluded()
}

/// Only filters when both the preference and the candidate's gender are set
#[inline]
pub fn matches_gender(candidate: &HelperCandidate, preferred: Option<&str>) -> bool {
    let declared = candidate
        .gender
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty());

    match (preferred, declared) {
        (Some(preferred), Some(gender)) => same_label(preferred, gender),
        _ => true,
    }
}
