use chrono::{DateTime, Utc};
use crate::core::availability::{availability_status, recency_factor, AvailabilityStatus};
use crate::core::filters::{contains_label, same_label};
use crate::models::{HelperCandidate, ScoreBreakdown, ScoringWeights, ServiceRequest};

/// Reviews needed for full experience credit
const REVIEWS_FOR_FULL_EXPERIENCE: f64 = 50.0;

/// Services that earn versatility credit when the requested one is missing
const VERSATILITY_SERVICES_CAP: f64 = 5.0;

/// Everything the sub-scores need besides the candidate itself
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub request: &'a ServiceRequest,
    pub weights: ScoringWeights,
    pub max_distance_km: f64,
    pub now: DateTime<Utc>,
}

/// Calculate a match score (0-100) for a candidate that passed the hard filters
///
/// Scoring formula (default weights):
/// score = (
///     distance_score * 25 +        # Closer = higher score
///     rating_score * 20 +          # Average rating out of 5
///     service_score * 20 +         # Offers the requested service
///     experience_score * 10 +      # Review count
///     availability_score * 10 +    # Declared slot or recent activity
///     skills_score * 10 +          # Share of required skills
///     language_score * 5           # Speaks the preferred language
/// )
pub fn calculate_match_score(
    candidate: &HelperCandidate,
    distance_km: Option<f64>,
    ctx: &ScoringContext<'_>,
) -> (f64, ScoreBreakdown) {
    let weights = &ctx.weights;

    let breakdown = ScoreBreakdown {
        distance: weights.distance * distance_factor(distance_km, ctx.max_distance_km),
        rating: weights.rating * rating_factor(candidate.average_rating),
        service: weights.service * service_factor(candidate.services(), &ctx.request.service_type),
        experience: weights.experience * experience_factor(candidate.total_reviews),
        availability: weights.availability
            * availability_factor(candidate, ctx.request.scheduled_time, ctx.now),
        skills: weights.skills * skills_factor(&ctx.request.required_skills, candidate.skill_list()),
        language: weights.language
            * language_factor(&candidate.spoken_languages(), &ctx.request.preferred_language),
    };

    (breakdown.total().clamp(0.0, 100.0), breakdown)
}

/// Distance factor (0-1), linear from the request point to the max distance
///
/// Unknown distance earns half credit.
#[inline]
pub fn distance_factor(distance_km: Option<f64>, max_distance_km: f64) -> f64 {
    match distance_km {
        Some(distance) if max_distance_km > 0.0 => {
            (1.0 - distance.max(0.0) / max_distance_km).max(0.0)
        }
        Some(_) => 0.0,
        None => 0.5,
    }
}

/// Rating factor (0-1); unrated helpers earn half credit
#[inline]
pub fn rating_factor(average_rating: Option<f64>) -> f64 {
    match average_rating {
        Some(rating) if rating.is_finite() => rating.clamp(0.0, 5.0) / 5.0,
        Some(_) => 0.0,
        None => 0.5,
    }
}

/// Service factor (0-1)
///
/// Full credit for the requested service, otherwise partial credit for
/// versatility: a tenth per service offered, capped at half credit.
#[inline]
pub fn service_factor(services_offered: &[String], service_type: &str) -> f64 {
    if services_offered.is_empty() {
        return 0.0;
    }
    if contains_label(services_offered, service_type) {
        return 1.0;
    }

    (services_offered.len() as f64).min(VERSATILITY_SERVICES_CAP) / (2.0 * VERSATILITY_SERVICES_CAP)
}

/// Experience factor (0-1), saturating at 50 reviews
#[inline]
pub fn experience_factor(total_reviews: Option<u32>) -> f64 {
    match total_reviews {
        Some(reviews) => (reviews as f64 / REVIEWS_FOR_FULL_EXPERIENCE).min(1.0),
        None => 0.0,
    }
}

/// Availability factor (0-1)
///
/// A declared slot covering the request earns full credit; a declared
/// schedule that misses it earns none. Without a schedule, recent activity
/// stands in.
#[inline]
pub fn availability_factor(
    candidate: &HelperCandidate,
    scheduled_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f64 {
    match availability_status(candidate, scheduled_time) {
        AvailabilityStatus::Available => 1.0,
        AvailabilityStatus::Unavailable => 0.0,
        AvailabilityStatus::Undeclared => recency_factor(candidate.last_active_at, now),
    }
}

/// Skills factor (0-1): share of required skills the candidate has
///
/// Nothing required means nothing to fail.
#[inline]
pub fn skills_factor(required_skills: &[String], skills: &[String]) -> f64 {
    let required: Vec<&str> = required_skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if required.is_empty() {
        return 1.0;
    }

    let matched = required
        .iter()
        .filter(|skill| contains_label(skills, skill))
        .count();

    matched as f64 / required.len() as f64
}

/// Language factor (0 or 1)
#[inline]
pub fn language_factor(languages: &[&str], preferred_language: &str) -> f64 {
    let preferred = match preferred_language.trim() {
        "" => "en",
        lang => lang,
    };

    if languages.iter().any(|lang| same_label(lang, preferred)) {
        1.0
    } else {
        0.0
    }
}
