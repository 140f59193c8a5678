use chrono::{DateTime, Utc};
use thiserror::Error;
use crate::models::{
    ExclusionCounts, HelperCandidate, MatchFilterConfig, MatchResult, ScoringWeights, ServiceRequest,
};
use crate::core::{
    filters::{check_hard_filters, DistanceFilter},
    scoring::{calculate_match_score, ScoringContext},
};

/// Errors raised by the matcher
#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result of the matching process
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub matches: Vec<MatchResult>,
    pub total_candidates: usize,
    pub skipped_malformed: usize,
    pub excluded: ExclusionCounts,
}

impl MatchOutcome {
    /// Keep only the best `limit` matches
    pub fn truncate(&mut self, limit: usize) {
        self.matches.truncate(limit);
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Count pool entries that never parsed as helper profiles
    pub fn record_unparsed(&mut self, count: usize) {
        self.total_candidates += count;
        self.skipped_malformed += count;
    }
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Skip malformed candidates (no id)
/// 2. Hard filters: distance, rating, services, availability, gender
/// 3. Weighted scoring
/// 4. Ranking: score, then review count, then id
///
/// The matcher holds no mutable state; one instance can serve any number of
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
}

impl Matcher {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    /// Rank helpers for a service request using the current time
    pub fn find_matches(
        &self,
        request: &ServiceRequest,
        candidates: Vec<HelperCandidate>,
        config: &MatchFilterConfig,
    ) -> Result<MatchOutcome, MatchError> {
        self.find_matches_at(request, candidates, config, Utc::now())
    }

    /// Nullable entry point for boundaries where either the request or the
    /// config may not have been supplied
    pub fn try_find_matches(
        &self,
        request: Option<&ServiceRequest>,
        candidates: Vec<HelperCandidate>,
        config: Option<&MatchFilterConfig>,
    ) -> Result<MatchOutcome, MatchError> {
        let request = request
            .ok_or_else(|| MatchError::InvalidArgument("service request is required".into()))?;
        let config = config
            .ok_or_else(|| MatchError::InvalidArgument("match filter config is required".into()))?;

        self.find_matches(request, candidates, config)
    }

    /// Rank helpers for a service request
    ///
    /// # Arguments
    /// * `request` - The service request being fulfilled
    /// * `candidates` - Candidate helpers, already fetched
    /// * `config` - Hard filters and weighting preference
    /// * `now` - Reference time for activity recency
    ///
    /// # Returns
    /// MatchOutcome with surviving helpers sorted best first
    pub fn find_matches_at(
        &self,
        request: &ServiceRequest,
        candidates: Vec<HelperCandidate>,
        config: &MatchFilterConfig,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome, MatchError> {
        validate_config(config)?;

        let total_candidates = candidates.len();
        let distance_filter = request
            .resolved_location()
            .map(|origin| DistanceFilter::new(origin, config.max_distance_km));

        if distance_filter.is_none() {
            tracing::debug!(
                "Request {} has no usable location, distance scored at half credit",
                request.id
            );
        }

        let ctx = ScoringContext {
            request,
            weights: self.weights.for_config(config),
            max_distance_km: config.max_distance_km,
            now,
        };

        let mut skipped_malformed = 0;
        let mut excluded = ExclusionCounts::default();
        let mut matches = Vec::with_capacity(total_candidates);

        for candidate in candidates {
            let Some(helper_id) = candidate.helper_id() else {
                skipped_malformed += 1;
                tracing::debug!("Skipping candidate without id");
                continue;
            };

            let eligibility = match check_hard_filters(
                &candidate,
                request,
                config,
                distance_filter.as_ref(),
            ) {
                Ok(eligibility) => eligibility,
                Err(reason) => {
                    tracing::debug!("Excluded helper {}: {:?}", helper_id, reason);
                    excluded.record(reason);
                    continue;
                }
            };

            let (match_score, breakdown) =
                calculate_match_score(&candidate, eligibility.distance_km, &ctx);

            matches.push(MatchResult {
                helper: candidate,
                distance_km: eligibility.distance_km,
                match_score,
                breakdown,
            });
        }

        sort_matches(&mut matches);

        tracing::debug!(
            "Ranked {} of {} candidates for request {} (excluded: {}, malformed: {})",
            matches.len(),
            total_candidates,
            request.id,
            excluded.total(),
            skipped_malformed
        );

        Ok(MatchOutcome {
            matches,
            total_candidates,
            skipped_malformed,
            excluded,
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

/// Rank helpers with default weights, rejecting a missing request or config
pub fn find_matching_helpers(
    request: Option<&ServiceRequest>,
    candidates: Vec<HelperCandidate>,
    config: Option<&MatchFilterConfig>,
) -> Result<MatchOutcome, MatchError> {
    Matcher::with_default_weights().try_find_matches(request, candidates, config)
}

/// Sort by score (descending), then review count (descending), then id (ascending)
pub fn sort_matches(matches: &mut [MatchResult]) {
    matches.sort_by(|a, b| {
        b.match_score
            .total_cmp(&a.match_score)
            .then_with(|| b.helper.review_count().cmp(&a.helper.review_count()))
            .then_with(|| a.helper_id().cmp(b.helper_id()))
    });
}

fn validate_config(config: &MatchFilterConfig) -> Result<(), MatchError> {
    if !config.max_distance_km.is_finite() || config.max_distance_km <= 0.0 {
        return Err(MatchError::InvalidArgument(format!(
            "maxDistanceKm must be a positive number, got {}",
            config.max_distance_km
        )));
    }

    if !(0.0..=5.0).contains(&config.min_rating) {
        return Err(MatchError::InvalidArgument(format!(
            "minRating must be between 0 and 5, got {}",
            config.min_rating
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    fn create_request() -> ServiceRequest {
        ServiceRequest {
            id: "req-1".to_string(),
            service_type: "shopping".to_string(),
            location: Some(GeoPoint::new(40.7128, -74.0060)), // New York
            address: None,
            scheduled_time: now(),
            required_skills: vec![],
            preferred_language: "en".to_string(),
        }
    }

    fn create_candidate(id: &str, lat: f64, lng: f64, rating: f64, reviews: u32) -> HelperCandidate {
        HelperCandidate {
            id: Some(id.to_string()),
            location: Some(GeoPoint::new(lat, lng)),
            average_rating: Some(rating),
            total_reviews: Some(reviews),
            services_offered: Some(vec!["shopping".to_string()]),
            last_active_at: Some(now()),
            ..Default::default()
        }
    }

    #[test]
    fn test_find_matches_basic() {
        let matcher = Matcher::with_default_weights();
        let config = MatchFilterConfig::builder().min_rating(3.0).build();

        let candidates = vec![
            create_candidate("1", 40.72, -74.01, 4.8, 30), // Close, good rating
            create_candidate("2", 40.72, -74.01, 2.0, 30), // Rating below floor
            create_candidate("3", 41.5, -74.0, 4.8, 30),   // Too far
        ];

        let outcome = matcher
            .find_matches_at(&create_request(), candidates, &config, now())
            .unwrap();

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].helper_id(), "1");
        assert_eq!(outcome.total_candidates, 3);
        assert_eq!(outcome.excluded.rating, 1);
        assert_eq!(outcome.excluded.distance, 1);
    }

    #[test]
    fn test_matches_sorted_by_score() {
        let matcher = Matcher::with_default_weights();
        let config = MatchFilterConfig::default();

        let candidates = vec![
            create_candidate("far", 40.80, -74.0060, 4.0, 10),
            create_candidate("near", 40.7130, -74.0060, 4.0, 10),
        ];

        let outcome = matcher
            .find_matches_at(&create_request(), candidates, &config, now())
            .unwrap();

        assert_eq!(outcome.matches.len(), 2);
        assert_eq!(outcome.matches[0].helper_id(), "near");
        assert!(outcome.matches[0].match_score > outcome.matches[1].match_score);
    }

    #[test]
    fn test_ties_break_by_reviews_then_id() {
        let matcher = Matcher::with_default_weights();
        let config = MatchFilterConfig::default();

        // Both saturate experience credit, so scores tie
        let candidates = vec![
            create_candidate("b", 40.7128, -74.0060, 5.0, 60),
            create_candidate("c", 40.7128, -74.0060, 5.0, 80),
            create_candidate("a", 40.7128, -74.0060, 5.0, 60),
        ];

        let outcome = matcher
            .find_matches_at(&create_request(), candidates, &config, now())
            .unwrap();

        let ids: Vec<&str> = outcome.matches.iter().map(|m| m.helper_id()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_malformed_candidates_skipped() {
        let matcher = Matcher::with_default_weights();
        let mut missing = create_candidate("x", 40.72, -74.01, 4.0, 1);
        missing.id = None;
        let mut blank = create_candidate("y", 40.72, -74.01, 4.0, 1);
        blank.id = Some("   ".to_string());

        let outcome = matcher
            .find_matches_at(&create_request(), vec![missing, blank], &MatchFilterConfig::default(), now())
            .unwrap();

        assert!(outcome.is_empty());
        assert_eq!(outcome.skipped_malformed, 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let matcher = Matcher::with_default_weights();

        let config = MatchFilterConfig::builder().max_distance_km(0.0).build();
        let err = matcher
            .find_matches_at(&create_request(), vec![], &config, now())
            .unwrap_err();
        assert!(matches!(err, MatchError::InvalidArgument(_)));

        let config = MatchFilterConfig::builder().min_rating(6.0).build();
        assert!(matcher.find_matches_at(&create_request(), vec![], &config, now()).is_err());
    }

    #[test]
    fn test_missing_arguments_rejected() {
        let request = create_request();
        let config = MatchFilterConfig::default();

        assert!(matches!(
            find_matching_helpers(None, vec![], Some(&config)),
            Err(MatchError::InvalidArgument(_))
        ));
        assert!(matches!(
            find_matching_helpers(Some(&request), vec![], None),
            Err(MatchError::InvalidArgument(_))
        ));
        assert!(find_matching_helpers(Some(&request), vec![], Some(&config))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_truncate_keeps_best() {
        let matcher = Matcher::with_default_weights();
        let candidates: Vec<HelperCandidate> = (0..20)
            .map(|i| create_candidate(&i.to_string(), 40.7128 + i as f64 * 0.001, -74.0060, 4.0, 10))
            .collect();

        let mut outcome = matcher
            .find_matches_at(&create_request(), candidates, &MatchFilterConfig::default(), now())
            .unwrap();
        outcome.truncate(5);

        assert_eq!(outcome.matches.len(), 5);
        assert_eq!(outcome.matches[0].helper_id(), "0");
    }

    #[test]
    fn test_record_unparsed_counts_as_malformed() {
        let mut outcome = find_matching_helpers(
            Some(&create_request()),
            vec![create_candidate("1", 40.72, -74.01, 4.8, 30)],
            Some(&MatchFilterConfig::default()),
        )
        .unwrap();
        outcome.record_unparsed(2);

        assert_eq!(outcome.total_candidates, 3);
        assert_eq!(outcome.skipped_malformed, 2);
        assert_eq!(outcome.matches.len(), 1);
    }

    /// Collects the level of every "Excluded helper" event
    struct ExclusionLevels(std::sync::Arc<std::sync::Mutex<Vec<tracing::Level>>>);

    struct MessageVisitor(String);

    impl tracing::field::Visit for MessageVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for ExclusionLevels {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            if visitor.0.starts_with("Excluded helper") {
                self.0.lock().unwrap().push(*event.metadata().level());
            }
        }
    }

    #[test]
    fn test_exclusions_logged_at_debug() {
        use tracing_subscriber::prelude::*;

        let levels = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(ExclusionLevels(levels.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let candidates = vec![
                create_candidate("near", 40.72, -74.01, 4.8, 30),
                create_candidate("far", 41.5, -74.0, 4.8, 30),
            ];
            Matcher::with_default_weights()
                .find_matches_at(&create_request(), candidates, &MatchFilterConfig::default(), now())
                .unwrap();
        });

        assert_eq!(*levels.lock().unwrap(), vec![tracing::Level::DEBUG]);
    }
}
