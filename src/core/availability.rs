use chrono::{DateTime, Duration, Utc};
use crate::models::HelperCandidate;

/// Activity within this window earns full recency credit
pub const RECENT_ACTIVITY_HOURS: i64 = 24;

/// Activity older than this earns no recency credit
pub const STALE_ACTIVITY_DAYS: i64 = 30;

/// How a helper's declared schedule relates to a requested instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityStatus {
    /// The helper declared no schedule; assumed available
    Undeclared,
    /// A declared window covers the instant
    Available,
    /// A schedule is declared but no window covers the instant
    Unavailable,
}

impl AvailabilityStatus {
    pub fn is_excluded(self) -> bool {
        self == AvailabilityStatus::Unavailable
    }
}

/// Check a candidate's declared availability against the scheduled time
pub fn availability_status(
    candidate: &HelperCandidate,
    scheduled_time: DateTime<Utc>,
) -> AvailabilityStatus {
    match &candidate.availability {
        None => AvailabilityStatus::Undeclared,
        Some(schedule) if schedule.covers(scheduled_time) => AvailabilityStatus::Available,
        Some(_) => AvailabilityStatus::Unavailable,
    }
}

/// Recency factor (0-1) for the last time a helper was active
///
/// Full credit within 24 hours (including timestamps in the future),
/// decaying linearly to zero at 30 days. Never active means zero.
pub fn recency_factor(last_active_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(last_active) = last_active_at else {
        return 0.0;
    };

    let elapsed = now.signed_duration_since(last_active);
    let fresh = Duration::hours(RECENT_ACTIVITY_HOURS);
    let stale = Duration::days(STALE_ACTIVITY_DAYS);

    if elapsed <= fresh {
        return 1.0;
    }
    if elapsed >= stale {
        return 0.0;
    }

    let span = (stale - fresh).num_seconds() as f64;
    let remaining = (stale - elapsed).num_seconds() as f64;
    (remaining / span).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, WeeklyAvailability};
    use chrono::{NaiveTime, TimeZone};

    fn now() -> DateTime<Utc> {
        // Monday
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_recency_fresh() {
        assert_eq!(recency_factor(Some(now()), now()), 1.0);
        assert_eq!(recency_factor(Some(now() - Duration::hours(23)), now()), 1.0);
        assert_eq!(recency_factor(Some(now() + Duration::hours(5)), now()), 1.0);
    }

    #[test]
    fn test_recency_decay() {
        let midway = now() - Duration::hours(24 + (720 - 24) / 2);
        let factor = recency_factor(Some(midway), now());
        assert!((factor - 0.5).abs() < 1e-9, "got {}", factor);
    }

    #[test]
    fn test_recency_stale_or_absent() {
        assert_eq!(recency_factor(Some(now() - Duration::days(30)), now()), 0.0);
        assert_eq!(recency_factor(Some(now() - Duration::days(90)), now()), 0.0);
        assert_eq!(recency_factor(None, now()), 0.0);
    }

    #[test]
    fn test_availability_status() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();

        let mut candidate = HelperCandidate::default();
        assert_eq!(availability_status(&candidate, now()), AvailabilityStatus::Undeclared);

        candidate.availability = Some(WeeklyAvailability::new().with_window(Day::Monday, nine, noon));
        assert_eq!(availability_status(&candidate, now()), AvailabilityStatus::Available);

        candidate.availability = Some(WeeklyAvailability::new().with_window(Day::Friday, nine, noon));
        assert_eq!(availability_status(&candidate, now()), AvailabilityStatus::Unavailable);

        // An empty schedule is still a declared one
        candidate.availability = Some(WeeklyAvailability::new());
        assert!(availability_status(&candidate, now()).is_excluded());
    }
}
