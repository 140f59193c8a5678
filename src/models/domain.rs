use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Geographic point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// A point is usable only when both coordinates are finite and in range
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A service request submitted by an elderly user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: String,
    pub service_type: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub address: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default = "default_language")]
    pub preferred_language: String,
}

impl ServiceRequest {
    /// Location of the request, if it resolves to a valid point
    pub fn resolved_location(&self) -> Option<GeoPoint> {
        self.location.filter(GeoPoint::is_valid)
    }
}

pub(crate) fn default_language() -> String {
    "en".to_string()
}

/// Read-only view of a helper's profile
///
/// Every field except `id` may be missing; scoring treats each absent
/// field with its own neutral value rather than a blanket zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelperCandidate {
    #[serde(default, deserialize_with = "flexible_id::deserialize")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub total_reviews: Option<u32>,
    #[serde(default)]
    pub services_offered: Option<Vec<String>>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub last_active_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub training_completed: Option<bool>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub availability: Option<WeeklyAvailability>,
}

impl HelperCandidate {
    /// Id of the candidate, `None` when missing or blank
    pub fn helper_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn resolved_location(&self) -> Option<GeoPoint> {
        self.location.filter(GeoPoint::is_valid)
    }

    /// Review count, defaulting to zero for new helpers
    pub fn review_count(&self) -> u32 {
        self.total_reviews.unwrap_or(0)
    }

    pub fn services(&self) -> &[String] {
        self.services_offered.as_deref().unwrap_or(&[])
    }

    pub fn skill_list(&self) -> &[String] {
        self.skills.as_deref().unwrap_or(&[])
    }

    /// Spoken languages; a helper who lists none is assumed to speak English
    pub fn spoken_languages(&self) -> Vec<&str> {
        match self.languages.as_deref() {
            Some(langs) if !langs.is_empty() => langs.iter().map(String::as_str).collect(),
            _ => vec!["en"],
        }
    }
}

impl HelperCandidate {
    /// Parse one pool entry, accepting the same shapes the directory does
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Ids arrive as text or as integer columns
mod flexible_id {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<RawId>::deserialize(deserializer)?.map(|id| match id {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }))
    }
}

/// Day of the week used as availability key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for Day {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Mon => Day::Monday,
            Weekday::Tue => Day::Tuesday,
            Weekday::Wed => Day::Wednesday,
            Weekday::Thu => Day::Thursday,
            Weekday::Fri => Day::Friday,
            Weekday::Sat => Day::Saturday,
            Weekday::Sun => Day::Sunday,
        }
    }
}

/// Half-open time-of-day window, `[start, end)`
///
/// A window whose end is earlier than its start runs overnight: it covers
/// `[start, 24:00)` on its own day and `[00:00, end)` on the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "time_of_day")]
    pub start: NaiveTime,
    #[serde(with = "time_of_day")]
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn is_overnight(&self) -> bool {
        self.end < self.start
    }

    /// Whether the window covers `time` on the day it is declared for.
    /// Windows with `end == start` contain nothing.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.is_overnight() {
            self.start <= time
        } else {
            self.start <= time && time < self.end
        }
    }

    /// Whether an overnight window still covers `time` on the following day
    pub fn carries_over_to(&self, time: NaiveTime) -> bool {
        self.is_overnight() && time < self.end
    }
}

/// Weekly availability as declared by a helper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyAvailability {
    pub days: BTreeMap<Day, Vec<TimeWindow>>,
}

impl WeeklyAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, day: Day, start: NaiveTime, end: NaiveTime) -> Self {
        self.days
            .entry(day)
            .or_default()
            .push(TimeWindow::new(start, end));
        self
    }

    pub fn windows(&self, day: Day) -> &[TimeWindow] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the instant falls inside a window of its (UTC) weekday, or
    /// inside an overnight window declared the day before
    pub fn covers(&self, instant: DateTime<Utc>) -> bool {
        let weekday = instant.weekday();
        let time = instant.time();

        self.windows(Day::from(weekday)).iter().any(|w| w.contains(time))
            || self
                .windows(Day::from(weekday.pred()))
                .iter()
                .any(|w| w.carries_over_to(time))
    }
}

mod time_of_day {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
            .map_err(|e| de::Error::custom(format!("invalid time of day {:?}: {}", raw, e)))
    }
}

/// Caller-supplied filters, always fully populated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFilterConfig {
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,
    #[serde(default)]
    pub min_rating: f64,
    #[serde(default)]
    pub prioritize_rating: bool,
    #[serde(default)]
    pub required_services: Vec<String>,
    #[serde(default)]
    pub preferred_gender: Option<String>,
    #[serde(default = "default_true")]
    pub use_availability: bool,
}

pub const DEFAULT_MAX_DISTANCE_KM: f64 = 20.0;

fn default_max_distance_km() -> f64 {
    DEFAULT_MAX_DISTANCE_KM
}

fn default_true() -> bool {
    true
}

impl Default for MatchFilterConfig {
    fn default() -> Self {
        Self {
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            min_rating: 0.0,
            prioritize_rating: false,
            required_services: Vec::new(),
            preferred_gender: None,
            use_availability: true,
        }
    }
}

impl MatchFilterConfig {
    pub fn builder() -> MatchFilterConfigBuilder {
        MatchFilterConfigBuilder::default()
    }

    /// Gender preference, ignoring blank values and "any"
    pub fn gender_preference(&self) -> Option<&str> {
        self.preferred_gender
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty() && !g.eq_ignore_ascii_case("any"))
    }
}

/// Builder for [`MatchFilterConfig`]; unset fields keep their defaults
#[derive(Debug, Clone, Default)]
pub struct MatchFilterConfigBuilder {
    config: MatchFilterConfig,
}

impl MatchFilterConfigBuilder {
    pub fn max_distance_km(mut self, km: f64) -> Self {
        self.config.max_distance_km = km;
        self
    }

    pub fn min_rating(mut self, rating: f64) -> Self {
        self.config.min_rating = rating;
        self
    }

    pub fn prioritize_rating(mut self, prioritize: bool) -> Self {
        self.config.prioritize_rating = prioritize;
        self
    }

    pub fn required_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.required_services = services.into_iter().map(Into::into).collect();
        self
    }

    pub fn preferred_gender(mut self, gender: impl Into<String>) -> Self {
        self.config.preferred_gender = Some(gender.into());
        self
    }

    pub fn use_availability(mut self, enabled: bool) -> Self {
        self.config.use_availability = enabled;
        self
    }

    pub fn build(self) -> MatchFilterConfig {
        self.config
    }
}

/// Weight of each sub-score; the defaults sum to 100
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub distance: f64,
    pub rating: f64,
    pub service: f64,
    pub experience: f64,
    pub availability: f64,
    pub skills: f64,
    pub language: f64,
}

impl ScoringWeights {
    /// Weights with distance and rating emphasis swapped
    pub fn prioritizing_rating(self) -> Self {
        Self {
            distance: self.rating,
            rating: self.distance,
            ..self
        }
    }

    /// Weights in effect for a given filter configuration
    pub fn for_config(self, config: &MatchFilterConfig) -> Self {
        if config.prioritize_rating {
            self.prioritizing_rating()
        } else {
            self
        }
    }

    pub fn total(&self) -> f64 {
        self.distance
            + self.rating
            + self.service
            + self.experience
            + self.availability
            + self.skills
            + self.language
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            distance: 25.0,
            rating: 20.0,
            service: 20.0,
            experience: 10.0,
            availability: 10.0,
            skills: 10.0,
            language: 5.0,
        }
    }
}

/// Per-component contribution to a match score, in points
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub distance: f64,
    pub rating: f64,
    pub service: f64,
    pub experience: f64,
    pub availability: f64,
    pub skills: f64,
    pub language: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.distance
            + self.rating
            + self.service
            + self.experience
            + self.availability
            + self.skills
            + self.language
    }
}

/// Scored helper returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    #[serde(flatten)]
    pub helper: HelperCandidate,
    /// Great-circle distance; `None` when either side has no location
    pub distance_km: Option<f64>,
    pub match_score: f64,
    pub breakdown: ScoreBreakdown,
}

impl MatchResult {
    pub fn helper_id(&self) -> &str {
        self.helper.helper_id().unwrap_or_default()
    }
}

/// Why a candidate was dropped by a hard filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExclusionReason {
    Distance,
    Rating,
    Services,
    Availability,
    Gender,
}

/// Number of candidates dropped per hard filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionCounts {
    pub distance: usize,
    pub rating: usize,
    pub services: usize,
    pub availability: usize,
    pub gender: usize,
}

impl ExclusionCounts {
    pub fn record(&mut self, reason: ExclusionReason) {
        match reason {
            ExclusionReason::Distance => self.distance += 1,
            ExclusionReason::Rating => self.rating += 1,
            ExclusionReason::Services => self.services += 1,
            ExclusionReason::Availability => self.availability += 1,
            ExclusionReason::Gender => self.gender += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.distance + self.rating + self.services + self.availability + self.gender
    }
}
