use crate::core::distance::calculate_bounding_box;
use crate::models::{GeoPoint, HelperCandidate, ServiceRequest, WeeklyAvailability};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when reading from the hosted backend
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Table names in the hosted backend
#[derive(Debug, Clone)]
pub struct DirectoryTables {
    pub service_requests: String,
    pub helpers: String,
}

impl Default for DirectoryTables {
    fn default() -> Self {
        Self {
            service_requests: "service_requests".to_string(),
            helpers: "helpers".to_string(),
        }
    }
}

/// Read-only client for the hosted backend's REST interface
///
/// Supplies the matcher with:
/// - the stored service request being matched
/// - a pool of active helpers near the request
pub struct DirectoryClient {
    base_url: String,
    api_key: String,
    client: Client,
    tables: DirectoryTables,
}

/// Service request row as stored by the backend
#[derive(Debug, Deserialize)]
struct ServiceRequestRow {
    id: Value,
    service_type: String,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    address: Option<String>,
    scheduled_time: DateTime<Utc>,
    #[serde(default)]
    required_skills: Option<Vec<String>>,
    #[serde(default)]
    preferred_language: Option<String>,
}

impl From<ServiceRequestRow> for ServiceRequest {
    fn from(row: ServiceRequestRow) -> Self {
        ServiceRequest {
            id: id_to_string(&row.id).unwrap_or_default(),
            service_type: row.service_type,
            location: point_from(row.latitude, row.longitude),
            address: row.address,
            scheduled_time: row.scheduled_time,
            required_skills: row.required_skills.unwrap_or_default(),
            preferred_language: row
                .preferred_language
                .filter(|lang| !lang.trim().is_empty())
                .unwrap_or_else(crate::models::domain::default_language),
        }
    }
}

/// Helper profile row as stored by the backend
#[derive(Debug, Deserialize)]
struct HelperRow {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    average_rating: Option<f64>,
    #[serde(default)]
    total_reviews: Option<u32>,
    #[serde(default)]
    services_offered: Option<Vec<String>>,
    #[serde(default)]
    skills: Option<Vec<String>>,
    #[serde(default)]
    languages: Option<Vec<String>>,
    #[serde(default)]
    last_active_at: Option<DateTime<Utc>>,
    #[serde(default)]
    training_completed: Option<bool>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    availability: Option<WeeklyAvailability>,
}

impl From<HelperRow> for HelperCandidate {
    fn from(row: HelperRow) -> Self {
        HelperCandidate {
            id: row.id.as_ref().and_then(id_to_string),
            name: row.full_name,
            location: point_from(row.latitude, row.longitude),
            average_rating: row.average_rating,
            total_reviews: row.total_reviews,
            services_offered: row.services_offered,
            skills: row.skills,
            languages: row.languages,
            last_active_at: row.last_active_at,
            training_completed: row.training_completed,
            gender: row.gender,
            availability: row.availability,
        }
    }
}

/// Backend ids may be text, uuid or integer columns
fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn point_from(latitude: Option<f64>, longitude: Option<f64>) -> Option<GeoPoint> {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
        _ => None,
    }
}

/// Query-string filters for the helper pool around a request
///
/// The bounding box only narrows the query; the matcher applies the exact
/// distance filter afterwards.
fn candidate_filters(request: &ServiceRequest, max_distance_km: f64, limit: usize) -> Vec<String> {
    let mut filters = vec![
        "select=*".to_string(),
        "is_active=eq.true".to_string(),
    ];

    if let Some(origin) = request.resolved_location() {
        let bbox = calculate_bounding_box(origin.lat, origin.lng, max_distance_km);
        filters.push(format!("latitude=gte.{}", bbox.min_lat));
        filters.push(format!("latitude=lte.{}", bbox.max_lat));
        if !bbox.wraps_longitude() && !bbox.spans_all_longitudes() {
            filters.push(format!("longitude=gte.{}", bbox.min_lon));
            filters.push(format!("longitude=lte.{}", bbox.max_lon));
        }
    }

    filters.push(format!("limit={}", limit));
    filters
}

impl DirectoryClient {
    /// Create a new directory client
    pub fn new(
        base_url: String,
        api_key: String,
        tables: DirectoryTables,
        timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
            tables,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    async fn get_rows(&self, url: &str, what: &str) -> Result<Vec<Value>, DirectoryError> {
        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Failed to fetch {}: {} - {}", what, status, body);
            return Err(DirectoryError::ApiError(format!("Failed to fetch {}: {}", what, status)));
        }

        let json: Value = response.json().await?;

        match json {
            Value::Array(rows) => Ok(rows),
            _ => Err(DirectoryError::InvalidResponse(format!(
                "Expected an array of {}",
                what
            ))),
        }
    }

    /// Fetch a service request by id
    pub async fn get_service_request(&self, request_id: &str) -> Result<ServiceRequest, DirectoryError> {
        let url = format!(
            "{}?select=*&id=eq.{}&limit=1",
            self.table_url(&self.tables.service_requests),
            urlencoding::encode(request_id)
        );

        tracing::debug!("Fetching service request from: {}", url);

        let rows = self.get_rows(&url, "service request").await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DirectoryError::NotFound(format!("Service request {} not found", request_id)))?;

        let row: ServiceRequestRow = serde_json::from_value(row).map_err(|e| {
            DirectoryError::InvalidResponse(format!("Failed to parse service request: {}", e))
        })?;

        Ok(row.into())
    }

    /// Query active helpers near a service request
    pub async fn query_candidates(
        &self,
        request: &ServiceRequest,
        max_distance_km: f64,
        limit: usize,
    ) -> Result<Vec<HelperCandidate>, DirectoryError> {
        let filters = candidate_filters(request, max_distance_km, limit);

        let url = format!("{}?{}", self.table_url(&self.tables.helpers), filters.join("&"));

        let rows = self.get_rows(&url, "helpers").await?;
        let total = rows.len();

        let candidates: Vec<HelperCandidate> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<HelperRow>(row) {
                Ok(row) => Some(row.into()),
                Err(e) => {
                    tracing::warn!("Dropping unparseable helper row: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Queried {} candidates (rows: {})", candidates.len(), total);

        Ok(candidates)
    }
}
