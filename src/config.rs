use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::models::{MatchFilterConfig, DEFAULT_MAX_DISTANCE_KM};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub backend: BackendSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_service_requests_table")]
    pub service_requests_table: String,
    #[serde(default = "default_helpers_table")]
    pub helpers_table: String,
    pub timeout_secs: Option<u64>,
}

fn default_service_requests_table() -> String { "service_requests".to_string() }
fn default_helpers_table() -> String { "helpers".to_string() }

/// Filter defaults for callers that send no filters of their own
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,
    #[serde(default)]
    pub min_rating: f64,
    #[serde(default = "default_use_availability")]
    pub use_availability: bool,
    pub default_limit: Option<u16>,
    pub max_limit: Option<u16>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            max_distance_km: default_max_distance_km(),
            min_rating: 0.0,
            use_availability: default_use_availability(),
            default_limit: None,
            max_limit: None,
        }
    }
}

impl MatchingSettings {
    pub fn default_filters(&self) -> MatchFilterConfig {
        MatchFilterConfig::builder()
            .max_distance_km(self.max_distance_km)
            .min_rating(self.min_rating)
            .use_availability(self.use_availability)
            .build()
    }

    pub fn limit_cap(&self) -> usize {
        self.max_limit.unwrap_or(100) as usize
    }

    /// Limit for a caller that asked for `requested` matches (or none)
    pub fn effective_limit(&self, requested: Option<u16>) -> usize {
        let limit = requested.or(self.default_limit).unwrap_or(20) as usize;
        limit.min(self.limit_cap())
    }
}

fn default_max_distance_km() -> f64 { DEFAULT_MAX_DISTANCE_KM }
fn default_use_availability() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CAREMATCH)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CAREMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("CAREMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("CAREMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply the short-form backend variables on top of the layered config
///
/// `CAREMATCH_BACKEND_URL` and `CAREMATCH_BACKEND_KEY` are what deployment
/// platforms usually inject as secrets.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("CAREMATCH_BACKEND_URL") {
        builder = builder.set_override("backend.url", url)?;
    }
    if let Ok(key) = env::var("CAREMATCH_BACKEND_KEY") {
        builder = builder.set_override("backend.api_key", key)?;
    }

    builder.build()
}
