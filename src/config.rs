//! Configuration management for the `DayTrip` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::DayTripError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `DayTrip` application
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DayTripConfig {
    /// Shared HTTP client settings
    pub http: HttpConfig,
    /// Kakao Local and Kakao Mobility
    pub kakao: KakaoConfig,
    /// ODsay public transit routing
    pub odsay: OdsayConfig,
    /// Weather API configuration
    pub weather: WeatherConfig,
    /// Reasoning collaborator (OpenAI-compatible chat completions)
    pub reasoning: ReasoningConfig,
    /// Place search fan-out
    pub search: SearchConfig,
    /// Candidate pipeline limits
    pub pipeline: PipelineConfig,
    /// Cache configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP client settings shared by every provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// TCP connect timeout in seconds
    pub connect_timeout_seconds: u64,
    /// Read timeout in seconds
    pub read_timeout_seconds: u64,
    /// Retries on transient failures
    pub max_retries: u32,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KakaoConfig {
    /// REST API key, sent as `KakaoAK <key>`
    pub api_key: Option<String>,
    pub local_base_url: String,
    pub mobility_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OdsayConfig {
    /// Public transit routing is skipped without a key
    pub api_key: Option<String>,
    pub base_url: String,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL for weather API
    pub base_url: String,
    /// Timezone the daily aggregates are computed in
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Without a key the pipeline falls back to pass-through filtering and ranking
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Largest radius a single place query accepts, in meters
    pub provider_max_radius_m: u32,
    pub max_pages: u32,
    pub page_size: u32,
    /// Upper bound on concurrent sub-region searches
    pub max_workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Recommendations returned when a request does not say
    pub top_k: usize,
    /// Preference filtering keeps at most `top_k * filter_multiplier` places
    pub filter_multiplier: usize,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Cache directory location
    pub location: String,
    pub geocode_ttl_days: u64,
    /// Base TTL for travel-time estimates, jittered by ±10%
    pub travel_time_ttl_days: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_connect_timeout() -> u64 {
    5
}

fn default_read_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_user_agent() -> String {
    format!("daytrip/{}", crate::VERSION)
}

fn default_kakao_local_base_url() -> String {
    "https://dapi.kakao.com".to_string()
}

fn default_kakao_mobility_base_url() -> String {
    "https://apis-navi.kakaomobility.com".to_string()
}

fn default_odsay_base_url() -> String {
    "https://api.odsay.com/v1/api".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_timezone() -> String {
    "Asia/Seoul".to_string()
}

fn default_reasoning_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_provider_max_radius() -> u32 {
    20_000
}

fn default_max_pages() -> u32 {
    5
}

fn default_page_size() -> u32 {
    15
}

fn default_max_workers() -> usize {
    crate::search::fan_out::DEFAULT_MAX_WORKERS
}

fn default_top_k() -> usize {
    5
}

fn default_filter_multiplier() -> usize {
    6
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("daytrip"))
        .unwrap_or_else(|| PathBuf::from(".daytrip-cache"))
        .to_string_lossy()
        .into_owned()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: default_connect_timeout(),
            read_timeout_seconds: default_read_timeout(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for KakaoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            local_base_url: default_kakao_local_base_url(),
            mobility_base_url: default_kakao_mobility_base_url(),
        }
    }
}

impl Default for OdsayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_odsay_base_url(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timezone: default_timezone(),
        }
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_reasoning_base_url(),
            model: default_model(),
            temperature: 0.2,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider_max_radius_m: default_provider_max_radius(),
            max_pages: default_max_pages(),
            page_size: default_page_size(),
            max_workers: default_max_workers(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            filter_multiplier: default_filter_multiplier(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            location: default_cache_location(),
            geocode_ttl_days: 30,
            travel_time_ttl_days: 7,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl DayTripConfig {
    /// Load configuration from `config_path` (or the default location) and
    /// `DAYTRIP_*` environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // DAYTRIP_KAKAO__API_KEY -> kakao.api_key
        builder = builder.add_source(
            Environment::with_prefix("DAYTRIP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: DayTripConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("daytrip").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.http.connect_timeout_seconds == 0 {
            self.http.connect_timeout_seconds = default_connect_timeout();
        }
        if self.http.read_timeout_seconds == 0 {
            self.http.read_timeout_seconds = default_read_timeout();
        }
        if self.http.user_agent.is_empty() {
            self.http.user_agent = default_user_agent();
        }
        if self.kakao.local_base_url.is_empty() {
            self.kakao.local_base_url = default_kakao_local_base_url();
        }
        if self.kakao.mobility_base_url.is_empty() {
            self.kakao.mobility_base_url = default_kakao_mobility_base_url();
        }
        if self.odsay.base_url.is_empty() {
            self.odsay.base_url = default_odsay_base_url();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timezone.is_empty() {
            self.weather.timezone = default_timezone();
        }
        if self.reasoning.base_url.is_empty() {
            self.reasoning.base_url = default_reasoning_base_url();
        }
        if self.reasoning.model.is_empty() {
            self.reasoning.model = default_model();
        }
        if self.search.provider_max_radius_m == 0 {
            self.search.provider_max_radius_m = default_provider_max_radius();
        }
        if self.search.max_pages == 0 {
            self.search.max_pages = default_max_pages();
        }
        if self.search.page_size == 0 {
            self.search.page_size = default_page_size();
        }
        if self.search.max_workers == 0 {
            self.search.max_workers = default_max_workers();
        }
        if self.pipeline.top_k == 0 {
            self.pipeline.top_k = default_top_k();
        }
        if self.pipeline.filter_multiplier == 0 {
            self.pipeline.filter_multiplier = default_filter_multiplier();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("Kakao", &self.kakao.api_key),
            ("ODsay", &self.odsay.api_key),
            ("Reasoning", &self.reasoning.api_key),
        ];

        for (name, key) in keys {
            if let Some(key) = key {
                if key.trim().is_empty() {
                    return Err(DayTripError::config(format!(
                        "{name} API key cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }
                if key.len() > 200 {
                    return Err(DayTripError::config(format!(
                        "{name} API key appears to be invalid (too long). Please check your API key."
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.connect_timeout_seconds > 60 {
            return Err(DayTripError::config("Connect timeout cannot exceed 60 seconds").into());
        }

        if self.http.read_timeout_seconds > 300 {
            return Err(DayTripError::config("Read timeout cannot exceed 300 seconds").into());
        }

        if self.http.max_retries > 10 {
            return Err(DayTripError::config("HTTP max retries cannot exceed 10").into());
        }

        if self.search.provider_max_radius_m < 3_000 || self.search.provider_max_radius_m > 20_000
        {
            return Err(DayTripError::config(
                "Provider max radius must be between 3000 and 20000 meters",
            )
            .into());
        }

        if self.search.page_size > 15 {
            return Err(DayTripError::config("Search page size cannot exceed 15").into());
        }

        if self.search.max_pages > 45 {
            return Err(DayTripError::config("Search max pages cannot exceed 45").into());
        }

        if self.search.max_workers > 32 {
            return Err(DayTripError::config("Search max workers cannot exceed 32").into());
        }

        if self.pipeline.top_k > crate::models::MAX_TOP_K {
            return Err(DayTripError::config(format!(
                "Pipeline top_k cannot exceed {}",
                crate::models::MAX_TOP_K
            ))
            .into());
        }

        if !(0.0..=2.0).contains(&self.reasoning.temperature) {
            return Err(
                DayTripError::config("Reasoning temperature must be between 0.0 and 2.0").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(DayTripError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(DayTripError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Kakao Local", &self.kakao.local_base_url),
            ("Kakao Mobility", &self.kakao.mobility_base_url),
            ("ODsay", &self.odsay.base_url),
            ("Weather API", &self.weather.base_url),
            ("Reasoning", &self.reasoning.base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(DayTripError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DayTripConfig::default();
        assert_eq!(config.weather.base_url, "https://api.open-meteo.com/v1");
        assert_eq!(config.search.provider_max_radius_m, 20_000);
        assert_eq!(config.search.max_pages, 5);
        assert_eq!(config.search.page_size, 15);
        assert_eq!(config.search.max_workers, 7);
        assert_eq!(config.pipeline.filter_multiplier, 6);
        assert_eq!(config.logging.level, "info");
        assert!(config.kakao.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_api_key() {
        let mut config = DayTripConfig::default();
        config.kakao.api_key = Some("  ".to_string());
        let result = config.validate_api_keys();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Kakao"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = DayTripConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = DayTripConfig::default();
        config.search.provider_max_radius_m = 50_000;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Provider max radius"));
    }

    #[test]
    fn test_provider_radius_below_search_minimum_rejected() {
        let mut config = DayTripConfig::default();
        config.search.provider_max_radius_m = 2_000;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("between 3000 and 20000"));

        config.search.provider_max_radius_m = 3_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_base_url() {
        let mut config = DayTripConfig::default();
        config.odsay.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults() {
        let mut config = DayTripConfig::default();
        config.search.max_workers = 0;
        config.logging.format = String::new();
        config.apply_defaults();
        assert_eq!(config.search.max_workers, 7);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[kakao]
api_key = "kakao-test-key"

[search]
max_workers = 4

[pipeline]
top_k = 3
"#
        )
        .unwrap();

        let config = DayTripConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.kakao.api_key.as_deref(), Some("kakao-test-key"));
        assert_eq!(config.search.max_workers, 4);
        assert_eq!(config.search.page_size, 15);
        assert_eq!(config.pipeline.top_k, 3);
    }

    #[test]
    fn test_config_path_generation() {
        let path = DayTripConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("daytrip"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
