//! Configuration management for `TravelRank`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TravelRankError;
use crate::models::PipelineMode;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `TravelRank`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TravelRankConfig {
    /// Place search (Kakao Local) configuration
    #[serde(default)]
    pub search: SearchConfig,
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// AI re-rank configuration
    #[serde(default)]
    pub ai: AiConfig,
    /// Ranking and pipeline settings
    #[serde(default)]
    pub ranking: RankingConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Place search API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Kakao REST API key
    pub api_key: Option<String>,
    /// Base URL for the search API
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_search_max_retries")]
    pub max_retries: u32,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    /// Base URL for weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u32,
}

/// AI scoring service configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// OpenAI-compatible API key
    pub api_key: Option<String>,
    /// Base URL for the chat completions API
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    /// Chat model name
    #[serde(default = "default_ai_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_ai_temperature")]
    pub temperature: f32,
    /// Timeout for one re-rank call in seconds
    #[serde(default = "default_ai_timeout")]
    pub timeout_seconds: u32,
    /// Upper bound on picks requested in the prompt
    #[serde(default = "default_ai_max_picks")]
    pub max_picks: u32,
}

/// Ranking and pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_min_per_category")]
    pub min_per_category: usize,
    #[serde(default = "default_top_picks_per_category")]
    pub top_picks_per_category: usize,
    /// Optional cap on the score-ordered fill; pinned picks and per-category
    /// minimums are placed regardless
    #[serde(default)]
    pub total_cap: Option<usize>,
    #[serde(default)]
    pub mode: PipelineMode,
    /// Cap on aggregated candidates across categories
    #[serde(default = "default_global_cap")]
    pub global_cap: usize,
    #[serde(default = "default_per_category_size")]
    pub per_category_size: u32,
    #[serde(default = "default_radius_meters")]
    pub radius_meters: u32,
    /// Deadline for the whole recommendation
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
    /// Timeout for each category search
    #[serde(default = "default_search_timeout")]
    pub search_timeout_seconds: u32,
    /// How many AI-ordered ids are flagged as AI top picks
    #[serde(default = "default_ai_top_count")]
    pub ai_top_count: usize,
    /// Region used when a requested region cannot be geocoded
    #[serde(default = "default_region")]
    pub default_region: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_search_base_url() -> String {
    "https://dapi.kakao.com".to_string()
}

fn default_http_timeout() -> u32 {
    10
}

fn default_search_max_retries() -> u32 {
    2
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_ai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ai_temperature() -> f32 {
    0.2
}

fn default_ai_timeout() -> u32 {
    15
}

fn default_ai_max_picks() -> u32 {
    5
}

fn default_min_per_category() -> usize {
    4
}

fn default_top_picks_per_category() -> usize {
    1
}

fn default_global_cap() -> usize {
    60
}

fn default_per_category_size() -> u32 {
    15
}

fn default_radius_meters() -> u32 {
    3000
}

fn default_request_timeout() -> u32 {
    20
}

fn default_search_timeout() -> u32 {
    10
}

fn default_ai_top_count() -> usize {
    3
}

fn default_region() -> String {
    "서울특별시 중구 세종대로 110".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_search_base_url(),
            timeout_seconds: default_http_timeout(),
            max_retries: default_search_max_retries(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_http_timeout(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_ai_base_url(),
            model: default_ai_model(),
            temperature: default_ai_temperature(),
            timeout_seconds: default_ai_timeout(),
            max_picks: default_ai_max_picks(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_per_category: default_min_per_category(),
            top_picks_per_category: default_top_picks_per_category(),
            total_cap: None,
            mode: PipelineMode::default(),
            global_cap: default_global_cap(),
            per_category_size: default_per_category_size(),
            radius_meters: default_radius_meters(),
            request_timeout_seconds: default_request_timeout(),
            search_timeout_seconds: default_search_timeout(),
            ai_top_count: default_ai_top_count(),
            default_region: default_region(),
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

impl TravelRankConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

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

        // TRAVELRANK_SEARCH__API_KEY -> search.api_key
        builder = builder.add_source(
            Environment::with_prefix("TRAVELRANK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TravelRankConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("travelrank").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.search.base_url.is_empty() {
            self.search.base_url = default_search_base_url();
        }
        if self.search.timeout_seconds == 0 {
            self.search.timeout_seconds = default_http_timeout();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_http_timeout();
        }
        if self.ai.base_url.is_empty() {
            self.ai.base_url = default_ai_base_url();
        }
        if self.ai.model.is_empty() {
            self.ai.model = default_ai_model();
        }
        if self.ai.timeout_seconds == 0 {
            self.ai.timeout_seconds = default_ai_timeout();
        }
        if self.ai.max_picks == 0 {
            self.ai.max_picks = default_ai_max_picks();
        }
        if self.ranking.global_cap == 0 {
            self.ranking.global_cap = default_global_cap();
        }
        if self.ranking.per_category_size == 0 {
            self.ranking.per_category_size = default_per_category_size();
        }
        if self.ranking.radius_meters == 0 {
            self.ranking.radius_meters = default_radius_meters();
        }
        if self.ranking.request_timeout_seconds == 0 {
            self.ranking.request_timeout_seconds = default_request_timeout();
        }
        if self.ranking.search_timeout_seconds == 0 {
            self.ranking.search_timeout_seconds = default_search_timeout();
        }
        if self.ranking.default_region.trim().is_empty() {
            self.ranking.default_region = default_region();
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
    ///
    /// Keys are optional here; clients refuse to start without theirs.
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("Search", &self.search.api_key),
            ("Weather", &self.weather.api_key),
            ("AI", &self.ai.api_key),
        ];
        for (name, key) in keys {
            if let Some(key) = key
                && key.trim().is_empty()
            {
                return Err(TravelRankError::config(format!(
                    "{name} API key cannot be empty if provided. Either remove it or provide a valid key."
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Search API", self.search.timeout_seconds),
            ("Weather API", self.weather.timeout_seconds),
            ("AI API", self.ai.timeout_seconds),
            ("Request", self.ranking.request_timeout_seconds),
            ("Category search", self.ranking.search_timeout_seconds),
        ];
        for (name, seconds) in timeouts {
            if seconds > 300 {
                return Err(TravelRankError::config(format!(
                    "{name} timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        if self.search.max_retries > 10 {
            return Err(TravelRankError::config("Search API max retries cannot exceed 10").into());
        }

        if !(1..=20_000).contains(&self.ranking.radius_meters) {
            return Err(TravelRankError::config(
                "Search radius must be between 1 and 20000 meters",
            )
            .into());
        }

        if !(1..=15).contains(&self.ranking.per_category_size) {
            return Err(
                TravelRankError::config("Per-category page size must be between 1 and 15").into(),
            );
        }

        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(TravelRankError::config("AI temperature must be between 0.0 and 2.0").into());
        }

        if self.ranking.total_cap == Some(0) {
            return Err(TravelRankError::config(
                "Total cap must be positive; omit it for no cap",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TravelRankError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TravelRankError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Search API", &self.search.base_url),
            ("Weather API", &self.weather.base_url),
            ("AI API", &self.ai.base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TravelRankError::config(format!(
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
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TravelRankConfig::default();
        assert_eq!(config.search.base_url, "https://dapi.kakao.com");
        assert_eq!(config.weather.base_url, "https://api.openweathermap.org");
        assert_eq!(config.ranking.min_per_category, 4);
        assert_eq!(config.ranking.top_picks_per_category, 1);
        assert_eq!(config.ranking.total_cap, None);
        assert_eq!(config.ranking.mode, PipelineMode::Rebalanced);
        assert_eq!(config.ranking.global_cap, 60);
        assert_eq!(config.ranking.ai_top_count, 3);
        assert_eq!(config.logging.level, "info");
        assert!(config.search.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_api_key() {
        let mut config = TravelRankConfig::default();
        config.ai.api_key = Some("   ".to_string());
        let result = config.validate_api_keys();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("AI API key"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = TravelRankConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[rstest]
    #[case::radius_zero(|c: &mut TravelRankConfig| c.ranking.radius_meters = 0, "radius")]
    #[case::radius_too_far(|c: &mut TravelRankConfig| c.ranking.radius_meters = 20_001, "radius")]
    #[case::page_too_big(|c: &mut TravelRankConfig| c.ranking.per_category_size = 16, "page size")]
    #[case::timeout(|c: &mut TravelRankConfig| c.ai.timeout_seconds = 500, "timeout cannot exceed")]
    #[case::retries(|c: &mut TravelRankConfig| c.search.max_retries = 11, "retries")]
    #[case::zero_cap(|c: &mut TravelRankConfig| c.ranking.total_cap = Some(0), "Total cap")]
    #[case::bad_url(|c: &mut TravelRankConfig| c.weather.base_url = "ftp://x".into(), "base URL")]
    fn test_config_validation_rejects(
        #[case] mutate: fn(&mut TravelRankConfig),
        #[case] expected: &str,
    ) {
        let mut config = TravelRankConfig::default();
        mutate(&mut config);
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains(expected), "{err}");
    }

    #[test]
    fn test_apply_defaults_repairs_zeroes() {
        let mut config = TravelRankConfig::default();
        config.ranking.radius_meters = 0;
        config.ranking.global_cap = 0;
        config.ai.model = String::new();
        config.apply_defaults();
        assert_eq!(config.ranking.radius_meters, 3000);
        assert_eq!(config.ranking.global_cap, 60);
        assert_eq!(config.ai.model, "gpt-4o-mini");
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!(
            "travelrank-config-test-{}.toml",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[search]\napi_key = \"kakao-file-key\"\n\n[ranking]\nmode = \"raw\"\nmin_per_category = 2\ntotal_cap = 12\n"
        )
        .unwrap();

        let config = TravelRankConfig::load_from_path(Some(path.clone()));
        std::fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        assert_eq!(config.search.api_key.as_deref(), Some("kakao-file-key"));
        assert_eq!(config.ranking.mode, PipelineMode::Raw);
        assert_eq!(config.ranking.min_per_category, 2);
        assert_eq!(config.ranking.total_cap, Some(12));
        assert_eq!(config.ranking.radius_meters, 3000);
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = TravelRankConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("travelrank"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
