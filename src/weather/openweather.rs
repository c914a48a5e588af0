//! OpenWeatherMap current conditions client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::WeatherLookup;
use crate::TravelRankError;
use crate::config::WeatherConfig;
use crate::models::CurrentWeather;

/// `data/2.5/weather` response, reduced to what we read
#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    weather: Vec<ConditionEntry>,
    main: MainBlock,
    wind: Option<WindBlock>,
}

#[derive(Debug, Deserialize)]
struct ConditionEntry {
    main: String,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    feels_like: Option<f64>,
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: Option<f64>,
}

impl From<CurrentResponse> for CurrentWeather {
    fn from(resp: CurrentResponse) -> Self {
        let first = resp.weather.into_iter().next();
        Self {
            temp_c: resp.main.temp,
            feels_like_c: resp.main.feels_like,
            humidity: resp.main.humidity,
            condition: first
                .as_ref()
                .map_or_else(|| "Unknown".to_string(), |c| c.main.clone()),
            wind_ms: resp.wind.and_then(|w| w.speed),
            icon: first.and_then(|c| c.icon),
        }
    }
}

/// OpenWeatherMap client (metric units)
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    /// Create a new client. Fails without an API key.
    pub fn new(config: &WeatherConfig) -> crate::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TravelRankError::config("OpenWeatherMap API key is not configured"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("TravelRank/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TravelRankError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn current_url(&self, lat: f64, lng: f64) -> crate::Result<reqwest::Url> {
        reqwest::Url::parse_with_params(
            &format!("{}/data/2.5/weather", self.base_url),
            &[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ],
        )
        .map_err(|e| TravelRankError::config(format!("Invalid weather URL: {e}")))
    }
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn current(&self, lat: f64, lng: f64) -> crate::Result<Option<CurrentWeather>> {
        info!("Getting current weather for coordinates: {:.4}, {:.4}", lat, lng);
        let start_time = Instant::now();

        let response = self.client.get(self.current_url(lat, lng)?).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("No weather station data for this point");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(TravelRankError::transport(format!(
                "OpenWeatherMap API error {}",
                response.status()
            )));
        }

        let parsed: CurrentResponse = response
            .json()
            .await
            .map_err(|e| TravelRankError::malformed(format!("Invalid weather data: {e}")))?;

        let total_duration = start_time.elapsed();
        if total_duration.as_secs() > 5 {
            warn!("Slow weather API response: {:.3}s", total_duration.as_secs_f64());
        }

        Ok(Some(parsed.into()))
    }
}
