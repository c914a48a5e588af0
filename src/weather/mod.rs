//! Weather lookup collaborators

use async_trait::async_trait;

use crate::models::CurrentWeather;

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Current conditions at a point. `Ok(None)` means the provider had nothing.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn current(&self, lat: f64, lng: f64) -> crate::Result<Option<CurrentWeather>>;
}
