//! Weather snapshot handed to the AI scorer

use serde::{Deserialize, Serialize};

const ADVERSE_WIND_MS: f64 = 10.0;
const COMFORT_MIN_C: f64 = 0.0;
const COMFORT_MAX_C: f64 = 32.0;

/// Current conditions as reported by the weather collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Temperature in Celsius
    pub temp_c: f64,
    pub feels_like_c: Option<f64>,
    /// Relative humidity in percent
    pub humidity: Option<u8>,
    /// Short condition name such as `Rain`, `Clear`, `Clouds`
    pub condition: String,
    /// Wind speed in m/s
    pub wind_ms: Option<f64>,
    pub icon: Option<String>,
}

/// Normalized weather snapshot, never mutated after construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherBrief {
    pub temp_c: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feels_like_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<u8>,
    pub condition: String,
    /// Wind speed in m/s
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind: Option<f64>,
}

impl WeatherBrief {
    /// Temperature people actually feel, falling back to the air temperature
    #[must_use]
    pub fn effective_temp_c(&self) -> f64 {
        self.feels_like_c.unwrap_or(self.temp_c)
    }

    /// Precipitation, strong wind, or an uncomfortable temperature
    #[must_use]
    pub fn is_adverse(&self) -> bool {
        let condition = self.condition.to_ascii_lowercase();
        let wet = ["rain", "drizzle", "snow", "thunderstorm", "sleet"]
            .iter()
            .any(|w| condition.contains(w));
        let windy = self.wind.is_some_and(|w| w >= ADVERSE_WIND_MS);
        let temp = self.effective_temp_c();
        wet || windy || temp <= COMFORT_MIN_C || temp >= COMFORT_MAX_C
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temp_c)
    }
}

impl From<CurrentWeather> for WeatherBrief {
    fn from(current: CurrentWeather) -> Self {
        let condition = if current.condition.trim().is_empty() {
            "Unknown".to_string()
        } else {
            current.condition
        };
        Self {
            temp_c: current.temp_c,
            feels_like_c: current.feels_like_c,
            humidity: current.humidity,
            condition,
            wind: current.wind_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn brief(condition: &str, temp: f64, feels: Option<f64>, wind: Option<f64>) -> WeatherBrief {
        WeatherBrief {
            temp_c: temp,
            feels_like_c: feels,
            humidity: None,
            condition: condition.to_string(),
            wind,
        }
    }

    #[rstest]
    #[case(brief("Clear", 21.0, None, Some(2.0)), false)]
    #[case(brief("Rain", 21.0, None, None), true)]
    #[case(brief("Light snow", 1.0, None, None), true)]
    #[case(brief("Clouds", 21.0, None, Some(12.5)), true)]
    #[case(brief("Clear", 5.0, Some(-3.0), None), true)]
    #[case(brief("Clear", 33.0, None, None), true)]
    #[case(brief("Clear", 30.0, Some(31.0), None), false)]
    fn test_is_adverse(#[case] weather: WeatherBrief, #[case] expected: bool) {
        assert_eq!(weather.is_adverse(), expected);
    }

    #[test]
    fn test_from_current_fills_unknown_condition() {
        let current = CurrentWeather {
            temp_c: 18.0,
            feels_like_c: Some(17.2),
            humidity: Some(60),
            condition: " ".to_string(),
            wind_ms: Some(3.1),
            icon: Some("01d".to_string()),
        };
        let brief = WeatherBrief::from(current);
        assert_eq!(brief.condition, "Unknown");
        assert_eq!(brief.wind, Some(3.1));
        assert_eq!(brief.format_temperature(), "18.0°C");
    }
}
