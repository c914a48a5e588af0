//! Search center coordinates

use serde::{Deserialize, Serialize};

use crate::TravelRankError;

/// Latitude/longitude anchor for a nearby search
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Center {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lng: f64,
}

impl Center {
    /// Create a center, rejecting out of range coordinates
    pub fn new(lat: f64, lng: f64) -> crate::Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(TravelRankError::validation(format!(
                "Latitude {lat} is outside -90..=90"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(TravelRankError::validation(format!(
                "Longitude {lng} is outside -180..=180"
            )));
        }
        Ok(Self { lat, lng })
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_validation() {
        assert!(Center::new(37.5665, 126.978).is_ok());
        assert!(Center::new(91.0, 0.0).is_err());
        assert!(Center::new(0.0, -180.5).is_err());
        assert!(Center::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_format_coordinates() {
        let center = Center::new(37.566_535, 126.977_969).unwrap();
        assert_eq!(center.format_coordinates(), "37.5665, 126.9780");
    }
}
