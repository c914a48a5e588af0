//! Location Resolution Module
//!
//! Turns what the user typed (coordinates or a free text region) into the
//! search [`Center`].

use std::sync::Arc;
use tracing::{debug, warn};

use crate::TravelRankError;
use crate::models::Center;
use crate::search::Geocoder;

/// Where the user wants recommendations
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    Coordinates(f64, f64),
    Region(String),
}

/// Resolves location inputs, falling back to a default region
pub struct CenterResolver {
    geocoder: Arc<dyn Geocoder>,
    default_region: String,
}

impl CenterResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, default_region: impl Into<String>) -> Self {
        Self {
            geocoder,
            default_region: default_region.into(),
        }
    }

    /// Resolve a location input into a search center
    pub async fn resolve(&self, input: &LocationInput) -> crate::Result<Center> {
        debug!("Resolving location input: {:?}", input);
        match input {
            LocationInput::Coordinates(lat, lng) => Center::new(*lat, *lng),
            LocationInput::Region(region) => self.resolve_region(region).await,
        }
    }

    async fn resolve_region(&self, region: &str) -> crate::Result<Center> {
        let region = region.trim();
        if !region.is_empty() {
            if let Some(center) = self.try_geocode(region).await {
                return Ok(center);
            }
            if region == self.default_region {
                return Err(TravelRankError::validation(format!(
                    "Location not found: {region}"
                )));
            }
            warn!(region, fallback = %self.default_region, "Region not found, using default region");
        }

        self.try_geocode(&self.default_region)
            .await
            .ok_or_else(|| {
                TravelRankError::validation(format!(
                    "Location not found: '{region}' (default region '{}' also failed)",
                    self.default_region
                ))
            })
    }

    async fn try_geocode(&self, query: &str) -> Option<Center> {
        match self.geocoder.geocode(query).await {
            Ok(found) => found,
            Err(e) => {
                warn!(query, error = %e, "Geocoding failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeGeocoder {
        known: HashMap<&'static str, Center>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn geocode(&self, query: &str) -> crate::Result<Option<Center>> {
            self.queries.lock().unwrap().push(query.to_string());
            if query == "broken" {
                return Err(TravelRankError::transport("HTTP 500"));
            }
            Ok(self.known.get(query).copied())
        }
    }

    fn resolver(known: &[(&'static str, f64, f64)]) -> (CenterResolver, Arc<FakeGeocoder>) {
        let geocoder = Arc::new(FakeGeocoder {
            known: known
                .iter()
                .map(|(name, lat, lng)| (*name, Center::new(*lat, *lng).unwrap()))
                .collect(),
            queries: Mutex::new(Vec::new()),
        });
        (CenterResolver::new(geocoder.clone(), "Seoul"), geocoder)
    }

    #[tokio::test]
    async fn test_coordinates_skip_geocoding() {
        let (resolver, geocoder) = resolver(&[]);
        let center = resolver
            .resolve(&LocationInput::Coordinates(35.1, 129.04))
            .await
            .unwrap();
        assert_eq!(center, Center::new(35.1, 129.04).unwrap());
        assert!(geocoder.queries.lock().unwrap().is_empty());

        let err = resolver
            .resolve(&LocationInput::Coordinates(95.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, TravelRankError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_region_found() {
        let (resolver, _) = resolver(&[("Busan", 35.18, 129.08), ("Seoul", 37.57, 126.98)]);
        let center = resolver
            .resolve(&LocationInput::Region(" Busan ".to_string()))
            .await
            .unwrap();
        assert_eq!(center.lat, 35.18);
    }

    #[tokio::test]
    async fn test_unknown_and_failing_regions_fall_back() {
        let (resolver, geocoder) = resolver(&[("Seoul", 37.57, 126.98)]);
        for region in ["Atlantis", "broken", "   "] {
            let center = resolver
                .resolve(&LocationInput::Region(region.to_string()))
                .await
                .unwrap();
            assert_eq!(center.lat, 37.57);
        }
        let queries = geocoder.queries.lock().unwrap();
        assert_eq!(*queries, ["Atlantis", "Seoul", "broken", "Seoul", "Seoul"]);
    }

    #[tokio::test]
    async fn test_no_fallback_left_is_validation_error() {
        let (resolver, _) = resolver(&[]);
        let err = resolver
            .resolve(&LocationInput::Region("Atlantis".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, TravelRankError::Validation { .. }));

        let err = resolver
            .resolve(&LocationInput::Region("Seoul".to_string()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Location not found"));
    }
}
