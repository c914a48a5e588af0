//! Place search collaborators
//!
//! The pipeline only depends on the [`PlaceSearch`] and [`Geocoder`] traits;
//! [`kakao::KakaoLocalClient`] is the production implementation.

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{Category, Center};

pub mod kakao;

pub use kakao::KakaoLocalClient;

/// One category search around a center point
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub center: Center,
    pub category: Category,
    /// Provider codes to search, usually `category.search_codes()`
    pub codes: Vec<String>,
    pub radius_meters: u32,
    pub page_size: u32,
}

impl SearchQuery {
    #[must_use]
    pub fn new(center: Center, category: Category, radius_meters: u32, page_size: u32) -> Self {
        Self {
            center,
            category,
            codes: category.search_codes().iter().map(|c| (*c).to_string()).collect(),
            radius_meters,
            page_size,
        }
    }
}

/// Geo search returning raw, source-shaped records
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Records come back roughly distance sorted; may fail per call.
    async fn search(&self, query: &SearchQuery) -> crate::Result<Vec<Value>>;

    fn provider_name(&self) -> &str;
}

/// Free text region to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> crate::Result<Option<Center>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_uses_category_codes() {
        let center = Center::new(37.5, 127.0).unwrap();
        let query = SearchQuery::new(center, Category::Experience, 3000, 15);
        assert_eq!(query.codes, ["AT4", "AC5"]);
        assert_eq!(query.radius_meters, 3000);
    }
}
