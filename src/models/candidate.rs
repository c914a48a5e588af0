//! Canonical place record shared by every pipeline stage

use serde::{Deserialize, Serialize};

use super::Category;

/// A normalized place eligible for ranking.
///
/// `id` is the only identity key: two candidates with the same id are the
/// same place, whatever their other fields say.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub lat: f64,
    pub lng: f64,
    /// Meters from the query center
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Only set once the AI scorer has picked this place
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_score: Option<f64>,
}

impl Candidate {
    /// Minimal candidate with every optional field absent
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: Category, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            lat,
            lng,
            distance_meters: None,
            rating: None,
            address: None,
            ai_score: None,
        }
    }

    #[must_use]
    pub fn with_distance(mut self, meters: u32) -> Self {
        self.distance_meters = Some(meters);
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_ai_score(mut self, score: f64) -> Self {
        self.ai_score = Some(score);
        self
    }
}
