//! Data models for the TravelRank pipeline
//!
//! This module contains the core domain models organized by concern:
//! - Category: the closed set of place kinds and their provider codes
//! - Candidate: the canonical place record
//! - Location: the search center
//! - Weather: the snapshot fed to the AI scorer
//! - Recommendation: the final ordered result

pub mod candidate;
pub mod category;
pub mod location;
pub mod recommendation;
pub mod weather;

// Re-export all public types for convenient access
pub use candidate::Candidate;
pub use category::Category;
pub use location::Center;
pub use recommendation::{PipelineMode, RecommendationResult};
pub use weather::{CurrentWeather, WeatherBrief};
