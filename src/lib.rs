//! `TravelRank` - weather-aware nearby place recommendations
//!
//! This library aggregates place candidates per category, lets an AI scorer
//! re-rank them against the current weather, and produces a category-fair
//! final ordering with pinned top picks.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod llm;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod rebalance;
pub mod rerank;
pub mod scoring;
pub mod search;
pub mod weather;

// Re-export core types for public API
pub use aggregator::{AggregateRequest, CandidateAggregator};
pub use config::TravelRankConfig;
pub use error::TravelRankError;
pub use location_resolver::{CenterResolver, LocationInput};
pub use models::{Candidate, Category, Center, PipelineMode, RecommendationResult, WeatherBrief};
pub use normalizer::{AliasAdapter, SourceAdapter, Unusable};
pub use pipeline::{RecommendationPipeline, RecommendationRequest};
pub use rebalance::{RebalanceOptions, Rebalanced, rebalance};
pub use rerank::{RerankAdapter, RerankOptions, RerankOutcome};
pub use scoring::final_score;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TravelRankError>;
