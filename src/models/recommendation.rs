//! Final recommendation handed to the presentation layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use super::{Candidate, WeatherBrief};
use crate::TravelRankError;

/// How the final ordering is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// AI order returned as-is. No category minimums are enforced; top picks
    /// are the first candidate of each selected category in that order.
    Raw,
    /// Category-fair allocation with pinned top picks
    #[default]
    Rebalanced,
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineMode::Raw => f.write_str("raw"),
            PipelineMode::Rebalanced => f.write_str("rebalanced"),
        }
    }
}

impl FromStr for PipelineMode {
    type Err = TravelRankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(PipelineMode::Raw),
            "rebalanced" => Ok(PipelineMode::Rebalanced),
            other => Err(TravelRankError::validation(format!(
                "Unknown pipeline mode '{other}'. Must be one of: raw, rebalanced"
            ))),
        }
    }
}

/// Ordered places plus everything the UI needs to explain them.
///
/// Every id in `top_picks`, `reasons` and `ai_top_ids` also appears in
/// `places`, and `places` holds no duplicate ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub places: Vec<Candidate>,
    pub weather: Option<WeatherBrief>,
    pub reasons: HashMap<String, String>,
    pub top_picks: Vec<Candidate>,
    pub ai_top_ids: HashSet<String>,
    pub mode: PipelineMode,
    /// False when the AI step was skipped or fell back to the input order
    pub reranked: bool,
    pub generated_at: DateTime<Utc>,
}

impl RecommendationResult {
    /// Result with no places, used when nothing could be searched
    #[must_use]
    pub fn empty(mode: PipelineMode, weather: Option<WeatherBrief>) -> Self {
        Self {
            weather,
            mode,
            generated_at: Utc::now(),
            ..Self::default()
        }
    }

    /// Whether `id` is pinned as a top pick
    #[must_use]
    pub fn is_top_pick(&self, id: &str) -> bool {
        self.top_picks.iter().any(|p| p.id == id)
    }
}
