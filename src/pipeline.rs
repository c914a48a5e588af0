//! Recommendation pipeline
//!
//! aggregate (with weather alongside) → AI re-rank → raw or rebalanced order.
//! Every collaborator failure is absorbed; `recommend` always returns a result.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::aggregator::{AggregateRequest, CandidateAggregator};
use crate::config::{RankingConfig, TravelRankConfig};
use crate::llm::{AiScorer, OpenAiChatClient};
use crate::models::{Candidate, Category, Center, PipelineMode, RecommendationResult, WeatherBrief};
use crate::normalizer::{AliasAdapter, SourceAdapter};
use crate::rebalance::{RebalanceOptions, rebalance};
use crate::rerank::{RerankAdapter, RerankOptions, RerankOutcome};
use crate::search::PlaceSearch;
use crate::weather::{OpenWeatherClient, WeatherLookup};

pub const MAX_RADIUS_METERS: u32 = 20_000;
pub const MAX_PAGE_SIZE: u32 = 15;

/// One user request
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub center: Center,
    /// Empty means food only
    pub categories: Vec<Category>,
    pub radius_meters: u32,
    pub per_category_size: u32,
    pub global_cap: usize,
    pub total_cap: Option<usize>,
    pub mode: PipelineMode,
    pub use_ai: bool,
}

impl RecommendationRequest {
    /// Request using the configured ranking defaults
    #[must_use]
    pub fn new(center: Center, categories: Vec<Category>, ranking: &RankingConfig) -> Self {
        Self {
            center,
            categories,
            radius_meters: ranking.radius_meters,
            per_category_size: ranking.per_category_size,
            global_cap: ranking.global_cap,
            total_cap: ranking.total_cap,
            mode: ranking.mode,
            use_ai: true,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: PipelineMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn without_ai(mut self) -> Self {
        self.use_ai = false;
        self
    }

    /// Categories deduplicated in caller order, food when none given
    #[must_use]
    pub fn effective_categories(&self) -> Vec<Category> {
        let mut seen = HashSet::new();
        let categories: Vec<Category> = self
            .categories
            .iter()
            .copied()
            .filter(|c| seen.insert(*c))
            .collect();
        if categories.is_empty() {
            vec![Category::Food]
        } else {
            categories
        }
    }

    #[must_use]
    pub fn effective_radius(&self) -> u32 {
        self.radius_meters.clamp(1, MAX_RADIUS_METERS)
    }

    #[must_use]
    pub fn effective_page_size(&self) -> u32 {
        self.per_category_size.clamp(1, MAX_PAGE_SIZE)
    }
}

pub struct RecommendationPipeline {
    aggregator: CandidateAggregator,
    weather: Option<Arc<dyn WeatherLookup>>,
    reranker: Option<RerankAdapter>,
    ranking: RankingConfig,
}

impl RecommendationPipeline {
    /// Pipeline over `search` with Kakao-shaped records, no weather and no AI
    pub fn new(search: Arc<dyn PlaceSearch>, ranking: RankingConfig) -> Self {
        let aggregator = CandidateAggregator::new(
            search,
            Arc::new(AliasAdapter::kakao()),
            Duration::from_secs(ranking.search_timeout_seconds.into()),
        );
        Self {
            aggregator,
            weather: None,
            reranker: None,
            ranking,
        }
    }

    /// Build the production pipeline. Only the search key is mandatory;
    /// weather and AI are skipped when their keys are missing.
    /// Build the pipeline around `search`, adding weather and AI clients
    /// when their keys are configured
    pub fn from_config(
        config: &TravelRankConfig,
        search: Arc<dyn PlaceSearch>,
    ) -> crate::Result<Self> {
        let mut pipeline = Self::new(search, config.ranking.clone());

        if config.weather.api_key.is_some() {
            pipeline = pipeline.with_weather(Arc::new(OpenWeatherClient::new(&config.weather)?));
        } else {
            warn!("No weather API key configured, recommendations will ignore the weather");
        }

        if config.ai.api_key.is_some() {
            let options = RerankOptions {
                max_picks: config.ai.max_picks,
                ai_top_count: config.ranking.ai_top_count,
                timeout: Duration::from_secs(config.ai.timeout_seconds.into()),
            };
            pipeline = pipeline.with_scorer(Arc::new(OpenAiChatClient::new(&config.ai)?), options);
        } else {
            warn!("No AI API key configured, AI re-ranking is disabled");
        }

        Ok(pipeline)
    }

    #[must_use]
    pub fn with_weather(mut self, weather: Arc<dyn WeatherLookup>) -> Self {
        self.weather = Some(weather);
        self
    }

    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn AiScorer>, options: RerankOptions) -> Self {
        self.reranker = Some(RerankAdapter::new(scorer, options));
        self
    }

    /// Replace the record adapter used by the aggregator
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.aggregator = self.aggregator.with_adapter(adapter);
        self
    }

    #[must_use]
    pub fn ranking(&self) -> &RankingConfig {
        &self.ranking
    }

    #[instrument(skip_all, fields(center = %request.center.format_coordinates(), mode = %request.mode))]
    pub async fn recommend(&self, request: &RecommendationRequest) -> RecommendationResult {
        let categories = request.effective_categories();
        let deadline =
            Instant::now() + Duration::from_secs(self.ranking.request_timeout_seconds.into());
        info!(?categories, use_ai = request.use_ai, "Recommendation started");

        let aggregate = AggregateRequest {
            center: request.center,
            categories: categories.clone(),
            radius_meters: request.effective_radius(),
            per_category_size: request.effective_page_size(),
            global_cap: request.global_cap,
        };

        let (pool, weather) = tokio::join!(
            self.aggregator.aggregate_until(&aggregate, deadline),
            self.current_weather(request.center, deadline)
        );

        if pool.is_empty() {
            info!("No candidates found");
            return RecommendationResult::empty(request.mode, weather);
        }

        let outcome = match (&self.reranker, request.use_ai) {
            (Some(reranker), true) => {
                let label = categories
                    .iter()
                    .map(|c| c.label())
                    .collect::<Vec<_>>()
                    .join(", ");
                reranker
                    .rerank_until(&label, weather.as_ref(), &pool, deadline)
                    .await
            }
            _ => RerankOutcome {
                places: pool.clone(),
                ..RerankOutcome::default()
            },
        };

        let options = RebalanceOptions {
            min_per_category: self.ranking.min_per_category,
            top_picks_per_category: self.ranking.top_picks_per_category,
            total_cap: request.total_cap,
        };
        let result = assemble(request.mode, &categories, &pool, outcome, weather, &options);
        info!(
            places = result.places.len(),
            top_picks = result.top_picks.len(),
            reranked = result.reranked,
            "Recommendation finished"
        );
        result
    }

    async fn current_weather(&self, center: Center, deadline: Instant) -> Option<WeatherBrief> {
        let lookup = self.weather.as_ref()?;
        match tokio::time::timeout_at(deadline, lookup.current(center.lat, center.lng)).await {
            Ok(Ok(current)) => current.map(WeatherBrief::from),
            Ok(Err(e)) => {
                warn!(error = %e, "Weather lookup failed, continuing without weather");
                None
            }
            Err(_) => {
                warn!("Weather lookup timed out, continuing without weather");
                None
            }
        }
    }
}

/// Turn the re-rank outcome into the final result for `mode`.
///
/// Rebalanced mode ranks the AI order followed by whatever the AI left out,
/// so category minimums can still be met.
pub fn assemble(
    mode: PipelineMode,
    categories: &[Category],
    pool: &[Candidate],
    outcome: RerankOutcome,
    weather: Option<WeatherBrief>,
    options: &RebalanceOptions,
) -> RecommendationResult {
    let RerankOutcome {
        places: ai_order,
        mut reasons,
        ai_top_ids,
        reranked,
        ..
    } = outcome;

    let (places, top_picks) = match mode {
        PipelineMode::Raw => {
            let mut picked = HashSet::new();
            let top_picks = ai_order
                .iter()
                .filter(|c| categories.contains(&c.category) && picked.insert(c.category))
                .cloned()
                .collect();
            (ai_order, top_picks)
        }
        PipelineMode::Rebalanced => {
            let in_ai_order: HashSet<&str> = ai_order.iter().map(|c| c.id.as_str()).collect();
            let omitted = pool
                .iter()
                .filter(|c| !in_ai_order.contains(c.id.as_str()))
                .cloned();
            let union: Vec<Candidate> = ai_order.iter().cloned().chain(omitted).collect();
            let balanced = rebalance(&union, categories, options);
            (balanced.ordered, balanced.top_picks)
        }
    };

    let present: HashSet<&str> = places.iter().map(|c| c.id.as_str()).collect();
    reasons.retain(|id, _| present.contains(id.as_str()));
    let ai_top_ids = ai_top_ids
        .into_iter()
        .filter(|id| present.contains(id.as_str()))
        .collect();

    RecommendationResult {
        places,
        weather,
        reasons,
        top_picks,
        ai_top_ids,
        mode,
        reranked,
        generated_at: Utc::now(),
    }
}
