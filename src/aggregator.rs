//! Candidate aggregation across category searches
//!
//! One search per category is issued concurrently, each under its own
//! timeout. Results are merged afterwards on a single task so the order is
//! deterministic: category order first, then the provider's order.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::TravelRankError;
use crate::models::{Candidate, Category, Center};
use crate::normalizer::{SourceAdapter, normalize_all};
use crate::search::{PlaceSearch, SearchQuery};

/// What to aggregate around a center point
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRequest {
    pub center: Center,
    /// Searched and merged in this order
    pub categories: Vec<Category>,
    pub radius_meters: u32,
    pub per_category_size: u32,
    /// Checked between categories, never mid-category
    pub global_cap: usize,
}

pub struct CandidateAggregator {
    search: Arc<dyn PlaceSearch>,
    adapter: Arc<dyn SourceAdapter>,
    search_timeout: Duration,
}

impl CandidateAggregator {
    pub fn new(
        search: Arc<dyn PlaceSearch>,
        adapter: Arc<dyn SourceAdapter>,
        search_timeout: Duration,
    ) -> Self {
        Self {
            search,
            adapter,
            search_timeout,
        }
    }

    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    /// Aggregate with each search bounded only by the per-search timeout
    pub async fn aggregate(&self, request: &AggregateRequest) -> Vec<Candidate> {
        let deadline = Instant::now() + self.search_timeout;
        self.aggregate_until(request, deadline).await
    }

    /// Aggregate with every search also bounded by `deadline`.
    ///
    /// A category whose search fails or runs out of time contributes nothing.
    #[instrument(skip_all, fields(center = %request.center.format_coordinates(), categories = request.categories.len()))]
    pub async fn aggregate_until(
        &self,
        request: &AggregateRequest,
        deadline: Instant,
    ) -> Vec<Candidate> {
        let deadline = deadline.min(Instant::now() + self.search_timeout);

        let searches = request.categories.iter().map(|&category| {
            let query = SearchQuery::new(
                request.center,
                category,
                request.radius_meters,
                request.per_category_size,
            );
            async move {
                let outcome = tokio::time::timeout_at(deadline, self.search.search(&query))
                    .await
                    .unwrap_or_else(|_| Err(TravelRankError::transport("category search timed out")));
                match outcome {
                    Ok(records) => {
                        let chunk = normalize_all(self.adapter.as_ref(), &records, category);
                        debug!(
                            category = %category,
                            raw = records.len(),
                            usable = chunk.len(),
                            "Category chunk"
                        );
                        chunk
                    }
                    Err(e) => {
                        warn!(
                            category = %category,
                            provider = self.search.provider_name(),
                            error = %e,
                            "Category search failed, contributing nothing"
                        );
                        Vec::new()
                    }
                }
            }
        });

        let chunks = join_all(searches).await;
        let merged = merge_chunks(chunks, request.global_cap);
        info!(total = merged.len(), "Merged candidates");
        merged
    }
}

/// Merge per-category chunks in order, first occurrence of an id wins.
///
/// Stops before the next chunk once `global_cap` candidates are held, so a
/// chunk is never cut in half.
pub fn merge_chunks<I>(chunks: I, global_cap: usize) -> Vec<Candidate>
where
    I: IntoIterator<Item = Vec<Candidate>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for chunk in chunks {
        if merged.len() >= global_cap {
            break;
        }
        for candidate in chunk {
            if seen.insert(candidate.id.clone()) {
                merged.push(candidate);
            }
        }
    }
    merged
}
