//! AI re-rank adapter
//!
//! Sends the candidate pool to the [`AiScorer`] once and maps its reply back
//! onto the original candidates. Any failure (transport, timeout, unparsable
//! or empty reply) yields the input unchanged with no reasons.

use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::TravelRankError;
use crate::llm::AiScorer;
use crate::models::{Candidate, WeatherBrief};

pub mod prompt;

/// One scored entry of the AI reply
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPick {
    pub id: String,
    /// NaN when the reply carried no usable score
    pub score: f64,
    pub reason: Option<String>,
    pub indoor: Option<bool>,
}

/// Parsed AI reply: `{weather_policy, picked: [{id, score, reason, indoor}]}`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AiRerankReply {
    pub policy: Option<String>,
    pub picked: Vec<RankedPick>,
}

impl AiRerankReply {
    /// Lenient parse of raw completion text.
    ///
    /// Accepts a surrounding Markdown code fence, `weather_policy` or
    /// `policy`, and scores given as numbers or numeric strings. Entries
    /// without an id are skipped.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let value: Value = serde_json::from_str(strip_code_fence(raw))?;
        let obj = value
            .as_object()
            .ok_or_else(|| TravelRankError::malformed("AI reply is not a JSON object"))?;
        let picked = obj
            .get("picked")
            .and_then(Value::as_array)
            .ok_or_else(|| TravelRankError::malformed("AI reply has no 'picked' array"))?;

        let policy = ["weather_policy", "policy"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .map(str::to_string);

        let picked = picked
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|entry| {
                let id = match entry.get("id")? {
                    Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                let score = match entry.get("score") {
                    Some(Value::Number(n)) => n.as_f64(),
                    Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .unwrap_or(f64::NAN);
                Some(RankedPick {
                    id,
                    score,
                    reason: entry
                        .get("reason")
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|r| !r.is_empty())
                        .map(str::to_string),
                    indoor: entry.get("indoor").and_then(Value::as_bool),
                })
            })
            .collect();

        Ok(Self { policy, picked })
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (`json`) on the opening line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Result of one re-rank call
#[derive(Debug, Clone, Default)]
pub struct RerankOutcome {
    /// AI order, or the input unchanged on fallback
    pub places: Vec<Candidate>,
    pub reasons: HashMap<String, String>,
    /// First ids of the AI order, empty on fallback
    pub ai_top_ids: Vec<String>,
    pub policy: Option<String>,
    pub reranked: bool,
}

impl RerankOutcome {
    fn fallback(candidates: &[Candidate]) -> Self {
        Self {
            places: candidates.to_vec(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RerankOptions {
    /// Pick limit stated in the prompt
    pub max_picks: u32,
    /// How many leading AI ids are reported as AI top picks
    pub ai_top_count: usize,
    pub timeout: Duration,
}

impl Default for RerankOptions {
    fn default() -> Self {
        Self {
            max_picks: 5,
            ai_top_count: 3,
            timeout: Duration::from_secs(15),
        }
    }
}

pub struct RerankAdapter {
    scorer: Arc<dyn AiScorer>,
    options: RerankOptions,
}

impl RerankAdapter {
    pub fn new(scorer: Arc<dyn AiScorer>, options: RerankOptions) -> Self {
        Self { scorer, options }
    }

    /// Model behind the scorer, as reported by it
    pub fn model_name(&self) -> &str {
        self.scorer.model_name()
    }

    /// Re-rank bounded by the adapter's own timeout
    pub async fn rerank(
        &self,
        label: &str,
        weather: Option<&WeatherBrief>,
        candidates: &[Candidate],
    ) -> RerankOutcome {
        let deadline = Instant::now() + self.options.timeout;
        self.rerank_until(label, weather, candidates, deadline).await
    }

    /// Re-rank bounded by the earlier of `deadline` and the adapter's timeout
    #[instrument(skip_all, fields(model = self.model_name(), label = %label, candidates = candidates.len()))]
    pub async fn rerank_until(
        &self,
        label: &str,
        weather: Option<&WeatherBrief>,
        candidates: &[Candidate],
        deadline: Instant,
    ) -> RerankOutcome {
        if candidates.is_empty() {
            return RerankOutcome::default();
        }

        let deadline = deadline.min(Instant::now() + self.options.timeout);
        let messages = prompt::build_messages(label, weather, candidates, self.options.max_picks);

        let raw = match tokio::time::timeout_at(deadline, self.scorer.complete(&messages)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(error = %e, "AI re-rank failed, keeping original order");
                return RerankOutcome::fallback(candidates);
            }
            Err(_) => {
                let e = TravelRankError::transport("AI re-rank timed out");
                warn!(error = %e, "AI re-rank failed, keeping original order");
                return RerankOutcome::fallback(candidates);
            }
        };

        let reply = match AiRerankReply::parse(&raw) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Unparsable AI reply, keeping original order");
                return RerankOutcome::fallback(candidates);
            }
        };

        match apply_reply(candidates, &reply, self.options.ai_top_count) {
            Some(outcome) => {
                info!(
                    picked = reply.picked.len(),
                    resolved = outcome.places.len(),
                    "AI re-rank applied"
                );
                outcome
            }
            None => {
                warn!(
                    picked = reply.picked.len(),
                    "AI reply resolved no known candidates, keeping original order"
                );
                RerankOutcome::fallback(candidates)
            }
        }
    }
}

/// Map a parsed reply onto `candidates`; `None` when nothing resolves.
///
/// Picks are ordered by score descending (non-finite last), ties by the
/// candidate's input position. Unknown ids are dropped and a repeated id
/// keeps its best-ranked occurrence.
pub fn apply_reply(
    candidates: &[Candidate],
    reply: &AiRerankReply,
    ai_top_count: usize,
) -> Option<RerankOutcome> {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(candidates.len());
    for (i, c) in candidates.iter().enumerate() {
        position.entry(c.id.as_str()).or_insert(i);
    }

    let mut resolved: Vec<(usize, &RankedPick)> = reply
        .picked
        .iter()
        .filter_map(|pick| match position.get(pick.id.as_str()) {
            Some(&i) => Some((i, pick)),
            None => {
                debug!(id = %pick.id, "Dropping AI pick with unknown id");
                None
            }
        })
        .collect();

    resolved.sort_by(|(ia, a), (ib, b)| compare_scores(a.score, b.score).then(ia.cmp(ib)));

    let mut seen = vec![false; candidates.len()];
    resolved.retain(|(i, _)| !std::mem::replace(&mut seen[*i], true));

    if resolved.is_empty() {
        return None;
    }

    let mut reasons = HashMap::new();
    let places: Vec<Candidate> = resolved
        .iter()
        .map(|(i, pick)| {
            let mut candidate = candidates[*i].clone();
            if pick.score.is_finite() {
                candidate.ai_score = Some(pick.score);
            }
            if let Some(reason) = &pick.reason {
                reasons.insert(candidate.id.clone(), reason.clone());
            }
            candidate
        })
        .collect();

    let ai_top_ids = places
        .iter()
        .take(ai_top_count)
        .map(|c| c.id.clone())
        .collect();

    Some(RerankOutcome {
        places,
        reasons,
        ai_top_ids,
        policy: reply.policy.clone(),
        reranked: true,
    })
}

/// Descending by score, non-finite scores last
fn compare_scores(a: f64, b: f64) -> Ordering {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => b.total_cmp(&a),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}
