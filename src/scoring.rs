//! Final score used to order candidates
//!
//! `final_score = ai_score + rating * 0.1 + 1_000_000 / (distance + 50)`,
//! each term contributing zero when its input is absent.

use crate::models::Candidate;

const RATING_WEIGHT: f64 = 0.1;
const DISTANCE_NUMERATOR: f64 = 1_000_000.0;
const DISTANCE_OFFSET: f64 = 50.0;

/// Decaying bonus for nearby places; zero when the distance is unknown
#[must_use]
pub fn distance_bonus(distance_meters: Option<u32>) -> f64 {
    distance_meters.map_or(0.0, |d| DISTANCE_NUMERATOR / (f64::from(d) + DISTANCE_OFFSET))
}

/// Combined comparable ranking value for a candidate
#[must_use]
pub fn final_score(candidate: &Candidate) -> f64 {
    candidate.ai_score.unwrap_or(0.0)
        + candidate.rating.unwrap_or(0.0) * RATING_WEIGHT
        + distance_bonus(candidate.distance_meters)
}

/// Sort descending by [`final_score`], keeping input order for equal scores
pub fn sort_by_final_score(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| final_score(b).total_cmp(&final_score(a)));
}
