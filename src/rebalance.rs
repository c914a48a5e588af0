//! Category-fair ordering of a candidate pool
//!
//! Allocation runs in fixed phases over the selected categories, always in
//! the caller's order:
//! 1. pin the best `top_picks_per_category` of every category,
//! 2. sweep round-robin until each category holds `min_per_category` body
//!    entries or runs dry,
//! 3. fill by score, skipping an item whose category matches the entry
//!    just placed,
//! 4. top off with whatever was skipped, in score order.
//!
//! `total_cap` bounds phases 3 and 4 only.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::models::{Candidate, Category};
use crate::scoring::sort_by_final_score;

/// Knobs for [`rebalance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebalanceOptions {
    pub min_per_category: usize,
    pub top_picks_per_category: usize,
    pub total_cap: Option<usize>,
}

impl Default for RebalanceOptions {
    fn default() -> Self {
        Self {
            min_per_category: 4,
            top_picks_per_category: 1,
            total_cap: None,
        }
    }
}

/// Pinned picks plus the full ordering, which starts with those picks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rebalanced {
    pub top_picks: Vec<Candidate>,
    pub ordered: Vec<Candidate>,
}

/// Order `candidates` so every selected category is represented.
///
/// Candidates outside `selected` are dropped, duplicate ids keep their first
/// occurrence, and equal scores keep their input order.
#[must_use]
pub fn rebalance(candidates: &[Candidate], selected: &[Category], options: &RebalanceOptions) -> Rebalanced {
    let order = dedup_categories(selected);
    let mut groups = group_by_category(candidates, &order);

    let mut used: HashSet<String> = HashSet::new();
    let mut top_picks = Vec::new();

    for category in &order {
        let Some(queue) = groups.get_mut(category) else {
            continue;
        };
        for _ in 0..options.top_picks_per_category {
            let Some(pick) = queue.pop_front() else {
                break;
            };
            if used.insert(pick.id.clone()) {
                top_picks.push(pick);
            }
        }
    }

    let mut body = Vec::new();
    let mut taken: HashMap<Category, usize> = HashMap::new();
    loop {
        let mut took_any = false;
        for category in &order {
            let count = taken.entry(*category).or_insert(0);
            if *count >= options.min_per_category {
                continue;
            }
            let Some(next) = groups.get_mut(category).and_then(VecDeque::pop_front) else {
                continue;
            };
            took_any = true;
            if used.insert(next.id.clone()) {
                body.push(next);
                *count += 1;
            }
        }
        if !took_any {
            break;
        }
    }

    let mut remaining: Vec<Candidate> = order
        .iter()
        .filter_map(|category| groups.remove(category))
        .flatten()
        .collect();
    sort_by_final_score(&mut remaining);

    let cap_reached = |placed: usize| options.total_cap.is_some_and(|cap| placed >= cap);

    let mut last_category = body.last().or(top_picks.last()).map(|c: &Candidate| c.category);
    for candidate in &remaining {
        if cap_reached(top_picks.len() + body.len()) {
            break;
        }
        if used.contains(&candidate.id) || last_category == Some(candidate.category) {
            continue;
        }
        used.insert(candidate.id.clone());
        last_category = Some(candidate.category);
        body.push(candidate.clone());
    }

    for candidate in remaining {
        if cap_reached(top_picks.len() + body.len()) {
            break;
        }
        if used.insert(candidate.id.clone()) {
            body.push(candidate);
        }
    }

    debug!(
        top_picks = top_picks.len(),
        body = body.len(),
        "Rebalanced candidates across {} categories",
        order.len()
    );

    let mut ordered = top_picks.clone();
    ordered.extend(body);
    Rebalanced { top_picks, ordered }
}

fn dedup_categories(selected: &[Category]) -> Vec<Category> {
    let mut seen = HashSet::new();
    selected.iter().copied().filter(|c| seen.insert(*c)).collect()
}

fn group_by_category(candidates: &[Candidate], order: &[Category]) -> HashMap<Category, VecDeque<Candidate>> {
    let mut seen_ids = HashSet::new();
    let mut grouped: HashMap<Category, Vec<Candidate>> = HashMap::new();

    for candidate in candidates {
        if !order.contains(&candidate.category) || !seen_ids.insert(candidate.id.as_str()) {
            continue;
        }
        grouped
            .entry(candidate.category)
            .or_default()
            .push(candidate.clone());
    }

    grouped
        .into_iter()
        .map(|(category, mut list)| {
            sort_by_final_score(&mut list);
            (category, VecDeque::from(list))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn scored(category: Category, score: f64) -> Candidate {
        let id = format!("{category}#{score}");
        Candidate::new(id.clone(), id, category, 37.5, 127.0).with_ai_score(score)
    }

    fn ids(list: &[Candidate]) -> Vec<String> {
        list.iter().map(|c| c.id.clone()).collect()
    }

    fn options(min: usize, top: usize, cap: Option<usize>) -> RebalanceOptions {
        RebalanceOptions {
            min_per_category: min,
            top_picks_per_category: top,
            total_cap: cap,
        }
    }

    #[test]
    fn test_round_robin_interleaves_categories() {
        let pool = vec![
            scored(Category::Food, 5.0),
            scored(Category::Cafe, 6.0),
            scored(Category::Food, 9.0),
            scored(Category::Cafe, 8.0),
            scored(Category::Food, 7.0),
        ];
        let out = rebalance(&pool, &[Category::Food, Category::Cafe], &options(2, 1, None));

        assert_eq!(ids(&out.top_picks), ["FOOD#9", "CAFE#8"]);
        assert_eq!(
            ids(&out.ordered),
            ["FOOD#9", "CAFE#8", "FOOD#7", "CAFE#6", "FOOD#5"]
        );
    }

    #[test]
    fn test_short_category_is_not_padded() {
        let mut pool = vec![scored(Category::Food, 3.0), scored(Category::Food, 2.0)];
        pool.extend((1..=5).map(|s| scored(Category::Cafe, f64::from(s))));

        let out = rebalance(&pool, &[Category::Food, Category::Cafe], &options(4, 1, None));

        assert_eq!(ids(&out.top_picks), ["FOOD#3", "CAFE#5"]);
        assert_eq!(
            ids(&out.ordered[2..]),
            ["FOOD#2", "CAFE#4", "CAFE#3", "CAFE#2", "CAFE#1"]
        );
        let food = out.ordered.iter().filter(|c| c.category == Category::Food).count();
        assert_eq!(food, 2);
    }

    #[test]
    fn test_fill_avoids_back_to_back_categories() {
        let pool = vec![
            scored(Category::Food, 10.0),
            scored(Category::Food, 9.0),
            scored(Category::Food, 8.0),
            scored(Category::Cafe, 7.0),
        ];
        let out = rebalance(&pool, &[Category::Food, Category::Cafe], &options(0, 0, None));

        assert!(out.top_picks.is_empty());
        assert_eq!(ids(&out.ordered), ["FOOD#10", "CAFE#7", "FOOD#9", "FOOD#8"]);
    }

    #[rstest]
    #[case(Some(2), vec!["FOOD#10", "CAFE#7"])]
    #[case(Some(3), vec!["FOOD#10", "CAFE#7", "FOOD#9"])]
    #[case(Some(0), vec![])]
    fn test_total_cap(#[case] cap: Option<usize>, #[case] expected: Vec<&str>) {
        let pool = vec![
            scored(Category::Food, 10.0),
            scored(Category::Food, 9.0),
            scored(Category::Food, 8.0),
            scored(Category::Cafe, 7.0),
        ];
        let out = rebalance(&pool, &[Category::Food, Category::Cafe], &options(0, 0, cap));
        assert_eq!(ids(&out.ordered), expected);
    }

    #[test]
    fn test_top_off_fills_single_category_to_cap() {
        let pool = vec![
            scored(Category::Food, 3.0),
            scored(Category::Food, 2.0),
            scored(Category::Food, 1.0),
        ];
        let out = rebalance(&pool, &[Category::Food], &options(0, 0, Some(2)));
        assert_eq!(ids(&out.ordered), ["FOOD#3", "FOOD#2"]);
    }

    #[test]
    fn test_unselected_and_duplicate_candidates_are_dropped() {
        let dup = scored(Category::Food, 4.0);
        let mut richer = dup.clone();
        richer.rating = Some(5.0);
        let pool = vec![dup, scored(Category::Stay, 99.0), richer, scored(Category::Food, 1.0)];

        let out = rebalance(&pool, &[Category::Food], &options(4, 1, None));

        assert_eq!(ids(&out.ordered), ["FOOD#4", "FOOD#1"]);
        assert_eq!(out.ordered[0].rating, None);
    }

    #[test]
    fn test_selected_order_drives_top_picks() {
        let pool = vec![scored(Category::Food, 9.0), scored(Category::Cafe, 1.0)];
        let out = rebalance(&pool, &[Category::Cafe, Category::Food, Category::Cafe], &options(4, 1, None));
        assert_eq!(ids(&out.top_picks), ["CAFE#1", "FOOD#9"]);
    }

    #[test]
    fn test_empty_inputs() {
        let out = rebalance(&[], &[Category::Food], &RebalanceOptions::default());
        assert!(out.ordered.is_empty());
        let out = rebalance(&[scored(Category::Food, 1.0)], &[], &RebalanceOptions::default());
        assert!(out.ordered.is_empty());
    }

    /// Deterministic pseudo-random pools checked against the output invariants.
    #[test]
    fn test_invariants_over_generated_pools() {
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = move |bound: u64| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state % bound
        };

        for _ in 0..200 {
            let selected: Vec<Category> = Category::ALL
                .into_iter()
                .filter(|_| next(2) == 0)
                .collect();
            let pool: Vec<Candidate> = (0..next(30))
                .map(|i| {
                    let category = Category::ALL[next(8) as usize];
                    let mut c = Candidate::new(format!("p{}", next(25)), format!("n{i}"), category, 0.0, 0.0);
                    if next(2) == 0 {
                        c.distance_meters = Some(next(5_000) as u32);
                    }
                    if next(2) == 0 {
                        c.rating = Some(next(50) as f64 / 10.0);
                    }
                    c
                })
                .collect();
            let opts = options(next(5) as usize, next(3) as usize, (next(2) == 0).then(|| next(20) as usize));

            let out = rebalance(&pool, &selected, &opts);

            assert!(out.top_picks.len() <= opts.top_picks_per_category * selected.len());
            assert_eq!(out.ordered[..out.top_picks.len()], out.top_picks[..]);

            let unique: HashSet<_> = out.ordered.iter().map(|c| c.id.as_str()).collect();
            assert_eq!(unique.len(), out.ordered.len());

            for c in &out.ordered {
                assert!(selected.contains(&c.category));
                let first = pool
                    .iter()
                    .find(|p| p.id == c.id && selected.contains(&p.category))
                    .unwrap();
                assert_eq!(first, c);
            }
        }
    }
}
