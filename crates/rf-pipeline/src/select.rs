//! Candidate selection strategies.

use std::cmp::Ordering;

use rf_core::{RatedCandidate, SelectionStrategy};

/// Pick one candidate according to `strategy`.
///
/// Ties keep the earliest candidate in input order, so a list already sorted
/// by rating yields its first entry under `highest_rated`.
pub fn select(strategy: SelectionStrategy, candidates: &[RatedCandidate]) -> Option<&RatedCandidate> {
    match strategy {
        SelectionStrategy::HighestRated => first_max_by_key(candidates, |c| c.rating),
        SelectionStrategy::MostPopular => {
            first_max_by_key(candidates, |c| c.item.popularity_score as f64)
        }
        SelectionStrategy::BestEngagement => first_max_by_key(candidates, RatedCandidate::engagement),
    }
}

// `Iterator::max_by` returns the last of equal elements; this keeps the first.
fn first_max_by_key<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<&T> {
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let k = key(item);
        match best {
            Some((_, b)) if k.partial_cmp(&b) != Some(Ordering::Greater) => {}
            _ => best = Some((item, k)),
        }
    }
    best.map(|(item, _)| item)
}
