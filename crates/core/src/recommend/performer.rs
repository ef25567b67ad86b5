//! Best-performing tried strategy, independent of the recommendation ranking

use std::cmp::Ordering;

use super::catalogue::find_entry;
use super::types::{RecommendationInput, TopPerformer};

/// Usage count from which a top performer is considered significant
pub const SIGNIFICANT_COUNT: u64 = 5;

/// Pick the highest-scoring tried strategy with at least `min_count` usages.
///
/// Ties prefer the more consistent strategy (lower score stddev, unknown spread
/// last), then the more used one, then the alphabetically first.
pub fn select_top_performer(input: &RecommendationInput, min_count: u64) -> Option<TopPerformer> {
    let variance = input.score_variance.as_ref();

    let winner = input
        .strategy_distribution
        .iter()
        .filter(|(_, count)| **count >= min_count && **count > 0)
        .filter_map(|(name, count)| {
            let score = input.score_by_strategy.get(name).copied().filter(|s| s.is_finite())?;
            let stddev = variance
                .and_then(|spreads| spreads.get(name))
                .map(|spread| spread.stddev)
                .filter(|stddev| stddev.is_finite());
            Some(Candidate { name, score, count: *count, stddev })
        })
        .min_by(Candidate::ranking)?;

    tracing::debug!(
        event_name = "top_performer.selected",
        strategy = winner.name.as_str(),
        score = winner.score,
        count = winner.count
    );

    let label = find_entry(winner.name).map_or_else(|| winner.name.clone(), |e| e.label.to_string());
    Some(TopPerformer {
        name: winner.name.clone(),
        label,
        score: winner.score,
        count: winner.count,
        stddev: winner.stddev,
        is_significant: winner.count >= SIGNIFICANT_COUNT,
    })
}

struct Candidate<'a> {
    name: &'a String,
    score: f64,
    count: u64,
    stddev: Option<f64>,
}

impl Candidate<'_> {
    /// Best candidate orders first
    fn ranking(a: &Self, b: &Self) -> Ordering {
        let a_spread = a.stddev.unwrap_or(f64::INFINITY);
        let b_spread = b.stddev.unwrap_or(f64::INFINITY);

        b.score
            .total_cmp(&a.score)
            .then_with(|| a_spread.total_cmp(&b_spread))
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| a.name.cmp(b.name))
    }
}
