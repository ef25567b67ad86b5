//! Input normalization
//!
//! Resolves every optional map of a [`RecommendationInput`] to a concrete (possibly
//! empty) map once, and precomputes the tables every scorer shares: the global
//! task-type frequency, the tried catalogue strategies and the global average
//! score. Downstream scorers never see an `Option` map.

use std::collections::BTreeMap;

use super::catalogue::{CatalogueEntry, CATALOGUE};
use super::types::{CellsByStrategy, CountsByStrategy, RecommendationInput, ScoreVariance};

static NO_COUNTS: BTreeMap<String, u64> = BTreeMap::new();
static NO_NESTED_COUNTS: CountsByStrategy = BTreeMap::new();
static NO_CELLS: CellsByStrategy = BTreeMap::new();
static NO_VARIANCE: BTreeMap<String, ScoreVariance> = BTreeMap::new();

/// Global task-type frequency table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFrequency {
    pub counts: BTreeMap<String, u64>,
    pub total: u64,
}

impl TaskFrequency {
    pub fn get(&self, task_type: &str) -> u64 {
        self.counts.get(task_type).copied().unwrap_or(0)
    }
}

/// Sum of usage counts, saturating at `u64::MAX`
pub(crate) fn saturating_total<'c>(counts: impl IntoIterator<Item = &'c u64>) -> u64 {
    counts.into_iter().fold(0, |total, count| total.saturating_add(*count))
}

/// Flatten per-strategy task-type counts into one global map plus a grand total
pub fn aggregate_task_frequencies(task_types_by_strategy: &CountsByStrategy) -> TaskFrequency {
    let mut frequency = TaskFrequency::default();
    for task_types in task_types_by_strategy.values() {
        for (task_type, count) in task_types {
            let slot = frequency.counts.entry(task_type.clone()).or_insert(0);
            *slot = slot.saturating_add(*count);
            frequency.total = frequency.total.saturating_add(*count);
        }
    }
    frequency
}

/// Immutable, fully-populated view of one engine invocation's input
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    pub distribution: &'a BTreeMap<String, u64>,
    pub task_types: &'a CountsByStrategy,
    pub secondary: &'a BTreeMap<String, u64>,
    pub tags: &'a CountsByStrategy,
    pub score_matrix: &'a CellsByStrategy,
    pub variance: &'a BTreeMap<String, ScoreVariance>,
    pub combos: &'a CellsByStrategy,
    pub total_optimizations: u64,
    pub frequency: TaskFrequency,
    /// Catalogue strategies with at least one primary usage, in catalogue order
    pub tried: Vec<&'static CatalogueEntry>,
    /// Distinct strategies (catalogue or not) with at least one primary usage
    pub tried_primary_count: usize,
    /// Usage-weighted average score over tried strategies that carry a score
    pub global_avg_score: Option<f64>,
    scores: &'a BTreeMap<String, f64>,
}

impl<'a> Snapshot<'a> {
    pub fn from_input(input: &'a RecommendationInput) -> Self {
        let distribution = &input.strategy_distribution;
        let scores = &input.score_by_strategy;

        let tried = CATALOGUE
            .iter()
            .filter(|entry| distribution.get(entry.name).copied().unwrap_or(0) > 0)
            .collect();

        let mut snapshot = Self {
            distribution,
            task_types: &input.task_types_by_strategy,
            secondary: input.secondary_distribution.as_ref().unwrap_or(&NO_COUNTS),
            tags: input.tags_by_strategy.as_ref().unwrap_or(&NO_NESTED_COUNTS),
            score_matrix: input.score_matrix.as_ref().unwrap_or(&NO_CELLS),
            variance: input.score_variance.as_ref().unwrap_or(&NO_VARIANCE),
            combos: input.combo_effectiveness.as_ref().unwrap_or(&NO_CELLS),
            total_optimizations: saturating_total(distribution.values()),
            frequency: aggregate_task_frequencies(&input.task_types_by_strategy),
            tried,
            tried_primary_count: distribution.values().filter(|count| **count > 0).count(),
            global_avg_score: None,
            scores,
        };
        snapshot.global_avg_score = snapshot.weighted_average_score();
        snapshot
    }

    /// A strategy's overall average score, clamped to [0, 1]
    pub fn score(&self, strategy: &str) -> Option<f64> {
        self.scores.get(strategy).filter(|score| score.is_finite()).map(|score| score.clamp(0.0, 1.0))
    }

    /// Primary usage count of a strategy
    pub fn usage(&self, strategy: &str) -> u64 {
        self.distribution.get(strategy).copied().unwrap_or(0)
    }

    /// Secondary usage count of a strategy
    pub fn secondary_usage(&self, strategy: &str) -> u64 {
        self.secondary.get(strategy).copied().unwrap_or(0)
    }

    pub fn is_tried(&self, strategy: &str) -> bool {
        self.usage(strategy) > 0
    }

    /// Catalogue strategies that have never been used as primary
    pub fn untried(&self) -> impl Iterator<Item = &'static CatalogueEntry> + '_ {
        CATALOGUE.iter().filter(move |entry| !self.is_tried(entry.name))
    }

    /// Task types in `best_for` the user actually has history for, most frequent first
    pub fn overlapping_task_types(&self, best_for: &[&str]) -> Vec<(String, u64)> {
        let mut overlap: Vec<(String, u64)> = self
            .frequency
            .counts
            .iter()
            .filter(|(task_type, count)| **count > 0 && best_for.contains(&task_type.as_str()))
            .map(|(task_type, count)| (task_type.clone(), *count))
            .collect();
        overlap.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        overlap
    }

    fn weighted_average_score(&self) -> Option<f64> {
        let mut weighted_sum = 0.0;
        let mut weight = 0.0;
        for (strategy, count) in self.distribution {
            if *count == 0 {
                continue;
            }
            if let Some(score) = self.score(strategy) {
                weighted_sum += score * *count as f64;
                weight += *count as f64;
            }
        }

        if weight > 0.0 {
            Some(weighted_sum / weight)
        } else {
            None
        }
    }
}
