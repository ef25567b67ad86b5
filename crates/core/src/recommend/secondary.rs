//! Secondary-usage signals
//!
//! Blends five sub-signals derived from secondary (auxiliary) framework usage and
//! user tags into one composite, with an additive bonus when the strategy has
//! paid off as a secondary in recorded pairings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::catalogue::CatalogueEntry;
use super::snapshot::Snapshot;
use super::types::{CellsByStrategy, CountsByStrategy};
use crate::errors::DomainError;

/// Flat bonus applied to the normalized combo-effectiveness score
pub const COMBO_BONUS_WEIGHT: f64 = 0.10;

/// Blend weights for the secondary sub-signals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecondaryProcessorWeights {
    /// Weight for secondary frequency (default: 0.20)
    pub frequency: f64,
    /// Weight for cross-strategy reach (default: 0.15)
    pub reach: f64,
    /// Weight for familiarity/tag synergy (default: 0.25)
    pub synergy: f64,
    /// Weight for secondary familiarity (default: 0.25)
    pub familiarity: f64,
    /// Weight for tag affinity (default: 0.15)
    pub tag_affinity: f64,
}

impl Default for SecondaryProcessorWeights {
    fn default() -> Self {
        super::DEFAULT_SECONDARY_WEIGHTS
    }
}

impl SecondaryProcessorWeights {
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("frequency", self.frequency),
            ("reach", self.reach),
            ("synergy", self.synergy),
            ("familiarity", self.familiarity),
            ("tag_affinity", self.tag_affinity),
        ];
        super::check_weights("secondary", &fields)
    }
}

/// Secondary sub-signals for one strategy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecondarySignals {
    pub secondary_count: u64,
    pub familiarity: f64,
    pub tag_affinity: f64,
    pub frequency: f64,
    pub reach: f64,
    pub synergy: f64,
    pub combo: f64,
    pub composite: f64,
    /// Lower-cased user tags that matched the strategy's task types
    pub matched_tags: Vec<String>,
}

/// Scores strategies against the secondary-usage tables of one snapshot
#[derive(Debug, Clone)]
pub struct SecondaryProcessor<'s, 'a> {
    snapshot: &'s Snapshot<'a>,
    weights: SecondaryProcessorWeights,
    max_secondary: u64,
    tag_frequency: BTreeMap<String, u64>,
    tag_total: u64,
}

impl<'s, 'a> SecondaryProcessor<'s, 'a> {
    pub fn new(snapshot: &'s Snapshot<'a>, weights: SecondaryProcessorWeights) -> Self {
        let (tag_frequency, tag_total) = flatten_tags(snapshot.tags);
        Self {
            snapshot,
            weights,
            max_secondary: snapshot.secondary.values().copied().max().unwrap_or(0),
            tag_frequency,
            tag_total,
        }
    }

    pub fn score(&self, entry: &CatalogueEntry) -> SecondarySignals {
        let secondary_count = self.snapshot.secondary_usage(entry.name);
        let familiarity = familiarity_score(secondary_count, self.max_secondary);
        let (tag_affinity, matched_tags) =
            tag_affinity_score(entry.best_for, &self.tag_frequency, self.tag_total);
        let frequency = frequency_score(secondary_count, self.snapshot.total_optimizations);
        let reach = reach_score(secondary_count, self.snapshot.tried_primary_count);
        let synergy = synergy_score(familiarity, tag_affinity);
        let combo = combo_score(entry.name, self.snapshot.combos, self.snapshot.global_avg_score);

        let w = &self.weights;
        let blended = w.frequency * frequency
            + w.reach * reach
            + w.synergy * synergy
            + w.familiarity * familiarity
            + w.tag_affinity * tag_affinity
            + combo * COMBO_BONUS_WEIGHT;

        SecondarySignals {
            secondary_count,
            familiarity,
            tag_affinity,
            frequency,
            reach,
            synergy,
            combo,
            composite: blended.clamp(0.0, 1.0),
            matched_tags,
        }
    }
}

/// Case-insensitive global tag frequency and its total
fn flatten_tags(tags_by_strategy: &CountsByStrategy) -> (BTreeMap<String, u64>, u64) {
    let mut frequency = BTreeMap::new();
    let mut total: u64 = 0;
    for tags in tags_by_strategy.values() {
        for (tag, count) in tags {
            let slot = frequency.entry(tag.trim().to_lowercase()).or_insert(0u64);
            *slot = slot.saturating_add(*count);
            total = total.saturating_add(*count);
        }
    }
    (frequency, total)
}

/// Secondary usage relative to the most-used secondary strategy
pub fn familiarity_score(secondary_count: u64, max_secondary: u64) -> f64 {
    if secondary_count == 0 || max_secondary == 0 {
        return 0.0;
    }
    (secondary_count as f64 / max_secondary as f64).clamp(0.0, 1.0)
}

/// Share of all tag usage whose tag names one of `best_for`'s task types
pub fn tag_affinity_score(
    best_for: &[&str],
    tag_frequency: &BTreeMap<String, u64>,
    tag_total: u64,
) -> (f64, Vec<String>) {
    if tag_total == 0 || best_for.is_empty() {
        return (0.0, Vec::new());
    }

    let targets: Vec<String> = best_for.iter().map(|task_type| task_type.to_lowercase()).collect();
    let mut matched = Vec::new();
    let mut match_sum: u64 = 0;
    for (tag, count) in tag_frequency {
        if *count > 0 && targets.contains(tag) {
            match_sum = match_sum.saturating_add(*count);
            matched.push(tag.clone());
        }
    }

    ((match_sum as f64 / tag_total as f64).clamp(0.0, 1.0), matched)
}

/// Secondary usage as a share of all primary optimizations, capped at 1
pub fn frequency_score(secondary_count: u64, total_optimizations: u64) -> f64 {
    if total_optimizations == 0 {
        return 0.0;
    }
    (secondary_count as f64 / total_optimizations as f64).min(1.0)
}

/// Saturating versatility proxy against the number of tried primary strategies
pub fn reach_score(secondary_count: u64, tried_primary_count: usize) -> f64 {
    let cap = tried_primary_count.max(1) as u64;
    secondary_count.min(cap) as f64 / cap as f64
}

/// Geometric mean of familiarity and tag affinity; zero unless both are positive
pub fn synergy_score(familiarity: f64, tag_affinity: f64) -> f64 {
    if familiarity <= 0.0 || tag_affinity <= 0.0 {
        return 0.0;
    }
    (familiarity * tag_affinity).sqrt().clamp(0.0, 1.0)
}

/// Count-weighted average score of `strategy` as a secondary across every primary
/// it was paired with, normalized against the global average
pub fn combo_score(
    strategy: &str,
    combos: &CellsByStrategy,
    global_avg_score: Option<f64>,
) -> f64 {
    let global = match global_avg_score {
        Some(global) if global > 0.0 => global,
        _ => return 0.0,
    };

    let mut weighted_sum = 0.0;
    let mut weight = 0.0;
    for pairings in combos.values() {
        if let Some(cell) = pairings.get(strategy) {
            if let Some(score) = cell.usable_score() {
                weighted_sum += score.clamp(0.0, 1.0) * cell.count as f64;
                weight += cell.count as f64;
            }
        }
    }

    if weight <= 0.0 {
        return 0.0;
    }
    (weighted_sum / weight / global).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::catalogue::find_entry;
    use crate::recommend::types::{RecommendationInput, ScoreCell};

    fn counts(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|(key, value)| (key.to_string(), *value)).collect()
    }

    #[test]
    fn default_weights_match_documented_blend() {
        let w = SecondaryProcessorWeights::default();
        assert_eq!(w.frequency, 0.20);
        assert_eq!(w.reach, 0.15);
        assert_eq!(w.synergy, 0.25);
        assert_eq!(w.familiarity, 0.25);
        assert_eq!(w.tag_affinity, 0.15);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn negative_weight_is_rejected() {
        let w = SecondaryProcessorWeights { reach: -0.1, ..SecondaryProcessorWeights::default() };
        let error = w.validate().unwrap_err();
        assert!(error.to_string().contains("secondary.reach"));
    }

    #[test]
    fn familiarity_is_relative_to_the_busiest_secondary() {
        assert_eq!(familiarity_score(0, 10), 0.0);
        assert_eq!(familiarity_score(3, 0), 0.0);
        assert_eq!(familiarity_score(5, 10), 0.5);
        assert_eq!(familiarity_score(10, 10), 1.0);
    }

    #[test]
    fn tag_affinity_is_case_insensitive() {
        let mut tags = CountsByStrategy::new();
        tags.insert("co-star".to_string(), counts(&[("Coding", 3), ("urgent", 5)]));
        tags.insert("risen".to_string(), counts(&[("coding", 1), ("MATH", 1)]));
        let (frequency, total) = flatten_tags(&tags);
        assert_eq!(total, 10);
        assert_eq!(frequency.get("coding"), Some(&4));

        let (score, matched) = tag_affinity_score(&["coding", "math"], &frequency, total);
        assert!((score - 0.5).abs() < 1e-12);
        assert_eq!(matched, vec!["coding".to_string(), "math".to_string()]);

        assert_eq!(tag_affinity_score(&["legal"], &frequency, total).0, 0.0);
        assert_eq!(tag_affinity_score(&["coding"], &BTreeMap::new(), 0).0, 0.0);
    }

    #[test]
    fn frequency_and_reach_saturate() {
        assert_eq!(frequency_score(4, 0), 0.0);
        assert_eq!(frequency_score(4, 8), 0.5);
        assert_eq!(frequency_score(20, 8), 1.0);

        assert_eq!(reach_score(0, 3), 0.0);
        assert!((reach_score(2, 3) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(reach_score(7, 3), 1.0);
        assert_eq!(reach_score(1, 0), 1.0);
    }

    #[test]
    fn synergy_needs_both_signals() {
        assert_eq!(synergy_score(0.0, 0.8), 0.0);
        assert_eq!(synergy_score(0.8, 0.0), 0.0);
        assert!((synergy_score(0.25, 0.64) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn combo_score_normalizes_against_global_average() {
        let mut combos = CellsByStrategy::new();
        let mut paired = BTreeMap::new();
        paired.insert("risen".to_string(), ScoreCell { count: 3, avg_score: Some(0.3) });
        combos.insert("co-star".to_string(), paired);
        let mut paired = BTreeMap::new();
        paired.insert("risen".to_string(), ScoreCell { count: 1, avg_score: Some(0.7) });
        paired.insert("step-by-step".to_string(), ScoreCell { count: 2, avg_score: None });
        combos.insert("chain-of-thought".to_string(), paired);

        // (0.3 * 3 + 0.7 * 1) / 4 = 0.4, against a 0.8 global average
        assert!((combo_score("risen", &combos, Some(0.8)) - 0.5).abs() < 1e-12);
        assert_eq!(combo_score("risen", &combos, Some(0.2)), 1.0);
        assert_eq!(combo_score("risen", &combos, None), 0.0);
        assert_eq!(combo_score("step-by-step", &combos, Some(0.8)), 0.0);
        assert_eq!(combo_score("persona-assignment", &combos, Some(0.8)), 0.0);
    }

    #[test]
    fn composite_is_zero_without_secondary_data() {
        let input = RecommendationInput {
            strategy_distribution: counts(&[("co-star", 5)]),
            ..RecommendationInput::default()
        };
        let snapshot = Snapshot::from_input(&input);
        let processor = SecondaryProcessor::new(&snapshot, SecondaryProcessorWeights::default());
        let signals = processor.score(find_entry("risen").unwrap());
        assert_eq!(signals.composite, 0.0);
        assert_eq!(signals.synergy, 0.0);
    }

    #[test]
    fn composite_blends_every_sub_signal() {
        let mut tags = CountsByStrategy::new();
        tags.insert("co-star".to_string(), counts(&[("research", 2), ("writing", 2)]));
        let input = RecommendationInput {
            strategy_distribution: counts(&[("co-star", 4), ("step-by-step", 4)]),
            secondary_distribution: Some(counts(&[("risen", 2), ("persona-assignment", 4)])),
            tags_by_strategy: Some(tags),
            ..RecommendationInput::default()
        };
        let snapshot = Snapshot::from_input(&input);
        let processor = SecondaryProcessor::new(&snapshot, SecondaryProcessorWeights::default());
        let signals = processor.score(find_entry("risen").unwrap());

        assert_eq!(signals.secondary_count, 2);
        assert_eq!(signals.familiarity, 0.5);
        assert_eq!(signals.tag_affinity, 0.5);
        assert_eq!(signals.frequency, 0.25);
        assert_eq!(signals.reach, 1.0);
        assert!((signals.synergy - 0.5).abs() < 1e-12);
        assert_eq!(signals.matched_tags, vec!["research".to_string()]);

        let expected = 0.20 * 0.25 + 0.15 * 1.0 + 0.25 * 0.5 + 0.25 * 0.5 + 0.15 * 0.5;
        assert!((signals.composite - expected).abs() < 1e-12);
    }

    #[test]
    fn composite_is_positive_with_familiarity_alone() {
        let input = RecommendationInput {
            strategy_distribution: counts(&[("co-star", 4)]),
            secondary_distribution: Some(counts(&[("risen", 3)])),
            ..RecommendationInput::default()
        };
        let snapshot = Snapshot::from_input(&input);
        let processor = SecondaryProcessor::new(&snapshot, SecondaryProcessorWeights::default());
        let signals = processor.score(find_entry("risen").unwrap());

        assert_eq!(signals.familiarity, 1.0);
        assert_eq!(signals.tag_affinity, 0.0);
        assert_eq!(signals.synergy, 0.0);
        assert!(signals.composite > 0.0);
    }

    #[test]
    fn composite_is_positive_with_tag_affinity_alone() {
        let mut tags = CountsByStrategy::new();
        tags.insert("co-star".to_string(), counts(&[("research", 3), ("writing", 1)]));
        let input = RecommendationInput {
            strategy_distribution: counts(&[("co-star", 4)]),
            tags_by_strategy: Some(tags),
            ..RecommendationInput::default()
        };
        let snapshot = Snapshot::from_input(&input);
        let processor = SecondaryProcessor::new(&snapshot, SecondaryProcessorWeights::default());
        let signals = processor.score(find_entry("risen").unwrap());

        assert_eq!(signals.secondary_count, 0);
        assert_eq!(signals.familiarity, 0.0);
        assert_eq!(signals.tag_affinity, 0.75);
        assert!((signals.composite - 0.15 * 0.75).abs() < 1e-12);
    }

    #[test]
    fn tag_totals_saturate_instead_of_overflowing() {
        let mut tags = CountsByStrategy::new();
        tags.insert("co-star".to_string(), counts(&[("research", u64::MAX)]));
        tags.insert("risen".to_string(), counts(&[("Research", 2), ("urgent", 1)]));
        let (frequency, total) = flatten_tags(&tags);
        assert_eq!(total, u64::MAX);
        assert_eq!(frequency.get("research"), Some(&u64::MAX));

        let (score, matched) = tag_affinity_score(&["research", "urgent"], &frequency, total);
        assert_eq!(score, 1.0);
        assert_eq!(matched.len(), 2);
    }
}
