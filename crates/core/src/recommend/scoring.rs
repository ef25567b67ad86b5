//! Composite scoring and ranking of untried strategies

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::types::ScoredStrategy;
use crate::errors::DomainError;

/// Weights for the composite score.
///
/// The base three (affinity, gap, diversity) sum to 1 by default; `secondary`
/// is an additive bonus layered on top and need not keep the total at 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationWeights {
    /// Weight for task-type affinity (default: 0.50)
    pub affinity: f64,
    /// Weight for the performance gap (default: 0.25)
    pub gap: f64,
    /// Weight for territory diversity (default: 0.25)
    pub diversity: f64,
    /// Weight for the secondary composite (default: 0.20)
    pub secondary: f64,
}

impl Default for RecommendationWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

impl RecommendationWeights {
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("affinity", self.affinity),
            ("gap", self.gap),
            ("diversity", self.diversity),
            ("secondary", self.secondary),
        ];
        super::check_weights("weights", &fields)
    }
}

/// The four weighted signals of one candidate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalVector {
    pub affinity: f64,
    pub gap: f64,
    pub diversity: f64,
    pub secondary: f64,
}

/// Composite score with the share attributable to secondary signals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeScore {
    pub score: f64,
    pub secondary_influence_pct: u8,
}

/// Combines signals into the final, confidence-dampened composite
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    weights: RecommendationWeights,
}

impl CompositeScorer {
    pub fn new() -> Self {
        Self { weights: RecommendationWeights::default() }
    }

    pub fn with_weights(weights: RecommendationWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RecommendationWeights {
        &self.weights
    }

    /// `(wa*affinity + wg*gap + wd*diversity + ws*secondary) * confidence`, clamped
    pub fn composite(&self, signals: &SignalVector, confidence: f64) -> CompositeScore {
        let base_only = self.base(signals) * confidence;
        let raw = base_only + self.weights.secondary * signals.secondary * confidence;

        // influence uses the unclamped sums
        CompositeScore {
            score: raw.clamp(0.0, 1.0),
            secondary_influence_pct: secondary_influence_pct(raw, base_only),
        }
    }

    fn base(&self, signals: &SignalVector) -> f64 {
        self.weights.affinity * signals.affinity
            + self.weights.gap * signals.gap
            + self.weights.diversity * signals.diversity
    }
}

impl Default for CompositeScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentage of an unclamped `composite` contributed by the secondary layer
pub fn secondary_influence_pct(composite: f64, base_only: f64) -> u8 {
    if composite <= 0.0 {
        return 0;
    }
    ((composite - base_only) / composite * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Composite score descending, then strategy name ascending
pub fn compare_ranked(a: &ScoredStrategy, b: &ScoredStrategy) -> Ordering {
    b.composite_score.total_cmp(&a.composite_score).then_with(|| a.name.cmp(b.name))
}

/// Sort candidates into their final, fully deterministic order
pub fn rank(mut candidates: Vec<ScoredStrategy>) -> Vec<ScoredStrategy> {
    candidates.sort_by(compare_ranked);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::catalogue::find_entry;

    fn scored(name: &str, composite: f64) -> ScoredStrategy {
        let mut strategy = ScoredStrategy::unscored(find_entry(name).unwrap());
        strategy.composite_score = composite;
        strategy
    }

    #[test]
    fn default_weights() {
        let weights = RecommendationWeights::default();
        assert_eq!(weights.affinity, 0.50);
        assert_eq!(weights.gap, 0.25);
        assert_eq!(weights.diversity, 0.25);
        assert_eq!(weights.secondary, 0.20);
        assert!((weights.affinity + weights.gap + weights.diversity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_weight_is_rejected() {
        let weights = RecommendationWeights { gap: f64::NAN, ..RecommendationWeights::default() };
        assert!(weights.validate().unwrap_err().to_string().contains("weights.gap"));
    }

    #[test]
    fn composite_is_dampened_by_confidence() {
        let scorer = CompositeScorer::new();
        let signals = SignalVector { affinity: 0.8, gap: 0.4, diversity: 0.6, secondary: 0.5 };

        let full = scorer.composite(&signals, 1.0);
        // 0.40 + 0.10 + 0.15 + 0.10
        assert!((full.score - 0.75).abs() < 1e-12);
        assert_eq!(full.secondary_influence_pct, 13);

        let damped = scorer.composite(&signals, 0.5);
        assert!((damped.score - 0.375).abs() < 1e-12);
        assert_eq!(damped.secondary_influence_pct, 13);
    }

    #[test]
    fn composite_is_clamped_to_one() {
        let scorer = CompositeScorer::new();
        let signals = SignalVector { affinity: 1.0, gap: 1.0, diversity: 1.0, secondary: 1.0 };
        let composite = scorer.composite(&signals, 1.0);
        assert_eq!(composite.score, 1.0);
        // raw 1.2 against a base of 1.0
        assert_eq!(composite.secondary_influence_pct, 17);
    }

    #[test]
    fn zero_composite_has_no_secondary_influence() {
        let scorer = CompositeScorer::new();
        let composite = scorer.composite(&SignalVector::default(), 0.9);
        assert_eq!(composite.score, 0.0);
        assert_eq!(composite.secondary_influence_pct, 0);
    }

    #[test]
    fn secondary_only_weights_attribute_everything_to_secondary() {
        let scorer = CompositeScorer::with_weights(RecommendationWeights {
            affinity: 0.0,
            gap: 0.0,
            diversity: 0.0,
            secondary: 1.0,
        });
        let signals = SignalVector { affinity: 1.0, gap: 1.0, diversity: 1.0, secondary: 0.4 };
        let composite = scorer.composite(&signals, 1.0);
        assert!((composite.score - 0.4).abs() < 1e-12);
        assert_eq!(composite.secondary_influence_pct, 100);
    }

    #[test]
    fn ties_are_broken_alphabetically() {
        let ranked = rank(vec![
            scored("risen", 0.3),
            scored("co-star", 0.5),
            scored("chain-of-thought", 0.3),
            scored("persona-assignment", 0.3),
        ]);
        let names: Vec<_> = ranked.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["co-star", "chain-of-thought", "persona-assignment", "risen"]);
    }
}
