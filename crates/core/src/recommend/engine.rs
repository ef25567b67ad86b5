//! Recommendation engine implementation

use super::catalogue::{find_entry, CatalogueEntry};
use super::explain::{classify_confidence, generate_insights};
use super::scoring::{rank, CompositeScorer, RecommendationWeights, SignalVector};
use super::secondary::{SecondaryProcessor, SecondaryProcessorWeights};
use super::signals::{affinity_score, confidence_weight, diversity_score, gap_score};
use super::snapshot::Snapshot;
use super::types::{RecommendationInput, RecommendationResult, ScoredStrategy};

/// Ranks untried catalogue strategies for one user's usage snapshot.
///
/// Holds only its weights; every call is a pure function of the input.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    scorer: CompositeScorer,
    secondary_weights: SecondaryProcessorWeights,
}

impl RecommendationEngine {
    /// Create an engine with default weights
    pub fn new() -> Self {
        Self {
            scorer: CompositeScorer::new(),
            secondary_weights: SecondaryProcessorWeights::default(),
        }
    }

    /// Create with custom weights
    pub fn with_weights(
        weights: RecommendationWeights,
        secondary_weights: SecondaryProcessorWeights,
    ) -> Self {
        Self { scorer: CompositeScorer::with_weights(weights), secondary_weights }
    }

    pub fn weights(&self) -> &RecommendationWeights {
        self.scorer.weights()
    }

    pub fn secondary_weights(&self) -> &SecondaryProcessorWeights {
        &self.secondary_weights
    }

    /// Recommend the next untried strategy.
    ///
    /// Returns `None` when there is no history at all, or when every catalogue
    /// strategy has already been tried.
    pub fn recommend(&self, input: &RecommendationInput) -> Option<RecommendationResult> {
        let snapshot = Snapshot::from_input(input);

        if snapshot.total_optimizations == 0 {
            tracing::debug!(event_name = "recommend.skipped", reason = "no_history");
            return None;
        }

        let untried: Vec<&'static CatalogueEntry> = snapshot.untried().collect();
        if untried.is_empty() {
            tracing::debug!(event_name = "recommend.skipped", reason = "catalogue_exhausted");
            return None;
        }

        if snapshot.frequency.total == 0 {
            tracing::debug!(
                event_name = "recommend.exploration_mode",
                total_optimizations = snapshot.total_optimizations
            );
        }

        let confidence = confidence_weight(snapshot.total_optimizations);
        let processor = SecondaryProcessor::new(&snapshot, self.secondary_weights);

        let ranked = rank(
            untried
                .iter()
                .map(|&entry| self.score_strategy(entry, &snapshot, &processor, confidence))
                .collect(),
        );
        let top = ranked.first()?.clone();

        let matched_tags =
            find_entry(top.name).map(|entry| processor.score(entry).matched_tags).unwrap_or_default();
        let confidence_summary = classify_confidence(&top, &snapshot);
        let insights = generate_insights(&top, &matched_tags);

        tracing::debug!(
            event_name = "recommend.ranked",
            candidates = ranked.len(),
            strategy = top.name,
            composite_score = top.composite_score,
            confidence_weight = confidence,
            tier = confidence_summary.label
        );

        Some(RecommendationResult { strategy: top, ranked, confidence: confidence_summary, insights })
    }

    fn score_strategy(
        &self,
        entry: &'static CatalogueEntry,
        snapshot: &Snapshot<'_>,
        processor: &SecondaryProcessor<'_, '_>,
        confidence: f64,
    ) -> ScoredStrategy {
        let affinity = affinity_score(entry.best_for, &snapshot.frequency, snapshot.score_matrix);
        let gap = gap_score(entry.best_for, snapshot);
        let diversity = diversity_score(entry.best_for, snapshot);
        let secondary = processor.score(entry);

        let composite = self.scorer.composite(
            &SignalVector { affinity, gap, diversity, secondary: secondary.composite },
            confidence,
        );

        ScoredStrategy {
            affinity_score: affinity,
            gap_score: gap,
            diversity_score: diversity,
            secondary_familiarity_score: secondary.familiarity,
            tag_affinity_boost: secondary.tag_affinity,
            frequency_score: secondary.frequency,
            reach_score: secondary.reach,
            synergy_score: secondary.synergy,
            secondary_composite: secondary.composite,
            secondary_influence_pct: composite.secondary_influence_pct,
            secondary_count: secondary.secondary_count,
            confidence_weight: confidence,
            composite_score: composite.score,
            score_stddev: snapshot
                .variance
                .get(entry.name)
                .map(|spread| spread.stddev)
                .filter(|stddev| stddev.is_finite()),
            ..ScoredStrategy::unscored(entry)
        }
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the engine once with explicit weight profiles
pub fn compute_recommendations(
    input: &RecommendationInput,
    weights: &RecommendationWeights,
    secondary_weights: &SecondaryProcessorWeights,
) -> Option<RecommendationResult> {
    RecommendationEngine::with_weights(*weights, *secondary_weights).recommend(input)
}
