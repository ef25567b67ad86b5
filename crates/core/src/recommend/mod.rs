//! Strategy Recommendation Engine
//!
//! Recommends which untried catalogue strategy a user should try next, from
//! their primary and secondary usage history, the task types they work on and
//! the quality scores their strategies earned. Five independent signals
//! (affinity, gap, diversity, secondary usage, confidence) are blended into one
//! deterministic ranking.

mod catalogue;
mod engine;
mod explain;
mod performer;
mod scoring;
mod secondary;
mod signals;
mod snapshot;
mod types;

pub use catalogue::{catalogue_names, find_entry, CatalogueEntry, CATALOGUE};
pub use engine::{compute_recommendations, RecommendationEngine};
pub use explain::{classify_confidence, generate_insights};
pub use performer::{select_top_performer, SIGNIFICANT_COUNT};
pub use scoring::{
    compare_ranked, rank, secondary_influence_pct, CompositeScore, CompositeScorer,
    RecommendationWeights, SignalVector,
};
pub use secondary::{
    combo_score, familiarity_score, frequency_score, reach_score, synergy_score,
    tag_affinity_score, SecondaryProcessor, SecondaryProcessorWeights, SecondarySignals,
    COMBO_BONUS_WEIGHT,
};
pub use signals::{affinity_score, confidence_weight, diversity_score, gap_contribution, gap_score};
pub use snapshot::{aggregate_task_frequencies, Snapshot, TaskFrequency};
pub use types::*;

use crate::errors::DomainError;

/// Default composite weights
pub const DEFAULT_WEIGHTS: RecommendationWeights =
    RecommendationWeights { affinity: 0.50, gap: 0.25, diversity: 0.25, secondary: 0.20 };

/// Default secondary sub-signal weights
pub const DEFAULT_SECONDARY_WEIGHTS: SecondaryProcessorWeights = SecondaryProcessorWeights {
    frequency: 0.20,
    reach: 0.15,
    synergy: 0.25,
    familiarity: 0.25,
    tag_affinity: 0.15,
};

/// Minimum primary usages before a tried strategy can be a top performer
pub const DEFAULT_TOP_PERFORMER_MIN_COUNT: u64 = 3;

fn check_weights(section: &str, fields: &[(&str, f64)]) -> Result<(), DomainError> {
    match fields.iter().find(|(_, value)| !value.is_finite() || *value < 0.0) {
        Some((field, value)) => Err(DomainError::InvalidInput(format!(
            "{section}.{field} must be a finite, non-negative number, got {value}"
        ))),
        None => Ok(()),
    }
}
