//! Types for the strategy recommendation engine

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::catalogue::CatalogueEntry;
use crate::errors::{ApplicationError, DomainError};

/// Per-strategy task-type (or tag) counts
pub type CountsByStrategy = BTreeMap<String, BTreeMap<String, u64>>;

/// Per-strategy, per-key score cells
pub type CellsByStrategy = BTreeMap<String, BTreeMap<String, ScoreCell>>;

/// Aggregate usage snapshot supplied by the stats provider.
///
/// Only the first three maps are required. Every optional map falls back to
/// "no enhancement" when absent, `null` or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationInput {
    /// Times each strategy was used as the primary technique
    pub strategy_distribution: BTreeMap<String, u64>,
    /// Average quality score per strategy, in [0, 1]. Absent means unscored.
    pub score_by_strategy: BTreeMap<String, f64>,
    /// Task-type counts per primary strategy
    pub task_types_by_strategy: CountsByStrategy,
    /// Times each strategy was used as a secondary framework
    pub secondary_distribution: Option<BTreeMap<String, u64>>,
    /// User tags aggregated per primary strategy
    pub tags_by_strategy: Option<CountsByStrategy>,
    /// Quality per (strategy, task type)
    pub score_matrix: Option<CellsByStrategy>,
    /// Score spread per strategy
    pub score_variance: Option<BTreeMap<String, ScoreVariance>>,
    /// Quality per (primary, secondary) pairing
    pub combo_effectiveness: Option<CellsByStrategy>,
}

/// Sample count and average score for one cell of a score table
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreCell {
    pub count: u64,
    pub avg_score: Option<f64>,
}

impl ScoreCell {
    /// The cell's average when it is backed by at least one sample
    pub fn usable_score(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        self.avg_score.filter(|score| score.is_finite())
    }
}

/// Score distribution summary for a single strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreVariance {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub stddev: f64,
    pub count: u64,
}

impl RecommendationInput {
    /// Parse and validate a JSON snapshot
    pub fn from_json(raw: &str) -> Result<Self, ApplicationError> {
        let input: Self = serde_json::from_str(raw)
            .map_err(|error| ApplicationError::Snapshot(format!("malformed snapshot: {error}")))?;
        input.validate()?;
        Ok(input)
    }

    /// Total primary usages across every strategy
    pub fn total_optimizations(&self) -> u64 {
        super::snapshot::saturating_total(self.strategy_distribution.values())
    }

    /// Check the snapshot's numeric shape before handing it to the engine.
    ///
    /// The engine itself never fails on a malformed snapshot; it clamps. This
    /// is for callers that want to reject bad provider data up front.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (strategy, score) in &self.score_by_strategy {
            check_unit_score(score, || format!("score_by_strategy.{strategy}"))?;
        }

        let tables = [
            ("score_matrix", &self.score_matrix),
            ("combo_effectiveness", &self.combo_effectiveness),
        ];
        for (table, cells) in tables {
            let Some(cells) = cells else { continue };
            for (outer, row) in cells {
                for (inner, cell) in row {
                    if let Some(score) = &cell.avg_score {
                        check_unit_score(score, || format!("{table}.{outer}.{inner}.avg_score"))?;
                    }
                }
            }
        }

        if let Some(variance) = &self.score_variance {
            for (strategy, spread) in variance {
                if !spread.stddev.is_finite() || spread.stddev < 0.0 {
                    return Err(DomainError::InvalidInput(format!(
                        "score_variance.{strategy}.stddev must be a non-negative number"
                    )));
                }
                if spread.min > spread.max {
                    return Err(DomainError::InvalidInput(format!(
                        "score_variance.{strategy} has min greater than max"
                    )));
                }
            }
        }

        Ok(())
    }
}

fn check_unit_score(score: &f64, field: impl FnOnce() -> String) -> Result<(), DomainError> {
    if score.is_finite() && (0.0..=1.0).contains(score) {
        Ok(())
    } else {
        Err(DomainError::InvalidInput(format!("{} must be within [0, 1], got {score}", field())))
    }
}

/// A single untried strategy with every signal the engine computed for it.
///
/// Every score is in [0, 1]; `secondary_influence_pct` is in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredStrategy {
    pub name: &'static str,
    pub label: &'static str,
    pub best_for: &'static [&'static str],
    pub motivation: &'static str,
    pub affinity_score: f64,
    pub gap_score: f64,
    pub diversity_score: f64,
    pub secondary_familiarity_score: f64,
    pub tag_affinity_boost: f64,
    pub frequency_score: f64,
    pub reach_score: f64,
    pub synergy_score: f64,
    pub secondary_composite: f64,
    pub secondary_influence_pct: u8,
    pub secondary_count: u64,
    pub confidence_weight: f64,
    pub composite_score: f64,
    pub score_stddev: Option<f64>,
}

impl ScoredStrategy {
    pub(crate) fn unscored(entry: &'static CatalogueEntry) -> Self {
        Self {
            name: entry.name,
            label: entry.label,
            best_for: entry.best_for,
            motivation: entry.motivation,
            affinity_score: 0.0,
            gap_score: 0.0,
            diversity_score: 0.0,
            secondary_familiarity_score: 0.0,
            tag_affinity_boost: 0.0,
            frequency_score: 0.0,
            reach_score: 0.0,
            synergy_score: 0.0,
            secondary_composite: 0.0,
            secondary_influence_pct: 0,
            secondary_count: 0,
            confidence_weight: 0.0,
            composite_score: 0.0,
            score_stddev: None,
        }
    }
}

/// Confidence tier of the top recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    /// Strong composite score backed by enough history
    High,
    /// Composite score clears the noise floor
    Moderate,
    /// Anything else
    Exploratory,
}

impl ConfidenceTier {
    /// Badge text for the presentation layer
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "High confidence",
            ConfidenceTier::Moderate => "Moderate confidence",
            ConfidenceTier::Exploratory => "Exploratory",
        }
    }
}

/// Classified confidence with explanatory text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationConfidence {
    pub tier: ConfidenceTier,
    pub label: &'static str,
    pub reason: String,
    pub detail: String,
}

/// Kind of auxiliary insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    TagEngagement,
    Familiarity,
    FrequencyImpact,
}

/// Auxiliary explanation attached to the top recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub message: String,
    /// Sort key only, higher first
    pub impact: f64,
}

/// Output of one engine invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    /// Top-ranked untried strategy
    pub strategy: ScoredStrategy,
    /// Every untried strategy, best first
    pub ranked: Vec<ScoredStrategy>,
    pub confidence: RecommendationConfidence,
    pub insights: Vec<Insight>,
}

/// The tried strategy with the best observed quality
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPerformer {
    pub name: String,
    pub label: String,
    pub score: f64,
    pub count: u64,
    pub stddev: Option<f64>,
    /// Backed by at least five usages
    pub is_significant: bool,
}
