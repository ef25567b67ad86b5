//! Human-readable confidence classification and insights for the top pick

use super::snapshot::{saturating_total, Snapshot};
use super::types::{
    ConfidenceTier, Insight, InsightKind, RecommendationConfidence, ScoredStrategy,
};

const HIGH_COMPOSITE: f64 = 0.30;
const HIGH_CONFIDENCE_WEIGHT: f64 = 0.5;
const MODERATE_COMPOSITE: f64 = 0.10;
/// Below this confidence weight an exploratory pick is mostly noise
const LOW_DATA_CONFIDENCE_WEIGHT: f64 = 0.3;

const AFFINITY_REASON_THRESHOLD: f64 = 0.2;
const DIVERSITY_REASON_THRESHOLD: f64 = 0.5;
const GAP_REASON_THRESHOLD: f64 = 0.3;
const GAP_DETAIL_THRESHOLD: f64 = 0.2;

const TAG_INSIGHT_THRESHOLD: f64 = 0.1;
const FAMILIARITY_INSIGHT_THRESHOLD: f64 = 0.1;
const FREQUENCY_IMPACT_MIN_PCT: u8 = 5;
const MAX_INSIGHTS: usize = 3;

/// Bucket the top recommendation into a confidence tier with reason and detail text
pub fn classify_confidence(
    top: &ScoredStrategy,
    snapshot: &Snapshot<'_>,
) -> RecommendationConfidence {
    let overlap = snapshot.overlapping_task_types(top.best_for);
    let leading: Vec<&str> = overlap.iter().take(2).map(|(task_type, _)| task_type.as_str()).collect();

    let tier = if top.composite_score > HIGH_COMPOSITE
        && top.confidence_weight > HIGH_CONFIDENCE_WEIGHT
    {
        ConfidenceTier::High
    } else if top.composite_score > MODERATE_COMPOSITE {
        ConfidenceTier::Moderate
    } else {
        ConfidenceTier::Exploratory
    };

    let reason = match tier {
        ConfidenceTier::High => high_reason(&leading),
        ConfidenceTier::Moderate => moderate_reason(top, &leading),
        ConfidenceTier::Exploratory => "Worth exploring to broaden your strategy mix".to_string(),
    };

    let detail = if tier == ConfidenceTier::Exploratory
        && top.confidence_weight < LOW_DATA_CONFIDENCE_WEIGHT
    {
        "Keep forging: a few more optimizations will sharpen these recommendations.".to_string()
    } else {
        detail_text(top, snapshot, &overlap)
    };

    RecommendationConfidence { tier, label: tier.label(), reason, detail }
}

fn high_reason(leading: &[&str]) -> String {
    if leading.is_empty() {
        "Strong match across your optimization history".to_string()
    } else {
        format!("Strong fit for your {} work", leading.join(" and "))
    }
}

fn moderate_reason(top: &ScoredStrategy, leading: &[&str]) -> String {
    if top.affinity_score > AFFINITY_REASON_THRESHOLD && !leading.is_empty() {
        format!("Matches your {} tasks", leading.join(" and "))
    } else if top.secondary_count > 0 {
        format!("You already use {} as a secondary framework", top.label)
    } else if top.diversity_score > DIVERSITY_REASON_THRESHOLD {
        "Opens task types your current strategies don't cover well".to_string()
    } else if top.gap_score > GAP_REASON_THRESHOLD {
        "Targets task types where your current strategies underperform".to_string()
    } else {
        "A solid complement to your current strategies".to_string()
    }
}

/// Tooltip-length explanation. Only task types present in the user's history
/// are ever named.
fn detail_text(top: &ScoredStrategy, snapshot: &Snapshot<'_>, overlap: &[(String, u64)]) -> String {
    let mut parts = Vec::new();

    let total = snapshot.frequency.total;
    if total > 0 && !overlap.is_empty() {
        let matched = saturating_total(overlap.iter().map(|(_, count)| count));
        let pct = (matched as f64 / total as f64 * 100.0).round() as u64;
        let names: Vec<&str> = overlap.iter().map(|(task_type, _)| task_type.as_str()).collect();
        parts.push(format!("{pct}% of your work ({}) falls in its target task types.", names.join(", ")));
    }

    if top.gap_score > GAP_DETAIL_THRESHOLD {
        parts.push("Your current strategies underperform on some of these task types.".to_string());
    }

    if top.secondary_count > 0 {
        parts.push(format!(
            "You've used it {} as a secondary framework.",
            times(top.secondary_count)
        ));
    }

    if parts.is_empty() {
        parts.push("It complements the strategies you already use.".to_string());
    }

    parts.join(" ")
}

/// Up to three auxiliary insights for the top pick, highest impact first
pub fn generate_insights(top: &ScoredStrategy, matched_tags: &[String]) -> Vec<Insight> {
    let mut insights = Vec::new();

    if top.tag_affinity_boost > TAG_INSIGHT_THRESHOLD && !matched_tags.is_empty() {
        insights.push(Insight {
            kind: InsightKind::TagEngagement,
            message: format!(
                "Your tags ({}) line up with what {} is built for.",
                matched_tags.join(", "),
                top.label
            ),
            impact: top.tag_affinity_boost,
        });
    }

    let familiar = top.secondary_count > 0
        && top.secondary_familiarity_score > FAMILIARITY_INSIGHT_THRESHOLD;
    if familiar {
        insights.push(Insight {
            kind: InsightKind::Familiarity,
            message: format!(
                "You've used {} {} as a secondary framework, so it already fits your workflow.",
                top.label,
                times(top.secondary_count)
            ),
            impact: top.secondary_familiarity_score,
        });
    }

    // Familiarity already explains secondary influence
    if !familiar && top.secondary_influence_pct > FREQUENCY_IMPACT_MIN_PCT {
        insights.push(Insight {
            kind: InsightKind::FrequencyImpact,
            message: format!(
                "Secondary usage accounts for {}% of this recommendation.",
                top.secondary_influence_pct
            ),
            impact: f64::from(top.secondary_influence_pct) / 100.0,
        });
    }

    insights.sort_by(|a, b| b.impact.total_cmp(&a.impact));
    insights.truncate(MAX_INSIGHTS);
    insights
}

fn times(count: u64) -> String {
    if count == 1 {
        "once".to_string()
    } else {
        format!("{count} times")
    }
}
