//! Primary signal scorers: affinity, gap, diversity and confidence weight

use std::collections::BTreeMap;

use super::snapshot::{Snapshot, TaskFrequency};
use super::types::CellsByStrategy;

/// Sample size at which the confidence weight reaches one half
const CONFIDENCE_HALF_SATURATION: f64 = 10.0;

/// Share of the user's task-type history that falls inside `best_for`.
///
/// When the score matrix carries quality data for any recorded task type, each
/// type's frequency is scaled by a need factor of `2 - avg_score`, so task types
/// the user's strategies already handle poorly pull harder.
pub fn affinity_score(
    best_for: &[&str],
    frequency: &TaskFrequency,
    score_matrix: &CellsByStrategy,
) -> f64 {
    if frequency.total == 0 || best_for.is_empty() {
        return 0.0;
    }

    let need = task_need_factors(score_matrix);
    let enhanced = frequency.counts.keys().any(|task_type| need.contains_key(task_type.as_str()));

    let mut matched = 0.0;
    let mut total = 0.0;
    for (task_type, count) in &frequency.counts {
        let factor =
            if enhanced { need.get(task_type.as_str()).copied().unwrap_or(1.0) } else { 1.0 };
        let weight = *count as f64 * factor;
        total += weight;
        if best_for.contains(&task_type.as_str()) {
            matched += weight;
        }
    }

    if total > 0.0 {
        (matched / total).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Need factor per task type, from matrix quality aggregated across strategies
fn task_need_factors(score_matrix: &CellsByStrategy) -> BTreeMap<&str, f64> {
    let mut sums: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for row in score_matrix.values() {
        for (task_type, cell) in row {
            if let Some(score) = cell.usable_score() {
                let entry = sums.entry(task_type.as_str()).or_insert((0.0, 0.0));
                entry.0 += score.clamp(0.0, 1.0) * cell.count as f64;
                entry.1 += cell.count as f64;
            }
        }
    }

    sums.into_iter()
        .filter(|(_, (_, weight))| *weight > 0.0)
        .map(|(task_type, (weighted, weight))| (task_type, 1.0 + (1.0 - weighted / weight)))
        .collect()
}

/// How badly the tried strategies covering `task_type` perform relative to the
/// global average.
///
/// Uncovered types contribute 1.0; covered types without any usable score
/// contribute 0.0 since they cannot be assessed.
pub fn gap_contribution(task_type: &str, snapshot: &Snapshot<'_>, global_avg_score: f64) -> f64 {
    let covering: Vec<_> = snapshot.tried.iter().filter(|entry| entry.targets(task_type)).collect();
    if covering.is_empty() {
        return 1.0;
    }

    let mut weighted_sum = 0.0;
    let mut weight = 0.0;
    for entry in covering {
        let cell = snapshot.score_matrix.get(entry.name).and_then(|row| row.get(task_type));
        if let Some((score, count)) =
            cell.and_then(|cell| cell.usable_score().map(|score| (score, cell.count)))
        {
            weighted_sum += score.clamp(0.0, 1.0) * count as f64;
            weight += count as f64;
        } else if let Some(score) = snapshot.score(entry.name) {
            let usage = snapshot.usage(entry.name) as f64;
            weighted_sum += score * usage;
            weight += usage;
        }
    }

    if weight <= 0.0 {
        return 0.0;
    }

    let average = weighted_sum / weight;
    if average < global_avg_score {
        (1.0 - average / global_avg_score).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Mean gap contribution across `best_for`
pub fn gap_score(best_for: &[&str], snapshot: &Snapshot<'_>) -> f64 {
    let global = match snapshot.global_avg_score {
        Some(global) if global > 0.0 => global,
        _ => return 0.0,
    };
    if best_for.is_empty() {
        return 0.0;
    }

    let total: f64 =
        best_for.iter().map(|task_type| gap_contribution(task_type, snapshot, global)).sum();
    (total / best_for.len() as f64).clamp(0.0, 1.0)
}

/// Fraction of `best_for` not already well served by a tried strategy scoring at
/// or above the global average
pub fn diversity_score(best_for: &[&str], snapshot: &Snapshot<'_>) -> f64 {
    if best_for.is_empty() {
        return 0.0;
    }
    let Some(global) = snapshot.global_avg_score else {
        return 1.0;
    };

    let unserved = best_for
        .iter()
        .filter(|task_type| {
            !snapshot.tried.iter().any(|entry| {
                entry.targets(task_type)
                    && snapshot.score(entry.name).is_some_and(|score| score >= global)
            })
        })
        .count();

    (unserved as f64 / best_for.len() as f64).clamp(0.0, 1.0)
}

/// Data-sufficiency dampener: `1 - 1 / (1 + n / 10)`
pub fn confidence_weight(total_optimizations: u64) -> f64 {
    let n = total_optimizations as f64;
    1.0 - 1.0 / (1.0 + n / CONFIDENCE_HALF_SATURATION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::types::{RecommendationInput, ScoreCell};

    fn counts(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|(key, value)| (key.to_string(), *value)).collect()
    }

    fn cells(pairs: &[(&str, u64, Option<f64>)]) -> BTreeMap<String, ScoreCell> {
        pairs
            .iter()
            .map(|(key, count, avg_score)| {
                (key.to_string(), ScoreCell { count: *count, avg_score: *avg_score })
            })
            .collect()
    }

    fn frequency(pairs: &[(&str, u64)]) -> TaskFrequency {
        let counts = counts(pairs);
        let total = counts.values().sum();
        TaskFrequency { counts, total }
    }

    fn two_strategy_input() -> RecommendationInput {
        let mut input = RecommendationInput {
            strategy_distribution: counts(&[("co-star", 9), ("step-by-step", 6)]),
            ..RecommendationInput::default()
        };
        input.score_by_strategy.insert("co-star".to_string(), 0.72);
        input.score_by_strategy.insert("step-by-step".to_string(), 0.58);
        input
            .task_types_by_strategy
            .insert("co-star".to_string(), counts(&[("writing", 4), ("analysis", 1)]));
        input
            .task_types_by_strategy
            .insert("step-by-step".to_string(), counts(&[("coding", 8), ("analysis", 2)]));
        input
    }

    #[test]
    fn affinity_is_zero_without_history_or_targets() {
        let empty = TaskFrequency::default();
        assert_eq!(affinity_score(&["coding"], &empty, &CellsByStrategy::new()), 0.0);

        let freq = frequency(&[("coding", 3)]);
        assert_eq!(affinity_score(&[], &freq, &CellsByStrategy::new()), 0.0);
    }

    #[test]
    fn basic_affinity_is_share_of_history() {
        let freq = frequency(&[("writing", 4), ("analysis", 3), ("coding", 8)]);
        let score = affinity_score(&["reasoning", "math", "analysis"], &freq, &CellsByStrategy::new());
        assert!((score - 0.2).abs() < 1e-12);
    }

    #[test]
    fn affinity_is_exactly_one_when_history_is_fully_covered() {
        let freq = frequency(&[("coding", 5), ("math", 2)]);
        assert_eq!(affinity_score(&["coding", "math", "education"], &freq, &CellsByStrategy::new()), 1.0);

        let mut matrix = CellsByStrategy::new();
        matrix.insert("x".to_string(), cells(&[("coding", 4, Some(0.3)), ("math", 1, Some(0.9))]));
        assert_eq!(affinity_score(&["coding", "math"], &freq, &matrix), 1.0);
    }

    #[test]
    fn enhanced_affinity_favours_poorly_served_types() {
        let freq = frequency(&[("coding", 5), ("writing", 5)]);
        let mut matrix = CellsByStrategy::new();
        matrix.insert(
            "step-by-step".to_string(),
            cells(&[("coding", 5, Some(0.2)), ("writing", 5, Some(0.9))]),
        );

        let basic = affinity_score(&["coding"], &freq, &CellsByStrategy::new());
        let enhanced = affinity_score(&["coding"], &freq, &matrix);
        assert!((basic - 0.5).abs() < 1e-12);
        // need(coding) = 1.8, need(writing) = 1.1
        assert!((enhanced - 9.0 / 14.5).abs() < 1e-12);
    }

    #[test]
    fn enhanced_affinity_falls_back_without_usable_matrix_scores() {
        let freq = frequency(&[("coding", 5), ("writing", 5)]);
        let mut matrix = CellsByStrategy::new();
        matrix.insert(
            "step-by-step".to_string(),
            cells(&[("coding", 0, Some(0.2)), ("writing", 3, None), ("legal", 4, Some(0.1))]),
        );
        assert!((affinity_score(&["coding"], &freq, &matrix) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn uncovered_task_type_is_a_full_gap() {
        let input = two_strategy_input();
        let snapshot = Snapshot::from_input(&input);
        let global = snapshot.global_avg_score.unwrap();
        assert_eq!(gap_contribution("legal", &snapshot, global), 1.0);
    }

    #[test]
    fn underperforming_coverage_yields_proportional_gap() {
        let input = two_strategy_input();
        let snapshot = Snapshot::from_input(&input);
        let global = snapshot.global_avg_score.unwrap();
        let expected_global = (0.72 * 9.0 + 0.58 * 6.0) / 15.0;
        assert!((global - expected_global).abs() < 1e-12);

        // coding is covered only by step-by-step at 0.58
        let gap = gap_contribution("coding", &snapshot, global);
        assert!((gap - (1.0 - 0.58 / expected_global)).abs() < 1e-12);
        // writing is covered by co-star above the global average
        assert_eq!(gap_contribution("writing", &snapshot, global), 0.0);
    }

    #[test]
    fn matrix_cell_is_preferred_over_overall_score() {
        let mut input = two_strategy_input();
        let mut matrix = CellsByStrategy::new();
        matrix.insert("step-by-step".to_string(), cells(&[("coding", 8, Some(0.9))]));
        input.score_matrix = Some(matrix);

        let snapshot = Snapshot::from_input(&input);
        let global = snapshot.global_avg_score.unwrap();
        assert_eq!(gap_contribution("coding", &snapshot, global), 0.0);
    }

    #[test]
    fn covered_but_unscored_type_is_not_penalized() {
        let input = RecommendationInput {
            strategy_distribution: counts(&[("step-by-step", 4), ("co-star", 2)]),
            score_by_strategy: [("co-star".to_string(), 0.6)].into_iter().collect(),
            ..RecommendationInput::default()
        };
        let snapshot = Snapshot::from_input(&input);
        assert_eq!(gap_contribution("coding", &snapshot, 0.6), 0.0);
    }

    #[test]
    fn gap_score_requires_a_global_average() {
        let input = RecommendationInput {
            strategy_distribution: counts(&[("co-star", 3)]),
            ..RecommendationInput::default()
        };
        let snapshot = Snapshot::from_input(&input);
        assert_eq!(gap_score(&["legal"], &snapshot), 0.0);
    }

    #[test]
    fn gap_score_averages_contributions() {
        let input = two_strategy_input();
        let snapshot = Snapshot::from_input(&input);
        // constraint-injection: coding (underperforming), legal and medical (uncovered)
        let global = snapshot.global_avg_score.unwrap();
        let coding = 1.0 - 0.58 / global;
        let expected = (coding + 1.0 + 1.0) / 3.0;
        let score = gap_score(&["coding", "legal", "medical"], &snapshot);
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn diversity_counts_types_not_well_served() {
        let input = two_strategy_input();
        let snapshot = Snapshot::from_input(&input);
        // writing is well served by co-star; no tried strategy targets legal or medical
        let score = diversity_score(&["writing", "legal", "medical"], &snapshot);
        assert!((score - 2.0 / 3.0).abs() < 1e-12);
        // co-star scores above the global average on every type it targets
        let co_star = crate::recommend::catalogue::find_entry("co-star").unwrap();
        assert_eq!(diversity_score(co_star.best_for, &snapshot), 0.0);
        // coding is only covered by the below-average step-by-step
        assert_eq!(diversity_score(&["coding"], &snapshot), 1.0);
        assert_eq!(diversity_score(&[], &snapshot), 0.0);
    }

    #[test]
    fn diversity_without_global_average_treats_everything_as_unserved() {
        let input = RecommendationInput {
            strategy_distribution: counts(&[("co-star", 3)]),
            ..RecommendationInput::default()
        };
        let snapshot = Snapshot::from_input(&input);
        assert_eq!(diversity_score(&["writing"], &snapshot), 1.0);
    }

    #[test]
    fn confidence_weight_reference_points() {
        assert_eq!(confidence_weight(0), 0.0);
        assert!((confidence_weight(5) - 1.0 / 3.0).abs() < 1e-12);
        assert!((confidence_weight(10) - 0.5).abs() < 1e-12);
        assert!((confidence_weight(15) - 0.6).abs() < 1e-12);
        assert!((confidence_weight(20) - 2.0 / 3.0).abs() < 1e-12);
        assert!((confidence_weight(50) - 5.0 / 6.0).abs() < 1e-12);
        assert!(confidence_weight(1_000_000) < 1.0);
    }
}
