use std::path::PathBuf;

use strategist_core::config::ConfigOverrides;
use strategist_core::{ApplicationError, RecommendationEngine, RecommendationResult};

use super::{load_config, load_snapshot, CommandResult};

const COMMAND: &str = "recommend";

#[derive(Debug, Clone)]
pub struct RecommendArgs {
    pub input: PathBuf,
    pub json: bool,
    pub config: Option<PathBuf>,
}

pub fn run(args: RecommendArgs) -> CommandResult {
    match recommend(&args) {
        Ok(Some(result)) if args.json => CommandResult::json(COMMAND, &result),
        Ok(Some(result)) => CommandResult::text(render_human(&result)),
        Ok(None) => CommandResult::success(
            COMMAND,
            "no_recommendation: no usage history yet, or every catalogue strategy has been tried",
        ),
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn recommend(args: &RecommendArgs) -> Result<Option<RecommendationResult>, ApplicationError> {
    let config = load_config(args.config.clone(), ConfigOverrides::default())?;
    let input = load_snapshot(&args.input)?;

    let engine = RecommendationEngine::with_weights(config.weights, config.secondary);
    Ok(engine.recommend(&input))
}

fn render_human(result: &RecommendationResult) -> String {
    let top = &result.strategy;
    let mut lines = vec![
        format!("recommended: {} ({})", top.label, top.name),
        format!("  {}", top.motivation),
        format!("  {}: {}", result.confidence.label, result.confidence.reason),
        format!("  {}", result.confidence.detail),
    ];

    if !result.insights.is_empty() {
        lines.push("insights:".to_string());
        lines.extend(result.insights.iter().map(|insight| format!("  - {}", insight.message)));
    }

    lines.push("ranking:".to_string());
    for (position, strategy) in result.ranked.iter().enumerate() {
        lines.push(format!(
            "  {:>2}. {:<22} composite={:.3} affinity={:.2} gap={:.2} diversity={:.2} secondary={:.2} ({}%)",
            position + 1,
            strategy.name,
            strategy.composite_score,
            strategy.affinity_score,
            strategy.gap_score,
            strategy.diversity_score,
            strategy.secondary_composite,
            strategy.secondary_influence_pct
        ));
    }

    lines.join("\n")
}
