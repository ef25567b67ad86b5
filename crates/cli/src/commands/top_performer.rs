use std::path::PathBuf;

use strategist_core::config::ConfigOverrides;
use strategist_core::{select_top_performer, ApplicationError, TopPerformer};

use super::{load_config, load_snapshot, CommandResult};

const COMMAND: &str = "top-performer";

#[derive(Debug, Clone)]
pub struct TopPerformerArgs {
    pub input: PathBuf,
    pub min_count: Option<u64>,
    pub json: bool,
}

pub fn run(args: TopPerformerArgs) -> CommandResult {
    match top_performer(&args) {
        Ok(Some(top)) if args.json => CommandResult::json(COMMAND, &top),
        Ok(Some(top)) => CommandResult::text(render_human(&top)),
        Ok(None) => CommandResult::success(
            COMMAND,
            "no_top_performer: no tried strategy has enough scored usages",
        ),
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn top_performer(args: &TopPerformerArgs) -> Result<Option<TopPerformer>, ApplicationError> {
    let overrides =
        ConfigOverrides { top_performer_min_count: args.min_count, ..ConfigOverrides::default() };
    let config = load_config(None, overrides)?;

    let input = load_snapshot(&args.input)?;
    Ok(select_top_performer(&input, config.top_performer.min_count))
}

fn render_human(top: &TopPerformer) -> String {
    let spread = top.stddev.map_or_else(|| "n/a".to_string(), |stddev| format!("{stddev:.3}"));
    let significance = if top.is_significant { "significant" } else { "early signal" };
    format!(
        "top performer: {} ({})\n  score={:.3} uses={} stddev={spread} [{significance}]",
        top.label, top.name, top.score, top.count
    )
}
