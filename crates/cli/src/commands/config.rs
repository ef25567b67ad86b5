use std::env;
use std::fs;
use std::path::Path;

use strategist_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use super::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("config", "config_validation", error.to_string(), 2)
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let weights = [
        ("weights.affinity", "STRATEGIST_WEIGHTS_AFFINITY", config.weights.affinity),
        ("weights.gap", "STRATEGIST_WEIGHTS_GAP", config.weights.gap),
        ("weights.diversity", "STRATEGIST_WEIGHTS_DIVERSITY", config.weights.diversity),
        ("weights.secondary", "STRATEGIST_WEIGHTS_SECONDARY", config.weights.secondary),
        ("secondary.frequency", "STRATEGIST_SECONDARY_FREQUENCY", config.secondary.frequency),
        ("secondary.reach", "STRATEGIST_SECONDARY_REACH", config.secondary.reach),
        ("secondary.synergy", "STRATEGIST_SECONDARY_SYNERGY", config.secondary.synergy),
        ("secondary.familiarity", "STRATEGIST_SECONDARY_FAMILIARITY", config.secondary.familiarity),
        (
            "secondary.tag_affinity",
            "STRATEGIST_SECONDARY_TAG_AFFINITY",
            config.secondary.tag_affinity,
        ),
    ];
    for (key_path, env_key, value) in weights {
        lines.push(render_line(key_path, &format!("{value:.2}"), source(key_path, &[env_key])));
    }

    lines.push(render_line(
        "top_performer.min_count",
        &config.top_performer.min_count.to_string(),
        source("top_performer.min_count", &["STRATEGIST_TOP_PERFORMER_MIN_COUNT"]),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["STRATEGIST_LOGGING_LEVEL", "STRATEGIST_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_lowercase(),
        source("logging.format", &["STRATEGIST_LOGGING_FORMAT", "STRATEGIST_LOG_FORMAT"]),
    ));

    CommandResult::text(lines.join("\n"))
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let set_env = env_keys
        .iter()
        .find(|env_key| env::var(env_key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = set_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
