//! Layered runtime configuration.
//!
//! Values resolve as defaults, then `strategist.toml` (or `config/strategist.toml`,
//! or an explicit path), then `STRATEGIST_*` environment variables, then
//! caller-supplied overrides. `${VAR}` references inside the file are expanded
//! before parsing.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::DomainError;
use crate::recommend::{
    RecommendationWeights, SecondaryProcessorWeights, DEFAULT_TOP_PERFORMER_MIN_COUNT,
};

pub const DEFAULT_CONFIG_FILE: &str = "strategist.toml";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub weights: RecommendationWeights,
    pub secondary: SecondaryProcessorWeights,
    pub top_performer: TopPerformerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopPerformerConfig {
    pub min_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Highest-precedence values, typically from command-line flags
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub top_performer_min_count: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    /// Fail instead of falling back to defaults when no file is found
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("`{path}` is not valid TOML: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` does not exist")]
    MissingConfigFile(PathBuf),
    #[error("`${{{var}}}` is referenced in the config file but not set")]
    MissingEnvInterpolation { var: String },
    #[error("config file has an unclosed `${{` reference")]
    UnterminatedInterpolation,
    #[error("{key}={value:?} is not a valid value")]
    InvalidEnvOverride { key: String, value: String },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            weights: RecommendationWeights::default(),
            secondary: SecondaryProcessorWeights::default(),
            top_performer: TopPerformerConfig { min_count: DEFAULT_TOP_PERFORMER_MIN_COUNT },
            logging: LoggingConfig { level: "info".to_owned(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let format = match raw.trim().to_ascii_lowercase().as_str() {
            "compact" => Self::Compact,
            "pretty" => Self::Pretty,
            "json" => Self::Json,
            _ => {
                return Err(ConfigError::Validation(format!(
                    "logging.format must be compact, pretty or json, got `{raw}`"
                )))
            }
        };
        Ok(format)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let LoadOptions { config_path, require_file, overrides } = options;
        let mut config = Self::default();

        match resolve_config_path(config_path.as_deref()) {
            Some(path) => read_patch(&path)?.apply(&mut config),
            None if require_file => {
                return Err(ConfigError::MissingConfigFile(
                    config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
                ))
            }
            None => {}
        }

        config.apply_env()?;
        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        let weights = &mut self.weights;
        let secondary = &mut self.secondary;
        let numeric: [(&str, &mut f64); 9] = [
            ("STRATEGIST_WEIGHTS_AFFINITY", &mut weights.affinity),
            ("STRATEGIST_WEIGHTS_GAP", &mut weights.gap),
            ("STRATEGIST_WEIGHTS_DIVERSITY", &mut weights.diversity),
            ("STRATEGIST_WEIGHTS_SECONDARY", &mut weights.secondary),
            ("STRATEGIST_SECONDARY_FREQUENCY", &mut secondary.frequency),
            ("STRATEGIST_SECONDARY_REACH", &mut secondary.reach),
            ("STRATEGIST_SECONDARY_SYNERGY", &mut secondary.synergy),
            ("STRATEGIST_SECONDARY_FAMILIARITY", &mut secondary.familiarity),
            ("STRATEGIST_SECONDARY_TAG_AFFINITY", &mut secondary.tag_affinity),
        ];
        for (key, slot) in numeric {
            if let Some(parsed) = env_value::<f64>(key)? {
                *slot = parsed;
            }
        }

        if let Some(min_count) = env_value::<u64>("STRATEGIST_TOP_PERFORMER_MIN_COUNT")? {
            self.top_performer.min_count = min_count;
        }
        if let Some(level) = env_alias("STRATEGIST_LOGGING_LEVEL", "STRATEGIST_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = env_alias("STRATEGIST_LOGGING_FORMAT", "STRATEGIST_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |error: DomainError| ConfigError::Validation(error.to_string());
        self.weights.validate().map_err(invalid)?;
        self.secondary.validate().map_err(invalid)?;

        if self.top_performer.min_count == 0 {
            return Err(ConfigError::Validation(
                "top_performer.min_count must be at least 1".to_owned(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.trim().to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {}, got `{}`",
                LOG_LEVELS.join("|"),
                self.logging.level
            )));
        }
        Ok(())
    }
}

impl ConfigOverrides {
    fn apply(self, config: &mut AppConfig) {
        merge(&mut config.logging.level, self.log_level);
        merge(&mut config.logging.format, self.log_format);
        merge(&mut config.top_performer.min_count, self.top_performer_min_count);
    }
}

/// The config file `load` would read, if any
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    match explicit_path {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => [PathBuf::from(DEFAULT_CONFIG_FILE), Path::new("config").join(DEFAULT_CONFIG_FILE)]
            .into_iter()
            .find(|candidate| candidate.is_file()),
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&expand_env_refs(&raw)?)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Replace every `${NAME}` with the value of environment variable `NAME`
fn expand_env_refs(raw: &str) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let reference = &rest[start + 2..];
        let end = reference.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let name = &reference[..end];
        let value = env::var(name)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: name.to_owned() })?;
        expanded.push_str(&value);
        rest = &reference[end + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

/// Non-blank value of an environment variable
fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_alias(primary: &str, alias: &str) -> Option<String> {
    env_string(primary).or_else(|| env_string(alias))
}

fn env_value<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    env_string(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
                key: key.to_owned(),
                value: value.clone(),
            })
        })
        .transpose()
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigPatch {
    weights: WeightsPatch,
    secondary: SecondaryPatch,
    top_performer: TopPerformerPatch,
    logging: LoggingPatch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WeightsPatch {
    affinity: Option<f64>,
    gap: Option<f64>,
    diversity: Option<f64>,
    secondary: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SecondaryPatch {
    frequency: Option<f64>,
    reach: Option<f64>,
    synergy: Option<f64>,
    familiarity: Option<f64>,
    tag_affinity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TopPerformerPatch {
    min_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl ConfigPatch {
    fn apply(self, config: &mut AppConfig) {
        let Self { weights, secondary, top_performer, logging } = self;

        merge(&mut config.weights.affinity, weights.affinity);
        merge(&mut config.weights.gap, weights.gap);
        merge(&mut config.weights.diversity, weights.diversity);
        merge(&mut config.weights.secondary, weights.secondary);

        merge(&mut config.secondary.frequency, secondary.frequency);
        merge(&mut config.secondary.reach, secondary.reach);
        merge(&mut config.secondary.synergy, secondary.synergy);
        merge(&mut config.secondary.familiarity, secondary.familiarity);
        merge(&mut config.secondary.tag_affinity, secondary.tag_affinity);

        merge(&mut config.top_performer.min_count, top_performer.min_count);

        merge(&mut config.logging.level, logging.level);
        merge(&mut config.logging.format, logging.format);
    }
}
