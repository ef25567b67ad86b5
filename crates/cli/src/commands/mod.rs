pub mod catalogue;
pub mod config;
pub mod recommend;
pub mod top_performer;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use strategist_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use strategist_core::{ApplicationError, RecommendationInput};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(
            command,
            error.error_class(),
            format!("{} ({error})", error.user_message()),
            error.exit_code(),
        )
    }

    pub fn text(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn json<T: Serialize>(command: &str, value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(output) => Self::text(output),
            Err(error) => Self::failure(command, "serialization", error.to_string(), 1),
        }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Load configuration the way every engine-backed command does
pub(crate) fn load_config(
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
) -> Result<AppConfig, ApplicationError> {
    let require_file = config_path.is_some();
    AppConfig::load(LoadOptions { config_path, require_file, overrides })
        .map_err(|error| ApplicationError::Configuration(error.to_string()))
}

/// Read a snapshot from a file, or from stdin when the path is `-`
pub(crate) fn load_snapshot(path: &Path) -> Result<RecommendationInput, ApplicationError> {
    let raw =
        read_snapshot(path).map_err(|error| ApplicationError::Snapshot(format!("{error:#}")))?;
    RecommendationInput::from_json(&raw)
}

fn read_snapshot(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw).context("failed to read snapshot from stdin")?;
        return Ok(raw);
    }

    fs::read_to_string(path).with_context(|| format!("failed to read snapshot `{}`", path.display()))
}
