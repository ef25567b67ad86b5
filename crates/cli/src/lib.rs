pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use strategist_core::config::{AppConfig, LoadOptions, LogFormat};
use uuid::Uuid;

use commands::recommend::RecommendArgs;
use commands::top_performer::TopPerformerArgs;
use commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "strategist",
    about = "Strategy recommendation CLI",
    long_about = "Rank untried prompting strategies from a usage snapshot, inspect the catalogue and effective configuration.",
    after_help = "Examples:\n  strategist recommend --input snapshot.json\n  strategist top-performer --input snapshot.json --json\n  strategist config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Recommend the next untried strategy for a usage snapshot")]
    Recommend {
        #[arg(long, help = "Path to the usage snapshot JSON, or `-` for stdin")]
        input: PathBuf,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
        #[arg(long, help = "Explicit config file; must exist when given")]
        config: Option<PathBuf>,
    },
    #[command(about = "Show the best-scoring strategy the user has already tried")]
    TopPerformer {
        #[arg(long, help = "Path to the usage snapshot JSON, or `-` for stdin")]
        input: PathBuf,
        #[arg(long, help = "Minimum primary usages to qualify (defaults to config)")]
        min_count: Option<u64>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List the strategy catalogue")]
    Catalogue {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Recommend { .. } => "recommend",
            Command::TopPerformer { .. } => "top-performer",
            Command::Catalogue { .. } => "catalogue",
            Command::Config => "config",
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config_path = match &cli.command {
        Command::Recommend { config, .. } => config.clone(),
        _ => None,
    };
    if let Ok(config) = AppConfig::load(LoadOptions { config_path, ..LoadOptions::default() }) {
        init_logging(&config);
    }

    let correlation_id = Uuid::new_v4();
    let span = tracing::info_span!("strategist", command = cli.command.name());
    let _entered = span.enter();
    tracing::info!(event_name = "command.started", %correlation_id);

    let result = dispatch(cli.command);
    tracing::debug!(event_name = "command.completed", exit_code = result.exit_code);

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn dispatch(command: Command) -> CommandResult {
    match command {
        Command::Recommend { input, json, config } => {
            commands::recommend::run(RecommendArgs { input, json, config })
        }
        Command::TopPerformer { input, min_count, json } => {
            commands::top_performer::run(TopPerformerArgs { input, min_count, json })
        }
        Command::Catalogue { json } => commands::catalogue::run(json),
        Command::Config => commands::config::run(),
    }
}

/// Diagnostics go to stderr; stdout carries command output only
fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}
