//! ReplyKit - resilient AI reply control for webmail compose surfaces
//!
//! Main entry point for the ReplyKit CLI.

mod cli;
mod cmd_service;
mod cmd_snapshot;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use replykit_config::{
    Config, ConfigLoader, ConfigValidator, FileSettings, LoggingConfig, SettingsSource,
};

use crate::cli::{Cli, Commands};

fn replykit_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".replykit"))
        .unwrap_or_else(|| PathBuf::from(".replykit"))
}

/// Initialize tracing with console output and, when a log directory is
/// configured, a daily rolling file.
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = match &logging.directory {
        Some(dir) => {
            let log_dir = PathBuf::from(ConfigLoader::expand_path(dir));
            std::fs::create_dir_all(&log_dir)?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("replykit")
                .filename_suffix("log")
                .max_log_files(14)
                .build(&log_dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The guard flushes on drop; keep it for the life of the process.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(|| replykit_dir().join("config.toml"));
    let config = ConfigLoader::load_or_default(&config_path)?;

    init_tracing(&config.logging)?;
    info!("Using configuration {}", config_path.display());

    match cli.command {
        Commands::Probe {
            snapshot,
            role,
            format,
        } => cmd_snapshot::probe(&config, &snapshot, role.as_deref(), &format),
        Commands::Generate {
            content,
            snapshot,
            tone,
        } => cmd_service::generate(&config, content, snapshot.as_deref(), tone).await,
        Commands::Ping => cmd_service::ping(&config).await,
        Commands::Templates => {
            list_templates(&FileSettings::new(&config_path));
            Ok(())
        }
        Commands::Validate => validate(&config),
        Commands::Watch {
            snapshot,
            duration_ms,
            output,
        } => {
            cmd_snapshot::watch(
                config,
                &snapshot,
                Duration::from_millis(duration_ms),
                output.as_deref(),
            )
            .await
        }
    }
}

fn list_templates(settings: &dyn SettingsSource) {
    let templates = settings.templates();
    if templates.is_empty() {
        println!("No templates saved.");
        return;
    }
    for template in templates {
        println!("{}", template.name);
        println!("    {}", template.content);
    }
}

fn validate(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config)?;

    for warning in &result.warnings {
        warn!("{}: {}", warning.path, warning.message);
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    // Selector overrides must also parse.
    cmd_snapshot::configured_locator(config)?;

    if result.is_valid() {
        println!("Configuration is valid.");
        Ok(())
    } else {
        Err(format!("{} configuration error(s)", result.errors.len()).into())
    }
}
