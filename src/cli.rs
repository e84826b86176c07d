//! CLI definitions for ReplyKit.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use replykit_engine::Tone;

/// ReplyKit CLI.
#[derive(Parser)]
#[command(name = "replykit")]
#[command(about = "Resilient AI reply control for webmail compose surfaces")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.replykit/config.toml)
    #[arg(short, long, global = true, env = "REPLYKIT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Report which catalog selectors match in a document snapshot
    Probe {
        /// JSON document snapshot
        #[arg(long)]
        snapshot: PathBuf,

        /// Only probe this role (compose_window, toolbar, compose_editor, quoted_source)
        #[arg(long)]
        role: Option<String>,

        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Request one generated reply from the service
    Generate {
        /// Email content to reply to
        #[arg(long, conflicts_with = "snapshot")]
        content: Option<String>,

        /// Read the quoted source from a document snapshot instead
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Reply tone
        #[arg(long, default_value = "Professional")]
        tone: Tone,
    },

    /// Check that the reply service is reachable
    Ping,

    /// List saved reply templates
    Templates,

    /// Validate the configuration file
    Validate,

    /// Run the engine against a snapshot and write the resulting document
    Watch {
        /// JSON document snapshot
        #[arg(long)]
        snapshot: PathBuf,

        /// How long to keep observing
        #[arg(long, default_value_t = 1000)]
        duration_ms: u64,

        /// Where to write the resulting snapshot (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
