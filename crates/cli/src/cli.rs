//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// pdstack - protocol decoder stack output dispatcher
#[derive(Parser, Debug)]
#[command(
    name = "pdstack",
    author,
    version,
    about = "Protocol decoder stack output dispatcher",
    long_about = "Validates decoder stack configurations and replays recorded decoder \n\
                  output through the dispatcher: payload conversion, forwarding to \n\
                  stacked decoders and delivery to the configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PDSTACK_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PDSTACK_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a stack configuration file
    Validate(ValidateArgs),

    /// Replay recorded decoder output through the dispatcher
    Replay(ReplayArgs),
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "stack.toml", env = "PDSTACK_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `replay` command
#[derive(Parser, Debug, Clone)]
pub struct ReplayArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "stack.toml", env = "PDSTACK_CONFIG")]
    pub config: PathBuf,

    /// JSON lines file of recorded `put` calls
    #[arg(short, long, env = "PDSTACK_EVENTS")]
    pub events: PathBuf,

    /// Stop after this many events (0 = unlimited)
    #[arg(long, default_value = "0", env = "PDSTACK_MAX_EVENTS")]
    pub max_events: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "PDSTACK_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
