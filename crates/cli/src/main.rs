//! # pdstack CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 解码栈配置加载与验证
//! - 事件回放 (JSON lines → put → sinks)

mod cli;
mod commands;
mod error;
mod replay;

use anyhow::Result;
use clap::Parser;
use observability::{LogFormat, ObservabilityConfig};
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_replay, run_validate};

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "pdstack starting");

    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args),
        Commands::Replay(args) => run_replay(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(observability_config(cli))
}

/// Map `-v/-q/--log-format` onto the observability config.
///
/// `-q` pins the level to `warn`, ignoring RUST_LOG.
fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    ObservabilityConfig {
        log_format: match cli.log_format {
            cli::LogFormat::Json => LogFormat::Json,
            cli::LogFormat::Pretty => LogFormat::Pretty,
            cli::LogFormat::Compact => LogFormat::Compact,
        },
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
        env_override: !cli.quiet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_verbosity_maps_to_level() {
        let config = observability_config(&parse(&["pdstack", "validate"]));
        assert_eq!(config.default_log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.env_override);

        let config = observability_config(&parse(&["pdstack", "-vv", "validate"]));
        assert_eq!(config.default_log_level, "trace");
    }

    #[test]
    fn test_quiet_pins_warn() {
        let config = observability_config(&parse(&[
            "pdstack",
            "-q",
            "--log-format",
            "json",
            "validate",
        ]));
        assert_eq!(config.default_log_level, "warn");
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.env_override);
        assert_eq!(config.metrics_port, None);
    }
}
