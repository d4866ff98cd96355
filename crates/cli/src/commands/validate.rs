//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{OutputKind, StackBlueprint};
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    decoder_count: usize,
    instance_count: usize,
    output_count: usize,
    stack_links: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(summarize(&blueprint)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(blueprint: &StackBlueprint) -> ConfigSummary {
    ConfigSummary {
        version: format!("{:?}", blueprint.version),
        decoder_count: blueprint.decoders.len(),
        instance_count: blueprint.instances.len(),
        output_count: blueprint.instances.iter().map(|i| i.outputs.len()).sum(),
        stack_links: blueprint.instances.iter().map(|i| i.stack.len()).sum(),
        sink_count: blueprint.sinks.len(),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &StackBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - converted output will be dropped".to_string());
    }

    for instance in &blueprint.instances {
        if instance.outputs.is_empty() {
            warnings.push(format!(
                "Instance '{}' declares no outputs",
                instance.id
            ));
        }

        // Only passthrough and packet output reaches stacked decoders
        let feeds_stack = instance
            .outputs
            .iter()
            .any(|o| matches!(o.kind, OutputKind::Passthrough | OutputKind::Packet));
        if !instance.stack.is_empty() && !instance.outputs.is_empty() && !feeds_stack {
            warnings.push(format!(
                "Instance '{}' has stacked decoders but no passthrough or packet output",
                instance.id
            ));
        }
    }

    // Sinks nobody produces for
    let produced: HashSet<(u32, OutputKind)> = blueprint
        .instances
        .iter()
        .flat_map(|i| i.outputs.iter().map(move |o| (i.session, o.kind)))
        .collect();
    for sink in &blueprint.sinks {
        if !produced.contains(&(sink.session, sink.kind)) {
            warnings.push(format!(
                "Sink '{}' ({} on session {}) has no declared producer",
                sink.name, sink.kind, sink.session
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Decoders: {}", summary.decoder_count);
            println!("  Instances: {}", summary.instance_count);
            println!("  Declared outputs: {}", summary.output_count);
            println!("  Stack links: {}", summary.stack_links);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
