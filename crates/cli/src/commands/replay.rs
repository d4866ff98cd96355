//! `replay` command implementation.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use tracing::info;

use crate::cli::ReplayArgs;
use crate::replay::{build_dispatcher, ReplayReport, Replayer};

/// Execute the `replay` command
pub fn run_replay(args: &ReplayArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        decoders = blueprint.decoders.len(),
        instances = blueprint.instances.len(),
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)
            .context("Failed to start metrics endpoint")?;
    }

    let dispatcher = build_dispatcher(blueprint).context("Failed to build dispatcher")?;

    let events = File::open(&args.events)
        .with_context(|| format!("Failed to open events file {}", args.events.display()))?;

    let max_events = (args.max_events != 0).then_some(args.max_events);
    let mut replayer = Replayer::new(dispatcher, max_events);

    let started = Instant::now();
    replayer
        .run(BufReader::new(events))
        .with_context(|| format!("Failed to read {}", args.events.display()))?;
    let report = replayer.finish();

    info!(
        events = report.summary.total_events,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Replay finished"
    );
    print_report(&report);

    Ok(())
}

fn print_report(report: &ReplayReport) {
    print!("\n{}", report.summary);

    let d = &report.dispatch;
    println!("=== Dispatch ===");
    println!("Accepted puts: {}", d.events_put);
    println!("Rejected puts: {}", d.events_rejected);
    println!("Delivered to sinks: {}", d.events_delivered);
    println!("Conversion failures: {}", d.conversion_failures);
    println!(
        "Forwarded: {} ({} failed)",
        d.forwarded, d.forward_failures
    );
    println!("Sink failures: {}", d.sink_failures);
}
