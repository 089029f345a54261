mod cli;

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Result, anyhow};
use branchgen_rs::progress::ProgressTracker;
use branchgen_rs::{BigUint, Variant, VariantBatcher, VariantSummary};
use clap::Parser;
use cli::{Cli, Commands, OutputFormat, RunConfig};
use serde::Serialize;
use tracing::{debug, info};
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Returns the file writer's guard; logs still buffered are flushed when it drops.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Variants go to stdout; keep logs on stderr so output stays pipeable.
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| anyhow!("failed to create log directory {parent:?}: {err}"))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| anyhow!("failed to open log file {path:?}: {err}"))?;
        let (non_blocking_writer, guard) = non_blocking(file);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(non_blocking_writer);
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))?;
        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))?;
        Ok(None)
    }
}

fn log_invocation(log_file: Option<&Path>) {
    let argv: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = ?log_file,
        argv = ?argv,
        "branchgen invoked"
    );
}

fn run_count(config: &RunConfig) -> Result<()> {
    let summary = VariantSummary::new(config.option_count, &config.spec);
    info!(
        options = config.option_count,
        variants = %summary.variant_count,
        capped = summary.is_capped(),
        "computed variant count"
    );
    println!("{summary}");
    Ok(())
}

#[derive(Serialize)]
struct RankedVariant<'a> {
    rank: String,
    variant: &'a Variant,
}

fn run_list(config: &RunConfig) -> Result<()> {
    let summary = VariantSummary::new(config.option_count, &config.spec);
    info!(
        options = config.option_count,
        variants = %summary.variant_count,
        offset = %config.offset,
        limit = ?config.limit,
        "streaming variants"
    );

    let mut batcher = VariantBatcher::new(config.option_count, &config.spec, &config.offset);
    let mut tracker = ProgressTracker::new(config.offset.clone(), config.limit);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    loop {
        let allowance = tracker.allowance(config.batch_size);
        if allowance == 0 {
            break;
        }
        let Some(batch) = batcher.next_batch(allowance) else {
            break;
        };

        for (i, variant) in batch.iter().enumerate() {
            let rank = tracker.processed() + BigUint::from(i);
            match config.format {
                OutputFormat::Text => writeln!(out, "{rank}\t{variant}")?,
                OutputFormat::Json => {
                    let line = serde_json::to_string(&RankedVariant {
                        rank: rank.to_string(),
                        variant,
                    })?;
                    writeln!(out, "{line}")?;
                }
            }
        }

        let keep_going = tracker.record_batch(batch.len());
        debug!(next = %tracker.processed(), "batch written");
        if !keep_going {
            break;
        }
    }

    out.flush()?;
    info!(emitted = %tracker.processed_since_start(), "enumeration finished");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = cli.command.spec_args().log_file.clone();
    let _log_guard = init_tracing(log_file.as_deref())?;
    log_invocation(log_file.as_deref());

    match cli.command {
        Commands::Count(args) => run_count(&args.into_config()?),
        Commands::List(args) => run_list(&args.into_config()?),
    }
}
