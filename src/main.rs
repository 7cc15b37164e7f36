use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use externis::{
    cli::Cli,
    clock::ManualClock,
    config::OutputConfig,
    context::TrackingContext,
    event_log,
    path_resolver::{FsPathResolver, VerbatimPathResolver},
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; warnings always reach stderr
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_events(path: &Path) -> Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path)
        .with_context(|| format!("Failed to open event log {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let entries = event_log::parse_event_log(open_events(&args.events)?)
        .with_context(|| format!("Failed to read event log {}", args.events.display()))?;

    // A log that would fail mid-replay must not leave an empty trace behind
    event_log::check_balance(&entries)?;

    // The sink is opened before any event is tracked
    let output = OutputConfig::from_cli(&args)?;
    let sink = output.open().context("Failed to open trace output")?;
    if let Some(path) = &sink.path {
        eprintln!("[externis: writing trace to {}]", path.display());
    }

    let clock = ManualClock::new();
    let ctx = TrackingContext::with_clock(clock.clone(), sink.writer, output.format);
    let mut ctx = if args.canonicalize {
        ctx.with_resolver(FsPathResolver)
    } else {
        ctx.with_resolver(VerbatimPathResolver)
    };

    event_log::replay(&mut ctx, &clock, &entries)?;
    let report = ctx.finalize().context("Failed to write trace")?;

    tracing::info!(
        events = report.buffer.len(),
        dropped_pass = ?report.dropped_pass,
        "trace complete"
    );
    Ok(())
}
