//! CLI argument parsing for externis

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Output format for the finished trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TraceFormat {
    /// Chrome Trace Event Format (default; opens in chrome://tracing and Perfetto)
    #[default]
    Chrome,
    /// One JSON object per event per line, timestamps in nanoseconds
    Jsonl,
}

#[derive(Parser, Debug)]
#[command(name = "externis")]
#[command(version)]
#[command(about = "Replay compiler instrumentation events into a compilation time trace", long_about = None)]
pub struct Cli {
    /// Event log to replay (JSON lines); `-` reads standard input
    #[arg(value_name = "EVENTS")]
    pub events: PathBuf,

    /// Write the trace to FILE; a run of XXXXXX is replaced by a unique suffix
    #[arg(long = "trace", value_name = "FILE")]
    pub trace: Option<PathBuf>,

    /// Write the trace to DIR/trace_XXXXXX.json (DIR must be absolute)
    #[arg(long = "trace-dir", value_name = "DIR", conflicts_with = "trace")]
    pub trace_dir: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "chrome")]
    pub format: TraceFormat,

    /// Resolve include directories through the filesystem instead of trusting recorded paths
    #[arg(long = "canonicalize")]
    pub canonicalize: bool,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
