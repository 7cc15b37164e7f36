//! Error types for trace output and event-log replay

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("--trace-dir may not be combined with --trace")]
    OutputConflict,

    #[error("--trace-dir must be absolute, got {}; to write relative to the source use --trace", .0.display())]
    RelativeTraceDir(PathBuf),

    #[error("Failed to create trace file from template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed event on line {line}: {source}")]
    EventLog {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("leave_file on line {line} with no file open")]
    UnbalancedLeave { line: usize },
}

pub type Result<T> = std::result::Result<T, TraceError>;
