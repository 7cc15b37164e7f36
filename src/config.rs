//! Output configuration
//!
//! The tracker itself only ever sees an open writer. This module turns the
//! `--trace` / `--trace-dir` options into that writer, exactly once, before
//! any event is tracked.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::{Cli, TraceFormat};
use crate::error::{Result, TraceError};

/// Placeholder replaced by a unique suffix when creating the trace file
pub const TEMPLATE_MARKER: &str = "XXXXXX";

/// File name used inside `--trace-dir`
pub const DEFAULT_TRACE_FILE: &str = "trace_XXXXXX.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// Where and how the finished trace is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub target: OutputTarget,
    pub format: TraceFormat,
}

/// An opened trace sink and the path it writes to, if any
pub struct OpenedSink {
    pub writer: Box<dyn Write>,
    pub path: Option<PathBuf>,
}

impl std::fmt::Debug for OpenedSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedSink").field("path", &self.path).finish()
    }
}

impl OutputConfig {
    /// Resolve the `--trace` and `--trace-dir` options
    pub fn new(
        trace: Option<PathBuf>,
        trace_dir: Option<PathBuf>,
        format: TraceFormat,
    ) -> Result<Self> {
        let target = match (trace, trace_dir) {
            (Some(_), Some(_)) => return Err(TraceError::OutputConflict),
            (Some(file), None) => OutputTarget::File(file),
            (None, Some(dir)) => {
                if !dir.is_absolute() {
                    return Err(TraceError::RelativeTraceDir(dir));
                }
                OutputTarget::File(dir.join(DEFAULT_TRACE_FILE))
            }
            (None, None) => OutputTarget::Stdout,
        };
        Ok(Self { target, format })
    }

    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Self::new(cli.trace.clone(), cli.trace_dir.clone(), cli.format)
    }

    /// Open the sink, expanding a `XXXXXX` template into a fresh file
    pub fn open(&self) -> Result<OpenedSink> {
        match &self.target {
            OutputTarget::Stdout => Ok(OpenedSink {
                writer: Box::new(io::stdout()),
                path: None,
            }),
            OutputTarget::File(path) => {
                let (file, path) = match split_template(path) {
                    Some((dir, prefix, suffix)) => create_from_template(path, &dir, &prefix, &suffix)?,
                    None => (File::create(path)?, path.clone()),
                };
                info!(path = %path.display(), "writing trace");
                Ok(OpenedSink {
                    writer: Box::new(BufWriter::new(file)),
                    path: Some(path),
                })
            }
        }
    }
}

/// Split `dir/prefixXXXXXXsuffix` into its parts; `None` without a marker
fn split_template(path: &Path) -> Option<(PathBuf, String, String)> {
    let name = path.file_name()?.to_str()?;
    let at = name.rfind(TEMPLATE_MARKER)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((
        dir,
        name[..at].to_string(),
        name[at + TEMPLATE_MARKER.len()..].to_string(),
    ))
}

fn create_from_template(
    template: &Path,
    dir: &Path,
    prefix: &str,
    suffix: &str,
) -> Result<(File, PathBuf)> {
    let temp = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .rand_bytes(TEMPLATE_MARKER.len())
        .tempfile_in(dir)
        .map_err(|source| TraceError::Template {
            path: template.to_path_buf(),
            source,
        })?;
    temp.keep().map_err(|err| TraceError::Template {
        path: template.to_path_buf(),
        source: err.error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_stdout() {
        let config = OutputConfig::new(None, None, TraceFormat::Chrome).unwrap();
        assert_eq!(config.target, OutputTarget::Stdout);
    }

    #[test]
    fn test_conflicting_targets_rejected() {
        let err = OutputConfig::new(
            Some(PathBuf::from("a.json")),
            Some(PathBuf::from("/tmp")),
            TraceFormat::Chrome,
        )
        .unwrap_err();
        assert!(matches!(err, TraceError::OutputConflict));
    }

    #[test]
    fn test_relative_trace_dir_rejected() {
        let err = OutputConfig::new(None, Some(PathBuf::from("traces")), TraceFormat::Chrome)
            .unwrap_err();
        assert!(matches!(err, TraceError::RelativeTraceDir(_)));
    }

    #[test]
    fn test_trace_dir_uses_default_template() {
        let config =
            OutputConfig::new(None, Some(PathBuf::from("/var/tmp")), TraceFormat::Chrome).unwrap();
        assert_eq!(
            config.target,
            OutputTarget::File(PathBuf::from("/var/tmp/trace_XXXXXX.json"))
        );
    }

    #[test]
    fn test_split_template() {
        let (dir, prefix, suffix) = split_template(Path::new("/out/trace_XXXXXX.json")).unwrap();
        assert_eq!(dir, PathBuf::from("/out"));
        assert_eq!(prefix, "trace_");
        assert_eq!(suffix, ".json");

        let (dir, _, _) = split_template(Path::new("XXXXXX.json")).unwrap();
        assert_eq!(dir, PathBuf::from("."));

        assert!(split_template(Path::new("/out/trace.json")).is_none());
    }

    #[test]
    fn test_template_creates_unique_files() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            OutputConfig::new(None, Some(dir.path().to_path_buf()), TraceFormat::Chrome).unwrap();

        let first = config.open().unwrap().path.unwrap();
        let second = config.open().unwrap().path.unwrap();
        assert_ne!(first, second);
        for path in [&first, &second] {
            let name = path.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with("trace_"));
            assert!(name.ends_with(".json"));
            assert!(!name.contains(TEMPLATE_MARKER));
            assert!(path.exists());
        }
    }

    #[test]
    fn test_plain_file_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");
        let config =
            OutputConfig::new(Some(path.clone()), None, TraceFormat::Jsonl).unwrap();
        let mut sink = config.open().unwrap();
        sink.writer.write_all(b"{}\n").unwrap();
        sink.writer.flush().unwrap();
        assert_eq!(sink.path, Some(path.clone()));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{}\n");
    }
}
