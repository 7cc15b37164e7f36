//! Real-path resolution for files and include directories

use std::io;
use std::path::Path;

/// Turns a path as spelled by the compiler into a real absolute path
pub trait PathResolver {
    fn real_path(&self, path: &str) -> io::Result<String>;
}

/// Resolves through the filesystem (symlinks, `..`, relative paths)
#[derive(Debug, Default, Clone, Copy)]
pub struct FsPathResolver;

impl PathResolver for FsPathResolver {
    fn real_path(&self, path: &str) -> io::Result<String> {
        if path.is_empty() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "empty path"));
        }
        let real = std::fs::canonicalize(Path::new(path))?;
        Ok(real.to_string_lossy().into_owned())
    }
}

/// Treats every non-empty path as already real
///
/// Used when replaying event logs recorded on another machine, where the
/// paths no longer exist.
#[derive(Debug, Default, Clone, Copy)]
pub struct VerbatimPathResolver;

impl PathResolver for VerbatimPathResolver {
    fn real_path(&self, path: &str) -> io::Result<String> {
        if path.is_empty() {
            Err(io::Error::new(io::ErrorKind::NotFound, "empty path"))
        } else {
            Ok(path.to_string())
        }
    }
}
