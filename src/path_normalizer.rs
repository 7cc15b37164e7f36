//! Short display names for source files
//!
//! A header at `/usr/include/c++/12/vector` reads better as `vector`. The
//! normalizer strips each file's include root to get that short name, and
//! falls back to the absolute path for every file whose short name turns
//! out to be ambiguous.

use std::collections::{HashMap, HashSet};

use tracing::{trace, warn};

/// What the normalizer knows about one registered file
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileRecord {
    include_root_dir: String,
    display_name: String,
}

/// Maps absolute file paths to unambiguous display names
#[derive(Debug, Default)]
pub struct PathNormalizer {
    records: HashMap<String, FileRecord>,
    /// Display name -> first absolute path that produced it
    claimed: HashMap<String, String>,
    conflicted: HashSet<String>,
}

fn is_separator(c: char) -> bool {
    c == '/' || c == std::path::MAIN_SEPARATOR
}

/// `file_path` relative to `root`, if `file_path` lies strictly below it
fn strip_include_root<'a>(file_path: &'a str, root: &str) -> Option<&'a str> {
    let root = root.trim_end_matches(is_separator);
    let rest = file_path.strip_prefix(root)?;
    let rest = rest.strip_prefix(is_separator)?;
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

impl PathNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `file_path` was found under `include_root_dir`
    ///
    /// The first registration of a path wins; later calls for the same
    /// path are ignored. A display name produced by two different paths is
    /// marked conflicted for good.
    pub fn register(&mut self, file_path: &str, include_root_dir: &str) {
        if self.records.contains_key(file_path) {
            return;
        }

        let display_name = match strip_include_root(file_path, include_root_dir) {
            Some(relative) => {
                let relative = relative.to_string();
                match self.claimed.get(&relative) {
                    Some(owner) if owner != file_path => {
                        let first_root = self
                            .records
                            .get(owner)
                            .map_or("", |record| record.include_root_dir.as_str());
                        trace!(
                            name = %relative,
                            first = %owner,
                            first_root = %first_root,
                            second = %file_path,
                            second_root = %include_root_dir,
                            "display name conflict"
                        );
                        self.conflicted.insert(relative.clone());
                    }
                    Some(_) => {}
                    None => {
                        self.claimed.insert(relative.clone(), file_path.to_string());
                    }
                }
                relative
            }
            None => {
                warn!(
                    file = %file_path,
                    dir = %include_root_dir,
                    "can't normalize path: file is not under its include directory"
                );
                file_path.to_string()
            }
        };

        self.records.insert(
            file_path.to_string(),
            FileRecord {
                include_root_dir: include_root_dir.to_string(),
                display_name,
            },
        );
    }

    /// Display name for `file_path`, or the path itself when unknown or ambiguous
    pub fn resolve<'a>(&'a self, file_path: &'a str) -> &'a str {
        match self.records.get(file_path) {
            Some(record) if !self.conflicted.contains(&record.display_name) => {
                &record.display_name
            }
            _ => file_path,
        }
    }

    pub fn is_conflicted(&self, display_name: &str) -> bool {
        self.conflicted.contains(display_name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
