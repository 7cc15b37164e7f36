//! Nested file-inclusion intervals
//!
//! The compiler reports "entered file X" and "left the current file" as it
//! preprocesses. This tracker turns that stream into one interval per file,
//! surviving circular includes and missing `leave` notifications.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::category::EventCategory;
use crate::clock::Clock;
use crate::path_normalizer::PathNormalizer;
use crate::path_resolver::PathResolver;
use crate::span::{TimeSpan, TimeStamp};
use crate::trace_buffer::{TraceBuffer, TraceEvent};

/// Pseudo-file the compiler enters for command-line macro definitions
const COMMAND_LINE_PSEUDO_FILE: &str = "<command-line>";

/// Whether entering `file_path` is skipped and never reaches the stack
pub fn is_pseudo_file(file_path: &str) -> bool {
    file_path.is_empty() || file_path == COMMAND_LINE_PSEUDO_FILE
}

/// One entry on the inclusion stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackFrame {
    Real(String),
    /// Re-entry of a file that is still open further down the stack
    Circular,
}

#[derive(Debug, Clone, Copy)]
struct FileInterval {
    start: TimeStamp,
    end: Option<TimeStamp>,
}

/// Outcome of [`PreprocessTracker::enter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterOutcome {
    Pushed,
    Circular,
    Ignored,
}

#[derive(Debug, Default)]
pub struct PreprocessTracker {
    stack: Vec<StackFrame>,
    /// Files in first-entered order
    files: Vec<(String, FileInterval)>,
    index: HashMap<String, usize>,
    /// Compiler spelling -> resolved real path
    aliases: HashMap<String, String>,
}

impl PreprocessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start preprocessing `file_path`
    ///
    /// `include_dir` is the directory the file was found through. When it is
    /// known, both paths are resolved and handed to the normalizer; failures
    /// are logged and the file keeps its spelled name.
    pub fn enter(
        &mut self,
        file_path: &str,
        include_dir: Option<&str>,
        now: TimeStamp,
        normalizer: &mut PathNormalizer,
        resolver: &dyn PathResolver,
    ) -> EnterOutcome {
        if is_pseudo_file(file_path) {
            return EnterOutcome::Ignored;
        }

        let still_open = self
            .index
            .get(file_path)
            .is_some_and(|&i| self.files[i].1.end.is_none());
        if still_open {
            debug!(file = %file_path, depth = self.stack.len(), "circular include");
            self.stack.push(StackFrame::Circular);
            return EnterOutcome::Circular;
        }

        if !self.index.contains_key(file_path) {
            self.index.insert(file_path.to_string(), self.files.len());
            self.files
                .push((file_path.to_string(), FileInterval { start: now, end: None }));
        }
        self.stack.push(StackFrame::Real(file_path.to_string()));
        trace!(file = %file_path, depth = self.stack.len(), "enter file");

        if let Some(dir) = include_dir {
            self.register_include_location(file_path, dir, normalizer, resolver);
        }
        EnterOutcome::Pushed
    }

    fn register_include_location(
        &mut self,
        file_path: &str,
        dir: &str,
        normalizer: &mut PathNormalizer,
        resolver: &dyn PathResolver,
    ) {
        match (resolver.real_path(dir), resolver.real_path(file_path)) {
            (Ok(real_dir), Ok(real_file)) => {
                normalizer.register(&real_file, &real_dir);
                self.aliases
                    .entry(file_path.to_string())
                    .or_insert(real_file);
            }
            (Err(err), _) if !dir.is_empty() => {
                warn!(dir = %dir, error = %err, "couldn't resolve include directory");
            }
            (_, Err(err)) if !dir.is_empty() => {
                warn!(file = %file_path, error = %err, "couldn't resolve file path");
            }
            _ => {}
        }
    }

    /// Finish preprocessing the file on top of the stack
    ///
    /// # Panics
    ///
    /// Panics if no file is open: the caller broke the enter/leave nesting.
    pub fn leave(&mut self, now: TimeStamp) {
        let frame = match self.stack.pop() {
            Some(frame) => frame,
            None => panic!("leave_file called with no file being preprocessed"),
        };
        if let StackFrame::Real(path) = frame {
            if let Some(&i) = self.index.get(&path) {
                let interval = &mut self.files[i].1;
                if interval.end.is_none() {
                    interval.end = Some(now.max(interval.start));
                }
            }
            trace!(file = %path, depth = self.stack.len(), "leave file");
        }
    }

    /// Leave every open file, reading the clock before each leave
    ///
    /// Returns the clock reading taken after the last leave, or `None` when
    /// nothing was open.
    pub fn drain(&mut self, clock: &dyn Clock) -> Option<TimeStamp> {
        let mut last = None;
        while !self.stack.is_empty() {
            self.leave(clock.now());
            last = Some(clock.now());
        }
        last
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn top(&self) -> Option<&StackFrame> {
        self.stack.last()
    }

    /// Number of distinct real files seen so far
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Display name for a file as the compiler spelled it
    pub fn display_name<'a>(&'a self, normalizer: &'a PathNormalizer, file: &'a str) -> &'a str {
        let real = self.aliases.get(file).map(String::as_str).unwrap_or(file);
        normalizer.resolve(real)
    }

    /// Push one PREPROCESS event per real file, in first-entered order
    pub fn emit(&self, normalizer: &PathNormalizer, buffer: &mut TraceBuffer) {
        for (path, interval) in &self.files {
            let end = interval.end.unwrap_or(interval.start);
            buffer.push(TraceEvent::new(
                self.display_name(normalizer, path),
                EventCategory::Preprocess,
                TimeSpan::new(interval.start, end),
            ));
        }
    }
}
