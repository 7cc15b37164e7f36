//! The tracking context for one compilation
//!
//! [`TrackingContext`] owns every tracker, the clock and the output sink.
//! It is created when compilation starts, receives instrumentation events
//! in program order, and is consumed by [`TrackingContext::finalize`], which
//! writes the trace. Because `finalize` takes `self`, no event can be
//! delivered after the trace was written and the trace cannot be written
//! twice.

use std::io::Write;

use tracing::debug;

use crate::category::EventCategory;
use crate::cli::TraceFormat;
use crate::clock::{Clock, MonotonicClock};
use crate::error::Result;
use crate::json_output::write_trace;
use crate::pass_tracker::{PassIdentity, PassTracker};
use crate::path_normalizer::PathNormalizer;
use crate::path_resolver::{FsPathResolver, PathResolver};
use crate::preprocess::{EnterOutcome, PreprocessTracker};
use crate::scope_tracker::{EnclosingScope, ScopeTracker};
use crate::span::{nudge, TimeSpan, PREPROCESS_LEAVE_GAP_NS};
use crate::trace_buffer::TraceBuffer;

/// What finalization produced
#[derive(Debug)]
pub struct FinalizeReport {
    /// Every event that was written, in emission order
    pub buffer: TraceBuffer,
    /// Name of the pass that was still running and was not reported
    pub dropped_pass: Option<String>,
}

impl FinalizeReport {
    pub fn count(&self, category: EventCategory) -> usize {
        self.buffer.count(category)
    }
}

pub struct TrackingContext<W: Write, C: Clock = MonotonicClock> {
    clock: C,
    resolver: Box<dyn PathResolver>,
    normalizer: PathNormalizer,
    preprocess: PreprocessTracker,
    scopes: ScopeTracker,
    passes: PassTracker,
    sink: W,
    format: TraceFormat,
    pid: u32,
}

impl<W: Write> TrackingContext<W, MonotonicClock> {
    /// Start tracking now with the real monotonic clock
    pub fn start(sink: W, format: TraceFormat) -> Self {
        Self::with_clock(MonotonicClock::start(), sink, format)
    }
}

impl<W: Write, C: Clock> TrackingContext<W, C> {
    pub fn with_clock(clock: C, sink: W, format: TraceFormat) -> Self {
        Self {
            clock,
            resolver: Box::new(FsPathResolver),
            normalizer: PathNormalizer::new(),
            preprocess: PreprocessTracker::new(),
            scopes: ScopeTracker::new(),
            passes: PassTracker::new(),
            sink,
            format,
            pid: std::process::id(),
        }
    }

    /// Replace the filesystem-backed path resolver
    pub fn with_resolver(mut self, resolver: impl PathResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Process id recorded in Chrome output
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    /// The compiler started preprocessing `path`
    ///
    /// `include_dir` is the directory the file was found through, when known.
    pub fn enter_file(&mut self, path: &str, include_dir: Option<&str>) -> EnterOutcome {
        let now = self.clock.now();
        self.preprocess.enter(
            path,
            include_dir,
            now,
            &mut self.normalizer,
            self.resolver.as_ref(),
        )
    }

    /// The compiler finished the file on top of the inclusion stack
    ///
    /// # Panics
    ///
    /// Panics if no file is being preprocessed.
    pub fn leave_file(&mut self) {
        let now = self.clock.now();
        self.preprocess.leave(now);
        self.scopes.set_cursor(nudge(now, PREPROCESS_LEAVE_GAP_NS));
    }

    /// Close every file still open on the inclusion stack
    pub fn drain_open_files(&mut self) {
        if let Some(ts) = self.preprocess.drain(&self.clock) {
            self.scopes.set_cursor(ts);
        }
    }

    /// An optimization pass started; the previous one ended
    pub fn enter_pass(&mut self, pass: PassIdentity) {
        let now = self.clock.now();
        self.passes.enter_pass(pass, now);
    }

    /// A function body finished parsing
    pub fn finish_function(
        &mut self,
        name: &str,
        file: &str,
        scope: Option<&EnclosingScope>,
    ) -> TimeSpan {
        let now = self.clock.now();
        self.scopes.finish_function(name, file, scope, now)
    }

    /// Depth of the inclusion stack
    pub fn open_files(&self) -> usize {
        self.preprocess.depth()
    }

    pub fn normalizer(&self) -> &PathNormalizer {
        &self.normalizer
    }

    /// Close everything, write the trace and release the sink
    pub fn finalize(mut self) -> Result<FinalizeReport> {
        self.drain_open_files();
        self.scopes.flush();

        let mut buffer = TraceBuffer::new();
        self.preprocess.emit(&self.normalizer, &mut buffer);
        self.passes.emit(&mut buffer);
        self.scopes.emit_scopes(&mut buffer);
        let preprocess = &self.preprocess;
        let normalizer = &self.normalizer;
        self.scopes.emit_functions(
            |file| preprocess.display_name(normalizer, file).to_string(),
            &mut buffer,
        );

        let dropped_pass = self.passes.current().map(|pass| pass.name.clone());
        if let Some(name) = &dropped_pass {
            debug!(pass = %name, "dropping pass that never finished");
        }
        debug!(events = buffer.len(), format = ?self.format, "writing trace");

        write_trace(buffer.events(), self.format, self.pid, &mut self.sink)?;
        Ok(FinalizeReport {
            buffer,
            dropped_pass,
        })
    }
}
