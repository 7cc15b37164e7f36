//! Recorded instrumentation events and their replay
//!
//! An event log is a JSON-lines file with one instrumentation callback per
//! line, each stamped with the nanosecond it happened at:
//!
//! ```text
//! {"at_ns":0,"event":"enter_file","path":"/src/main.cc","include_dir":"/src"}
//! {"at_ns":1200,"event":"finish_function","name":"main","file":"/src/main.cc"}
//! {"at_ns":1500,"event":"enter_pass","name":"ssa","static_pass_number":4,"pass_type":"gimple"}
//! {"at_ns":1900,"event":"leave_file"}
//! ```
//!
//! Replaying drives a [`ManualClock`] from the stamps, so the same log
//! always produces the same trace.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::clock::{Clock, ManualClock};
use crate::context::TrackingContext;
use crate::error::{Result, TraceError};
use crate::pass_tracker::{PassIdentity, PassType};
use crate::preprocess::is_pseudo_file;
use crate::scope_tracker::EnclosingScope;
use crate::span::TimeStamp;

/// One instrumentation callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InputEvent {
    EnterFile {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        include_dir: Option<String>,
    },
    LeaveFile,
    EnterPass {
        name: String,
        static_pass_number: i32,
        pass_type: PassType,
    },
    FinishFunction {
        name: String,
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<EnclosingScope>,
    },
    DrainOpenFiles,
}

/// An event and when it happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub at_ns: TimeStamp,
    #[serde(flatten)]
    pub event: InputEvent,
}

/// A parsed entry together with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedEntry {
    pub line: usize,
    pub entry: LogEntry,
}

/// Parse a JSON-lines event log, skipping blank lines and `#` comments
pub fn parse_event_log<R: BufRead>(reader: R) -> Result<Vec<NumberedEntry>> {
    let mut entries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let entry = serde_json::from_str(text).map_err(|source| TraceError::EventLog {
            line: index + 1,
            source,
        })?;
        entries.push(NumberedEntry {
            line: index + 1,
            entry,
        });
    }
    debug!(entries = entries.len(), "parsed event log");
    Ok(entries)
}

/// Check that no `leave_file` in `entries` pops an empty inclusion stack
///
/// Lets a caller reject a bad log before it opens any output.
pub fn check_balance(entries: &[NumberedEntry]) -> Result<()> {
    let mut depth = 0usize;
    for NumberedEntry { line, entry } in entries {
        match &entry.event {
            InputEvent::EnterFile { path, .. } if !is_pseudo_file(path) => depth += 1,
            InputEvent::LeaveFile => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(TraceError::UnbalancedLeave { line: *line })?;
            }
            InputEvent::DrainOpenFiles => depth = 0,
            _ => {}
        }
    }
    Ok(())
}

/// Feed `entries` into `ctx`, moving `clock` to each entry's timestamp
///
/// A `leave_file` with nothing open is reported as an error instead of
/// reaching the tracker.
pub fn replay<W: Write>(
    ctx: &mut TrackingContext<W, ManualClock>,
    clock: &ManualClock,
    entries: &[NumberedEntry],
) -> Result<()> {
    for NumberedEntry { line, entry } in entries {
        if !clock.set(entry.at_ns) {
            warn!(
                line,
                at_ns = entry.at_ns,
                clock = clock.now(),
                "event log goes back in time; keeping clock"
            );
        }
        trace!(line, at_ns = entry.at_ns, event = ?entry.event, "replay");
        match &entry.event {
            InputEvent::EnterFile { path, include_dir } => {
                ctx.enter_file(path, include_dir.as_deref());
            }
            InputEvent::LeaveFile => {
                if ctx.open_files() == 0 {
                    return Err(TraceError::UnbalancedLeave { line: *line });
                }
                ctx.leave_file();
            }
            InputEvent::EnterPass {
                name,
                static_pass_number,
                pass_type,
            } => {
                ctx.enter_pass(PassIdentity::new(name.clone(), *static_pass_number, *pass_type));
            }
            InputEvent::FinishFunction { name, file, scope } => {
                ctx.finish_function(name, file, scope.as_ref());
            }
            InputEvent::DrainOpenFiles => ctx.drain_open_files(),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::EventCategory;
    use crate::cli::TraceFormat;
    use crate::path_resolver::VerbatimPathResolver;
    use crate::scope_tracker::ScopeKind;

    const LOG: &str = r#"
# recorded from a small translation unit
{"at_ns":0,"event":"enter_file","path":"/src/main.cc","include_dir":"/src"}
{"at_ns":100,"event":"enter_file","path":"/usr/include/stdio.h","include_dir":"/usr/include"}
{"at_ns":400,"event":"leave_file"}
{"at_ns":900,"event":"finish_function","name":"util::f","file":"/src/main.cc","scope":{"name":"util","kind":"namespace"}}
{"at_ns":1000,"event":"drain_open_files"}
{"at_ns":1200,"event":"enter_pass","name":"ssa","static_pass_number":4,"pass_type":"gimple"}
{"at_ns":1300,"event":"enter_pass","name":"expand","static_pass_number":90,"pass_type":"rtl"}
"#;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let entries = parse_event_log(LOG.as_bytes()).unwrap();
        assert_eq!(entries.len(), 7);
        assert_eq!(entries[0].line, 3);
        assert_eq!(entries[2].entry.event, InputEvent::LeaveFile);
        match &entries[3].entry.event {
            InputEvent::FinishFunction { scope, .. } => {
                let scope = scope.as_ref().unwrap();
                assert_eq!(scope.kind, ScopeKind::Namespace);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_names_line() {
        let log = "{\"at_ns\":0,\"event\":\"leave_file\"}\n{\"event\":\"teleport\"}\n";
        match parse_event_log(log.as_bytes()) {
            Err(TraceError::EventLog { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected EventLog error, got {:?}", other),
        }
    }

    #[test]
    fn test_replay_produces_all_categories() {
        let entries = parse_event_log(LOG.as_bytes()).unwrap();
        let clock = ManualClock::new();
        let mut out = Vec::new();
        let mut ctx = TrackingContext::with_clock(clock.clone(), &mut out, TraceFormat::Jsonl)
            .with_resolver(VerbatimPathResolver);
        replay(&mut ctx, &clock, &entries).unwrap();
        let report = ctx.finalize().unwrap();

        assert_eq!(report.count(EventCategory::Preprocess), 2);
        assert_eq!(report.count(EventCategory::GimplePass), 1);
        assert_eq!(report.count(EventCategory::RtlPass), 0);
        assert_eq!(report.count(EventCategory::Namespace), 1);
        assert_eq!(report.count(EventCategory::Function), 1);
        assert_eq!(report.dropped_pass.as_deref(), Some("expand"));

        let names: Vec<_> = report.buffer.events().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names[..2], ["main.cc", "stdio.h"]);
    }

    #[test]
    fn test_replay_rejects_unbalanced_leave() {
        let entries = parse_event_log("{\"at_ns\":3,\"event\":\"leave_file\"}".as_bytes()).unwrap();
        let clock = ManualClock::new();
        let mut ctx = TrackingContext::with_clock(clock.clone(), Vec::new(), TraceFormat::Chrome);
        match replay(&mut ctx, &clock, &entries) {
            Err(TraceError::UnbalancedLeave { line }) => assert_eq!(line, 1),
            other => panic!("expected UnbalancedLeave, got {:?}", other),
        }
    }

    fn replay_log(log: &str) -> Result<crate::context::FinalizeReport> {
        let entries = parse_event_log(log.as_bytes())?;
        let clock = ManualClock::new();
        let mut ctx = TrackingContext::with_clock(clock.clone(), Vec::new(), TraceFormat::Chrome)
            .with_resolver(VerbatimPathResolver);
        replay(&mut ctx, &clock, &entries)?;
        ctx.finalize()
    }

    #[test]
    fn test_replay_accepts_compiler_pass_type_spelling() {
        let report = replay_log(
            r#"
{"at_ns":10,"event":"enter_pass","name":"ssa","static_pass_number":4,"pass_type":"GIMPLE_PASS"}
{"at_ns":20,"event":"enter_pass","name":"expand","static_pass_number":90,"pass_type":"RTL_PASS"}
"#,
        )
        .unwrap();
        assert_eq!(report.count(EventCategory::GimplePass), 1);
        assert_eq!(report.count(EventCategory::Unknown), 0);
    }

    #[test]
    fn test_replay_at_end_of_timeline() {
        let report = replay_log(
            r#"
{"at_ns":0,"event":"enter_file","path":"main.c"}
{"at_ns":0,"event":"enter_file","path":"a.h"}
{"at_ns":18446744073709551615,"event":"leave_file"}
{"at_ns":18446744073709551615,"event":"finish_function","name":"f","file":"main.c","scope":{"name":"S","kind":"struct"}}
{"at_ns":18446744073709551615,"event":"finish_function","name":"g","file":"main.c","scope":{"name":"S","kind":"struct"}}
{"at_ns":18446744073709551615,"event":"enter_pass","name":"a","static_pass_number":1,"pass_type":"gimple"}
{"at_ns":18446744073709551615,"event":"enter_pass","name":"b","static_pass_number":2,"pass_type":"gimple"}
"#,
        )
        .unwrap();
        assert_eq!(report.count(EventCategory::Preprocess), 2);
        assert_eq!(report.count(EventCategory::Function), 2);
        assert_eq!(report.count(EventCategory::Struct), 1);
        assert_eq!(report.count(EventCategory::GimplePass), 1);
        assert!(report.buffer.events().iter().all(|e| e.span.start <= e.span.end));
    }

    #[test]
    fn test_replay_keeps_clock_on_rewind() {
        let report = replay_log(
            r#"
{"at_ns":500,"event":"enter_file","path":"main.c"}
{"at_ns":200,"event":"leave_file"}
"#,
        )
        .unwrap();
        assert_eq!(report.buffer.events()[0].span, crate::span::TimeSpan::new(500, 500));
    }

    #[test]
    fn test_check_balance() {
        let balanced = parse_event_log(
            r#"
{"event":"enter_file","path":"<command-line>"}
{"event":"enter_file","path":"main.c"}
{"event":"enter_file","path":"main.c"}
{"event":"leave_file"}
{"event":"leave_file"}
{"event":"enter_file","path":"b.c"}
{"event":"drain_open_files"}
"#
            .as_bytes(),
        )
        .unwrap();
        check_balance(&balanced).unwrap();
        check_balance(&parse_event_log(LOG.as_bytes()).unwrap()).unwrap();

        let unbalanced = parse_event_log(
            "{\"event\":\"enter_file\",\"path\":\"main.c\"}\n{\"event\":\"drain_open_files\"}\n{\"event\":\"leave_file\"}\n"
                .as_bytes(),
        )
        .unwrap();
        match check_balance(&unbalanced) {
            Err(TraceError::UnbalancedLeave { line }) => assert_eq!(line, 3),
            other => panic!("expected UnbalancedLeave, got {:?}", other),
        }
    }
}
