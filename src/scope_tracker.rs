//! Function parse intervals and the namespace/struct scopes around them
//!
//! The compiler only tells us when a function has finished parsing. Its
//! interval therefore runs from the previous boundary (last function or
//! last preprocessing step) to now. Consecutive functions in the same
//! namespace or struct are coalesced into one enclosing scope interval.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::category::EventCategory;
use crate::span::{TimeSpan, TimeStamp, FUNCTION_GAP_NS, SCOPE_PAD_NS};
use crate::trace_buffer::{TraceBuffer, TraceEvent};

/// Kind of construct that lexically contains a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScopeKind {
    Namespace,
    Struct,
    Union,
    Other(String),
}

impl From<&str> for ScopeKind {
    fn from(kind: &str) -> Self {
        match kind {
            "namespace" => ScopeKind::Namespace,
            "struct" | "class" | "record" => ScopeKind::Struct,
            "union" => ScopeKind::Union,
            other => ScopeKind::Other(other.to_string()),
        }
    }
}

impl From<String> for ScopeKind {
    fn from(kind: String) -> Self {
        ScopeKind::from(kind.as_str())
    }
}

impl From<ScopeKind> for String {
    fn from(kind: ScopeKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Namespace => f.write_str("namespace"),
            ScopeKind::Struct => f.write_str("struct"),
            ScopeKind::Union => f.write_str("union"),
            ScopeKind::Other(other) => f.write_str(other),
        }
    }
}

impl ScopeKind {
    /// Trace category for this kind, warning on anything unexpected
    pub fn category(&self) -> EventCategory {
        match self {
            ScopeKind::Namespace => EventCategory::Namespace,
            ScopeKind::Struct | ScopeKind::Union => EventCategory::Struct,
            ScopeKind::Other(other) => {
                warn!(kind = %other, "unknown enclosing scope kind");
                EventCategory::Unknown
            }
        }
    }
}

/// The namespace or struct a finished function was declared in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnclosingScope {
    pub name: String,
    pub kind: ScopeKind,
}

impl EnclosingScope {
    pub fn new(name: impl Into<String>, kind: ScopeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRecord {
    pub name: String,
    pub category: EventCategory,
    pub span: TimeSpan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    pub name: String,
    pub file: String,
    pub span: TimeSpan,
}

/// Scope accumulator
///
/// `Open` holds the scope of the previously finished function. A function
/// that had no scope moves the machine back to `Closed`, so two functions
/// of the same namespace separated by a free function are not merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScopeState {
    #[default]
    Closed,
    Open(ScopeRecord),
}

#[derive(Debug, Default)]
pub struct ScopeTracker {
    /// Last boundary a function interval may start after
    cursor: TimeStamp,
    state: ScopeState,
    scopes: Vec<ScopeRecord>,
    functions: Vec<FunctionRecord>,
}

impl ScopeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the shared cursor, e.g. after a file finished preprocessing
    pub fn set_cursor(&mut self, ts: TimeStamp) {
        self.cursor = ts;
    }

    pub fn state(&self) -> &ScopeState {
        &self.state
    }

    /// Record a function that just finished parsing at `now`
    pub fn finish_function(
        &mut self,
        name: &str,
        file: &str,
        scope: Option<&EnclosingScope>,
        now: TimeStamp,
    ) -> TimeSpan {
        let span = TimeSpan::after(self.cursor, FUNCTION_GAP_NS, now);
        self.cursor = span.end;
        self.functions.push(FunctionRecord {
            name: name.to_string(),
            file: file.to_string(),
            span,
        });
        trace!(function = %name, start = span.start, end = span.end, "function parsed");

        self.state = match (std::mem::take(&mut self.state), scope) {
            (ScopeState::Open(mut open), Some(scope)) if open.name == scope.name => {
                open.span.extend_past(span.end, SCOPE_PAD_NS);
                ScopeState::Open(open)
            }
            (previous, Some(scope)) => {
                self.close(previous);
                ScopeState::Open(ScopeRecord {
                    name: scope.name.clone(),
                    category: scope.kind.category(),
                    span: span.padded(SCOPE_PAD_NS),
                })
            }
            (previous, None) => {
                self.close(previous);
                ScopeState::Closed
            }
        };
        span
    }

    fn close(&mut self, state: ScopeState) {
        if let ScopeState::Open(record) = state {
            self.scopes.push(record);
        }
    }

    /// Close the open scope, if any
    pub fn flush(&mut self) {
        let state = std::mem::take(&mut self.state);
        self.close(state);
    }

    pub fn scopes(&self) -> &[ScopeRecord] {
        &self.scopes
    }

    pub fn functions(&self) -> &[FunctionRecord] {
        &self.functions
    }

    /// Push one event per closed scope; call [`flush`](Self::flush) first
    pub fn emit_scopes(&self, buffer: &mut TraceBuffer) {
        buffer.extend(
            self.scopes
                .iter()
                .map(|scope| TraceEvent::new(scope.name.clone(), scope.category, scope.span)),
        );
    }

    /// Push one FUNCTION event per finished function
    ///
    /// `display` maps the compiler's file name to the name shown in the trace.
    pub fn emit_functions<F>(&self, display: F, buffer: &mut TraceBuffer)
    where
        F: Fn(&str) -> String,
    {
        buffer.extend(self.functions.iter().map(|function| {
            TraceEvent::new(function.name.clone(), EventCategory::Function, function.span)
                .with_arg("file", display(&function.file))
        }));
    }
}
