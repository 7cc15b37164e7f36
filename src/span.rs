//! Nanosecond time spans with tie-breaking rules
//!
//! Trace viewers key events on their timestamps and render badly when two
//! events start or end at exactly the same instant. Every tracker therefore
//! builds its spans through the constructors here, which nudge boundaries by
//! a few nanoseconds and clamp so that `start <= end` always holds.

use serde::{Deserialize, Serialize};

/// Nanoseconds since tracking started
pub type TimeStamp = u64;

/// Gap between the function cursor and the start of the next function
pub const FUNCTION_GAP_NS: TimeStamp = 3;

/// Padding added on both sides of a function when it opens or extends a scope
pub const SCOPE_PAD_NS: TimeStamp = 1;

/// Gap between the end of one pass and the start of the next
pub const PASS_GAP_NS: TimeStamp = 1;

/// Cursor bump applied when a file finishes preprocessing normally
pub const PREPROCESS_LEAVE_GAP_NS: TimeStamp = 3;

/// `ts` moved `gap` ns later, pinned at the end of the timeline
pub fn nudge(ts: TimeStamp, gap: TimeStamp) -> TimeStamp {
    ts.saturating_add(gap)
}

/// A closed interval `[start, end]` in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: TimeStamp,
    pub end: TimeStamp,
}

impl TimeSpan {
    /// Build a span, clamping `end` up to `start` if the clock went nowhere
    pub fn new(start: TimeStamp, end: TimeStamp) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Span that begins `gap` ns after `cursor` and ends at `now`
    ///
    /// Used for back-to-back intervals: the result never touches the
    /// previous boundary even when `now == cursor`.
    pub fn after(cursor: TimeStamp, gap: TimeStamp, now: TimeStamp) -> Self {
        Self::new(nudge(cursor, gap), now)
    }

    /// Zero-width span opening `gap` ns after `ts`
    pub fn opening_after(ts: TimeStamp, gap: TimeStamp) -> Self {
        let start = nudge(ts, gap);
        Self { start, end: start }
    }

    /// This span widened by `pad` ns on each side
    pub fn padded(self, pad: TimeStamp) -> Self {
        Self {
            start: self.start.saturating_sub(pad),
            end: nudge(self.end, pad),
        }
    }

    /// Move the end to `pad` ns past `end`, keeping `start <= end`
    pub fn extend_past(&mut self, end: TimeStamp, pad: TimeStamp) {
        self.end = nudge(end, pad).max(self.start);
    }

    /// Close an open span at `now`, keeping `start <= end`
    pub fn close_at(&mut self, now: TimeStamp) {
        self.end = now.max(self.start);
    }

    pub fn duration(&self) -> TimeStamp {
        self.end.saturating_sub(self.start)
    }
}
