//! Sequential optimization-pass intervals
//!
//! Passes never nest: entering a pass ends the one before it. The pass that
//! is still running when tracking finishes never completed and is not
//! reported.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::category::EventCategory;
use crate::span::{TimeSpan, TimeStamp, PASS_GAP_NS};
use crate::trace_buffer::{TraceBuffer, TraceEvent};

/// Intermediate representation a pass operates on
///
/// Accepts both the short names (`gimple`) and the compiler's enum
/// spellings (`GIMPLE_PASS`), in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PassType {
    Gimple,
    Rtl,
    SimpleIpa,
    Ipa,
    Other,
}

impl PassType {
    pub fn category(self) -> EventCategory {
        match self {
            PassType::Gimple => EventCategory::GimplePass,
            PassType::Rtl => EventCategory::RtlPass,
            PassType::SimpleIpa => EventCategory::SimpleIpaPass,
            PassType::Ipa => EventCategory::IpaPass,
            PassType::Other => EventCategory::Unknown,
        }
    }
}

impl FromStr for PassType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "gimple" | "gimple_pass" => PassType::Gimple,
            "rtl" | "rtl_pass" => PassType::Rtl,
            "simple_ipa" | "simple_ipa_pass" => PassType::SimpleIpa,
            "ipa" | "ipa_pass" => PassType::Ipa,
            other => {
                warn!(pass_type = %other, "unknown pass type");
                PassType::Other
            }
        })
    }
}

impl From<String> for PassType {
    fn from(pass_type: String) -> Self {
        match pass_type.parse() {
            Ok(parsed) => parsed,
            Err(never) => match never {},
        }
    }
}

impl From<PassType> for String {
    fn from(pass_type: PassType) -> Self {
        pass_type.to_string()
    }
}

impl fmt::Display for PassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PassType::Gimple => "gimple",
            PassType::Rtl => "rtl",
            PassType::SimpleIpa => "simple_ipa",
            PassType::Ipa => "ipa",
            PassType::Other => "other",
        })
    }
}

/// Identity of one optimization pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassIdentity {
    pub name: String,
    pub static_pass_number: i32,
    pub pass_type: PassType,
}

impl PassIdentity {
    pub fn new(name: impl Into<String>, static_pass_number: i32, pass_type: PassType) -> Self {
        Self {
            name: name.into(),
            static_pass_number,
            pass_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassRecord {
    pub pass: PassIdentity,
    pub span: TimeSpan,
}

#[derive(Debug, Default)]
pub struct PassTracker {
    current: Option<PassRecord>,
    completed: Vec<PassRecord>,
}

impl PassTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the running pass at `now` and open `pass` just after it
    pub fn enter_pass(&mut self, pass: PassIdentity, now: TimeStamp) {
        if let Some(mut previous) = self.current.take() {
            previous.span.close_at(now);
            trace!(pass = %previous.pass.name, start = previous.span.start, end = previous.span.end, "pass finished");
            self.completed.push(previous);
        }
        // The previous end may have been clamped past `now`
        let boundary = match self.completed.last() {
            Some(last) => last.span.end.max(now),
            None => now,
        };
        self.current = Some(PassRecord {
            pass,
            span: TimeSpan::opening_after(boundary, PASS_GAP_NS),
        });
    }

    pub fn current(&self) -> Option<&PassIdentity> {
        self.current.as_ref().map(|record| &record.pass)
    }

    /// Whether a pass is still running and will be dropped at finalization
    pub fn has_open_pass(&self) -> bool {
        self.current.is_some()
    }

    /// Push one event per completed pass
    pub fn emit(&self, buffer: &mut TraceBuffer) {
        buffer.extend(self.completed.iter().map(|record| {
            TraceEvent::new(record.pass.name.clone(), record.pass.pass_type.category(), record.span)
                .with_arg("static_pass_number", record.pass.static_pass_number.to_string())
        }));
    }
}
