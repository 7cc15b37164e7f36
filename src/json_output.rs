//! Trace serialization
//!
//! Two JSON shapes are supported:
//! - `chrome`: the Trace Event Format understood by `chrome://tracing`,
//!   Perfetto and speedscope, with every record a complete (`"X"`) event
//! - `jsonl`: one self-describing object per line with raw nanoseconds

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::cli::TraceFormat;
use crate::error::Result;
use crate::span::TimeStamp;
use crate::trace_buffer::{EventArgs, TraceEvent};

/// A complete event in the Chrome Trace Event Format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromeEvent {
    pub name: String,
    pub cat: String,
    pub ph: String,
    /// Start in microseconds (fractional, nanosecond precision)
    pub ts: f64,
    /// Duration in microseconds
    pub dur: f64,
    pub pid: u32,
    pub tid: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub args: Option<EventArgs>,
}

/// Root object of a Chrome trace file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromeTrace {
    #[serde(rename = "traceEvents")]
    pub trace_events: Vec<ChromeEvent>,
    #[serde(rename = "displayTimeUnit")]
    pub display_time_unit: String,
}

/// One line of `jsonl` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonlEvent {
    pub name: String,
    pub category: String,
    pub start_ns: TimeStamp,
    pub end_ns: TimeStamp,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub args: Option<EventArgs>,
}

fn micros(ns: TimeStamp) -> f64 {
    ns as f64 / 1000.0
}

impl ChromeEvent {
    pub fn from_event(event: &TraceEvent, pid: u32) -> Self {
        Self {
            name: event.name.clone(),
            cat: event.category.to_string(),
            ph: "X".to_string(),
            ts: micros(event.span.start),
            dur: micros(event.span.duration()),
            pid,
            tid: 0,
            args: event.args.clone(),
        }
    }
}

impl ChromeTrace {
    pub fn new(events: &[TraceEvent], pid: u32) -> Self {
        Self {
            trace_events: events
                .iter()
                .map(|event| ChromeEvent::from_event(event, pid))
                .collect(),
            display_time_unit: "ns".to_string(),
        }
    }
}

impl From<&TraceEvent> for JsonlEvent {
    fn from(event: &TraceEvent) -> Self {
        Self {
            name: event.name.clone(),
            category: event.category.to_string(),
            start_ns: event.span.start,
            end_ns: event.span.end,
            args: event.args.clone(),
        }
    }
}

/// Serialize `events` to `writer` in `format` and flush it
pub fn write_trace<W: Write>(
    events: &[TraceEvent],
    format: TraceFormat,
    pid: u32,
    mut writer: W,
) -> Result<()> {
    match format {
        TraceFormat::Chrome => {
            serde_json::to_writer(&mut writer, &ChromeTrace::new(events, pid))?;
            writeln!(writer)?;
        }
        TraceFormat::Jsonl => {
            for event in events {
                serde_json::to_writer(&mut writer, &JsonlEvent::from(event))?;
                writeln!(writer)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}
