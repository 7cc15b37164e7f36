//! Trace events and the append-only buffer they are collected in

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::EventCategory;
use crate::span::TimeSpan;

/// Flat, ordered string-to-string metadata attached to an event
pub type EventArgs = BTreeMap<String, String>;

/// One timed, named, categorized interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub name: String,
    pub category: EventCategory,
    pub span: TimeSpan,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub args: Option<EventArgs>,
}

impl TraceEvent {
    pub fn new(name: impl Into<String>, category: EventCategory, span: TimeSpan) -> Self {
        Self {
            name: name.into(),
            category,
            span,
            args: None,
        }
    }

    /// Attach one argument, creating the mapping on first use
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args
            .get_or_insert_with(EventArgs::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Append-only sequence of finished events
///
/// Order is the order in which trackers pushed their events, not global
/// chronological order.
#[derive(Debug, Default)]
pub struct TraceBuffer {
    events: Vec<TraceEvent>,
}

impl TraceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of buffered events in `category`
    pub fn count(&self, category: EventCategory) -> usize {
        self.events
            .iter()
            .filter(|event| event.category == category)
            .count()
    }

    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }
}

impl Extend<TraceEvent> for TraceBuffer {
    fn extend<I: IntoIterator<Item = TraceEvent>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}
