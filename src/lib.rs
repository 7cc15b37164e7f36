//! Externis - compilation timeline tracker
//!
//! This library turns the callbacks a compiler plugin receives (file
//! entered/left, function parsed, optimization pass started) into a
//! timeline of nested intervals and writes it as a Chrome-compatible trace.
//!
//! The entry point is [`context::TrackingContext`], created once per
//! compilation and consumed by `finalize`.

pub mod category;
pub mod cli;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod event_log;
pub mod json_output;
pub mod pass_tracker;
pub mod path_normalizer;
pub mod path_resolver;
pub mod preprocess;
pub mod scope_tracker;
pub mod span;
pub mod trace_buffer;
