//! Encounter engine
//!
//! Drives a compiled trigger set over log events and emits notifications and
//! mistakes.

mod emitted;
mod encounter;
mod guard;

#[cfg(test)]
mod engine_tests;

pub use emitted::{Emitted, Notification, ReportSink};
pub use encounter::EncounterEngine;
