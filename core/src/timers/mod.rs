//! Timer system
//!
//! Delayed trigger firings and collection-window closes are scheduled here,
//! keyed by log time. Nothing reads the wall clock, so replays are
//! deterministic.

pub(crate) mod log_time;
mod queue;

pub use queue::{TimerKey, TimerQueue};
