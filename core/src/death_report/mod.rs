//! Death reports
//!
//! Each tracked target keeps a bounded buffer of recent damage, heals,
//! effects and mistakes. A death freezes the buffer into an immutable
//! [`DeathReport`] attached to the `death` mistake.

mod report;
mod tracker;

pub use report::{DeathReport, TrackedEvent, TrackedEventKind};
pub use tracker::DeathTracker;
