//! Replay timing
//!
//! Maps recorded log time onto wall time so a recording can be watched at
//! its original pace (or faster).

pub mod clock;

pub use clock::VirtualClock;
