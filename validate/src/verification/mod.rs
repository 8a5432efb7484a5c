//! Checkpoint verification
//!
//! Expected notifications and mistakes at pull-relative times, checked
//! against what the replay actually produced.

pub mod checkpoint;

pub use checkpoint::{CheckpointVerifier, Expectations};
