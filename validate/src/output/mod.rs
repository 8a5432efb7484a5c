//! Output formatting for replay results
//!
//! Provides colored CLI output and the end-of-run summary.

pub mod cli;

pub use cli::{CliOutput, OutputLevel};
