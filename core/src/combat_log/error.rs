//! Error types for recorded event log parsing

use std::path::PathBuf;
use thiserror::Error;

/// Errors during recorded log line parsing
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid line format at line {line_number}: expected `time|Type|key=value...`")]
    InvalidLineFormat { line_number: u64 },

    #[error("invalid timestamp at line {line_number}: {segment}")]
    InvalidTimestamp { line_number: u64, segment: String },

    #[error("unknown event type at line {line_number}: {name}")]
    UnknownEventType { line_number: u64, name: String },

    #[error("invalid field at line {line_number}: {segment}")]
    InvalidField { line_number: u64, segment: String },
}

/// Errors during recorded log file reading
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("failed to read log file {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log file {path} has no session header (`# session: YYYY-MM-DD HH:MM:SS`)")]
    MissingSessionHeader { path: PathBuf },
}
