//! Error types for trigger-set file loading

use std::path::PathBuf;
use thiserror::Error;

use crate::triggers::TriggerError;

/// Errors during trigger-set file loading
#[derive(Debug, Error)]
pub enum DslError {
    #[error("failed to read {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML in {path}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("trigger '{trigger}': {reason}")]
    InvalidTrigger { trigger: String, reason: String },

    #[error(transparent)]
    Trigger(#[from] TriggerError),
}
