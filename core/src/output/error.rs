//! Error types for output resolution

use thiserror::Error;

/// Errors while resolving a display string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    #[error("no output string named '{key}'")]
    MissingKey { key: String },

    #[error("output string '{key}' has no value for placeholder '${{{token}}}'")]
    UnresolvedPlaceholder { key: String, token: String },

    #[error("unterminated placeholder in output string '{key}'")]
    UnterminatedPlaceholder { key: String },
}
