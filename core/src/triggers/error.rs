//! Error types for trigger set registration

use thiserror::Error;

/// Errors that reject a trigger set at registration
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("trigger set has an empty id")]
    EmptySetId,

    #[error("duplicate trigger id '{id}' in set '{set}'")]
    DuplicateId { set: String, id: String },

    #[error("trigger '{trigger}': {event_type} has no field '{field}'")]
    UnknownField {
        trigger: String,
        event_type: &'static str,
        field: String,
    },

    #[error("trigger '{trigger}': invalid regex for field '{field}'")]
    InvalidRegex {
        trigger: String,
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("trigger '{trigger}': {lang} pattern is {found}, expected {expected}")]
    PatternTypeMismatch {
        trigger: String,
        lang: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("trigger '{trigger}' declares more than one output: {}", fields.join(", "))]
    ConflictingOutputs {
        trigger: String,
        fields: Vec<&'static str>,
    },

    #[error("mistake map '{map}' entry '{key}' has an empty id")]
    EmptyMistakeId { map: &'static str, key: String },

    #[error("duplicate option '{id}' in set '{set}'")]
    DuplicateOption { set: String, id: String },

    #[error("option '{option}' in set '{set}': default '{default}' is not one of its choices")]
    InvalidOptionDefault {
        set: String,
        option: String,
        default: String,
    },
}
