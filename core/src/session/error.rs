use thiserror::Error;

use crate::dsl::DslError;
use crate::triggers::TriggerError;

/// Errors while registering or activating trigger sets
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("trigger set '{id}' is already registered")]
    DuplicateSet { id: String },

    #[error("no trigger set named '{id}'")]
    UnknownSet { id: String },

    #[error(transparent)]
    Trigger(#[from] TriggerError),

    #[error(transparent)]
    Dsl(#[from] DslError),
}
