//! Declarative trigger-set files
//!
//! Data-only trigger sets (patterns, timing, output keys, library responses
//! and mistake maps) loaded from TOML. Sets that need typed state are written
//! in Rust instead (see [`crate::encounters`]).
//!
//! - **definition**: file types and conversion to [`TriggerSet`](crate::triggers::TriggerSet)
//! - **loader**: file and directory loading

mod definition;
mod error;
mod loader;

pub use definition::{
    ChoiceDef, DeathReasonDef, FieldDef, MistakeDef, SetHeader, SetOptionDef, TextDef, TriggerDef,
    TriggerSetFile,
};
pub use error::DslError;
pub use loader::{LoadedSet, load_set_from_file, load_sets_from_dir, parse_set};
