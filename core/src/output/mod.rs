//! Localized output resolution
//!
//! Triggers refer to display text by key. Keys resolve against the trigger's
//! own `OutputStrings` first and the shared library second, in the active
//! display language with English as fallback.

mod error;
pub mod library;
mod resolver;

pub use error::OutputError;
pub use library::StaticText;
pub use resolver::{Output, OutputStrings, placeholders, substitute};
