//! Recorded event log
//!
//! The engine consumes already-tokenized events. Recorded sessions use a
//! pipe-delimited line format so they can be replayed deterministically:
//!
//! ```text
//! # session: 2025-01-01 20:00:00
//! 20:00:01.250|StartsUsing|id=9CD0|source=Fatebreaker|target=Tini Poutini
//! ```

mod error;
mod event;
mod parser;
mod reader;

pub use error::{ParseError, ReaderError};
pub use event::*;
pub use parser::LogParser;
pub use reader::Reader;
