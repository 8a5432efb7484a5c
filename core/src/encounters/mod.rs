//! Built-in trigger sets written in Rust
//!
//! Sets that need typed state live here; simpler sets are loaded from TOML
//! files (see [`crate::dsl`]).

pub mod futures_rewritten;
