//! Session layer
//!
//! Owns the [`Catalogue`] of registered trigger sets and routes log events to
//! the engines active for the current zone.
//!
//! - **catalogue**: set registration (Rust builders and trigger-set files)
//! - **runtime**: type-erased engine interface
//! - **router**: zone tracking and event routing

mod catalogue;
mod error;
mod router;
mod runtime;


pub use catalogue::{Catalogue, CatalogueEntry, SetSource};
pub use error::CatalogueError;
pub use router::Session;
pub use runtime::EncounterRuntime;
