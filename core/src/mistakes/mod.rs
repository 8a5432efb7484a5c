//! Mistake collection
//!
//! Mistakes come from trigger `mistake` outputs, from the built-in families
//! generated out of a set's mistake maps, from deaths, and from pull/wipe.
//! The collector filters them by role and either emits them immediately or
//! aggregates them over a collection window.

pub mod collector;
pub mod families;
mod mistake;

pub use collector::{CollectPolicy, MistakeCollector, MistakePolicy, Proposed};
pub use mistake::{DeathReason, Mistake, MistakeProposal, MistakeText, TriggerFamily};
