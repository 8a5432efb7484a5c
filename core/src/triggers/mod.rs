//! Triggers
//!
//! This module provides:
//! - **Patterns**: event type plus field constraints, with per-language variants
//! - **Definitions**: a pattern plus condition, timing, `run` and one output shape
//! - **Sets**: triggers grouped by zone, validated and compiled at registration
//! - **Libraries**: common conditions and responses
//!
//! Trigger callbacks receive [`Data`], the per-encounter state wrapper.

pub mod conditions;
mod data;
mod definition;
mod error;
mod pattern;
pub mod responses;
mod set;

pub use data::Data;
pub use definition::{
    Alert, ConditionFn, DeathReasonFn, MistakeFn, PromiseFn, ResponseFn, RunFn, Seconds,
    SecondsFn, Severity, SuppressionScope, TextFn, Trigger, TriggerOutput,
};
pub use error::TriggerError;
pub use pattern::{CompiledPattern, FieldSpec, Pattern};
pub use set::{CompiledSet, RegisteredTrigger, TriggerSet};
