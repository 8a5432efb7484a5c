pub mod combat_log;
pub mod context;
pub mod death_report;
pub mod dsl;
pub mod encounters;
pub mod engine;
pub mod mistakes;
pub mod output;
pub mod party;
pub mod session;
pub mod timers;
pub mod triggers;

// Re-exports for convenience
pub use combat_log::*;
pub use context::{ConfigError, EngineConfigExt};
pub use death_report::{DeathReport, TrackedEvent, TrackedEventKind};
pub use dsl::{DslError, TriggerSetFile, load_set_from_file, load_sets_from_dir};
pub use engine::{Emitted, EncounterEngine, Notification, ReportSink};
pub use mistakes::{DeathReason, Mistake, MistakeProposal};
pub use output::{Output, OutputError, OutputStrings};
pub use party::{Party, PartyMember};
pub use session::{Catalogue, CatalogueError, EncounterRuntime, Session};
pub use triggers::{Data, Pattern, Severity, Trigger, TriggerError, TriggerSet};
