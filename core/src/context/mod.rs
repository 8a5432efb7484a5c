mod config;
mod error;

pub use config::{APP_NAME, EngineConfigExt};
pub use error::ConfigError;
pub use raidwatch_types::{EngineConfig, PartyMemberConfig};
