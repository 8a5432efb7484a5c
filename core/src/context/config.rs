//! Engine configuration
//!
//! Re-exports the shared `EngineConfig` from raidwatch-types and provides
//! persistence through confy.

use std::path::Path;

use raidwatch_types::EngineConfig;

use super::ConfigError;

pub const APP_NAME: &str = "raidwatch";
const CONFIG_NAME: &str = "config";

/// Extension trait for EngineConfig persistence and normalization
pub trait EngineConfigExt: Sized {
    /// Load from the platform config directory, falling back to defaults.
    fn load() -> Self;
    /// Load from an explicit file path.
    fn load_from(path: &Path) -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    /// Clamp out-of-range values to safe defaults.
    fn normalized(self) -> Self;
}

impl EngineConfigExt for EngineConfig {
    fn load() -> Self {
        match confy::load::<EngineConfig>(APP_NAME, CONFIG_NAME) {
            Ok(config) => config.normalized(),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load config, using defaults");
                EngineConfig::default()
            }
        }
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        confy::load_path::<EngineConfig>(path)
            .map(EngineConfig::normalized)
            .map_err(|source| ConfigError::LoadPath {
                path: path.to_path_buf(),
                source,
            })
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self.clone()).map_err(ConfigError::Save)
    }

    fn normalized(mut self) -> Self {
        let defaults = EngineConfig::default();
        if !self.death_report_retention_secs.is_finite() || self.death_report_retention_secs <= 0.0
        {
            tracing::warn!(
                value = self.death_report_retention_secs,
                "Invalid death report retention, using default"
            );
            self.death_report_retention_secs = defaults.death_report_retention_secs;
        }
        if self.death_report_capacity == 0 {
            self.death_report_capacity = defaults.death_report_capacity;
        }
        self
    }
}
