//! Trigger set catalogue
//!
//! Sets are registered as factories: an engine is built fresh every time a
//! set is activated. Every registration is validated by compiling the set
//! once, so a set that registers successfully always instantiates.

use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use raidwatch_types::{EngineConfig, LocaleText, SetOption};

use super::{CatalogueError, EncounterRuntime};
use crate::dsl::{TriggerSetFile, load_sets_from_dir};
use crate::encounters;
use crate::engine::EncounterEngine;
use crate::triggers::TriggerSet;

type Factory = Box<dyn Fn(&EngineConfig) -> Result<Box<dyn EncounterRuntime>, CatalogueError>>;

/// Where a registered set came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetSource {
    /// Written in Rust and compiled into the binary
    Builtin,
    /// Loaded from a trigger-set file
    File(PathBuf),
}

pub struct CatalogueEntry {
    pub id: String,
    /// Empty means the set applies in every zone
    pub zone_ids: Vec<u32>,
    pub zone_label: Option<LocaleText>,
    pub options: Vec<SetOption>,
    pub trigger_count: usize,
    pub source: SetSource,
    factory: Factory,
}

impl CatalogueEntry {
    pub fn applies_to_zone(&self, zone_id: u32) -> bool {
        self.zone_ids.is_empty() || self.zone_ids.contains(&zone_id)
    }

    /// Build a fresh engine for this set
    pub fn instantiate(&self, config: &EngineConfig) -> Result<Box<dyn EncounterRuntime>, CatalogueError> {
        (self.factory)(config)
    }
}

impl std::fmt::Debug for CatalogueEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogueEntry")
            .field("id", &self.id)
            .field("zone_ids", &self.zone_ids)
            .field("trigger_count", &self.trigger_count)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Registered trigger sets, kept in registration order
#[derive(Default)]
pub struct Catalogue {
    entries: Vec<CatalogueEntry>,
    by_id: HashMap<String, usize>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue holding the sets compiled into the crate
    pub fn builtin() -> Result<Self, CatalogueError> {
        let mut catalogue = Self::new();
        catalogue.register_fn(encounters::futures_rewritten::trigger_set)?;
        Ok(catalogue)
    }

    /// Register a set written in Rust. `build` runs once now for validation
    /// and again on every activation.
    pub fn register_fn<S, F>(&mut self, build: F) -> Result<&CatalogueEntry, CatalogueError>
    where
        S: 'static,
        F: Fn() -> TriggerSet<S> + 'static,
    {
        let set = build();
        let factory: Factory = Box::new(move |config: &EngineConfig| {
            let engine = EncounterEngine::new(build(), config)?;
            Ok(Box::new(engine) as Box<dyn EncounterRuntime>)
        });
        self.insert(set, SetSource::Builtin, factory)
    }

    /// Register a set loaded from a trigger-set file
    pub fn register_file(
        &mut self,
        file: TriggerSetFile,
        path: Option<&Path>,
    ) -> Result<&CatalogueEntry, CatalogueError> {
        let set = file.build()?;
        let source = match path {
            Some(path) => SetSource::File(path.to_path_buf()),
            None => SetSource::Builtin,
        };
        let factory: Factory = Box::new(move |config: &EngineConfig| {
            let engine = EncounterEngine::new(file.build()?, config)?;
            Ok(Box::new(engine) as Box<dyn EncounterRuntime>)
        });
        self.insert(set, source, factory)
    }

    /// Register every trigger-set file under `dir`. Sets that fail to
    /// register are logged and skipped. Returns how many were registered.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, CatalogueError> {
        let mut registered = 0;
        for loaded in load_sets_from_dir(dir)? {
            let set_id = loaded.file.set.id.clone();
            match self.register_file(loaded.file, Some(&loaded.path)) {
                Ok(_) => registered += 1,
                Err(err) => {
                    tracing::warn!(
                        set = %set_id,
                        path = %loaded.path.display(),
                        error = %err,
                        "Rejected trigger set"
                    );
                }
            }
        }
        Ok(registered)
    }

    pub fn get(&self, id: &str) -> Option<&CatalogueEntry> {
        self.by_id.get(id).map(|&idx| &self.entries[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogueEntry> {
        self.entries.iter()
    }

    /// Sets that apply to `zone_id`, in registration order
    pub fn for_zone(&self, zone_id: u32) -> impl Iterator<Item = &CatalogueEntry> {
        self.entries.iter().filter(move |entry| entry.applies_to_zone(zone_id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert<S: 'static>(
        &mut self,
        set: TriggerSet<S>,
        source: SetSource,
        factory: Factory,
    ) -> Result<&CatalogueEntry, CatalogueError> {
        if self.by_id.contains_key(&set.id) {
            return Err(CatalogueError::DuplicateSet { id: set.id });
        }

        let id = set.id.clone();
        let zone_ids = set.zone_ids.clone();
        let zone_label = set.zone_label.clone();
        let compiled = set.compile()?;
        let options = compiled.options.clone();

        tracing::debug!(set = %id, triggers = compiled.triggers.len(), ?source, "Registered trigger set");

        let idx = self.entries.len();
        self.entries.push(CatalogueEntry {
            id: id.clone(),
            zone_ids,
            zone_label,
            options,
            trigger_count: compiled.triggers.len(),
            source,
            factory,
        });
        self.by_id.insert(id, idx);
        Ok(&self.entries[idx])
    }
}
