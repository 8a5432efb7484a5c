use chrono::NaiveDateTime;
use raidwatch_types::{EngineConfig, Lang};

use super::{Catalogue, CatalogueError, EncounterRuntime};
use crate::combat_log::{EventType, LogEvent};
use crate::engine::{Emitted, ReportSink};

/// Routes events to the engines active for the current zone.
///
/// Within one event, every engine first runs its tasks due at the event
/// time, then every engine processes the event. Engines run in catalogue
/// order.
pub struct Session {
    config: EngineConfig,
    catalogue: Catalogue,
    zone_id: Option<u32>,
    active: Vec<Box<dyn EncounterRuntime>>,
}

impl Session {
    pub fn new(catalogue: Catalogue, config: EngineConfig) -> Self {
        Self {
            config,
            catalogue,
            zone_id: None,
            active: Vec::new(),
        }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn zone_id(&self) -> Option<u32> {
        self.zone_id
    }

    pub fn active_sets(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(|engine| engine.set_id())
    }

    pub fn pending_tasks(&self) -> usize {
        self.active.iter().map(|engine| engine.pending_tasks()).sum()
    }

    /// Switch zones: drop the current engines (and their pending work) and
    /// start fresh ones for every set applying to `zone_id`.
    pub fn enter_zone(&mut self, zone_id: u32, sink: &mut dyn ReportSink) {
        let dropped = self.pending_tasks();
        self.active.clear();
        self.zone_id = Some(zone_id);

        let ids: Vec<String> = self
            .catalogue
            .for_zone(zone_id)
            .map(|entry| entry.id.clone())
            .collect();
        for id in &ids {
            self.start_engine(id, sink);
        }
        tracing::info!(zone = zone_id, sets = self.active.len(), dropped, "Entered zone");
    }

    /// Activate every registered set regardless of zone
    pub fn activate_all(&mut self, sink: &mut dyn ReportSink) {
        self.active.clear();
        let ids: Vec<String> = self.catalogue.iter().map(|entry| entry.id.clone()).collect();
        for id in &ids {
            self.start_engine(id, sink);
        }
    }

    /// Activate one set by id on top of the current ones. Already active sets
    /// are left untouched.
    pub fn activate(&mut self, set_id: &str, sink: &mut dyn ReportSink) -> Result<(), CatalogueError> {
        if self.active.iter().any(|engine| engine.set_id() == set_id) {
            return Ok(());
        }
        let entry = self
            .catalogue
            .get(set_id)
            .ok_or_else(|| CatalogueError::UnknownSet { id: set_id.to_string() })?;
        let engine = entry.instantiate(&self.config)?;
        self.active.push(engine);
        sink.on_set_activated(set_id);
        Ok(())
    }

    pub fn process_event(&mut self, event: &LogEvent, sink: &mut dyn ReportSink) {
        if event.event_type == EventType::ChangeZone {
            match event.fields.get_hex("id").and_then(|id| u32::try_from(id).ok()) {
                Some(zone_id) => self.enter_zone(zone_id, sink),
                None => tracing::warn!(line = event.line_number, "ChangeZone without a zone id"),
            }
        }

        self.advance_to(event.timestamp, sink);
        for engine in &mut self.active {
            dispatch(engine.process_event(event), sink);
        }
    }

    /// Run tasks due at or before `now` in every active engine
    pub fn advance_to(&mut self, now: NaiveDateTime, sink: &mut dyn ReportSink) {
        for engine in &mut self.active {
            dispatch(engine.advance_to(now), sink);
        }
    }

    /// Flush all pending work (end of a replay)
    pub fn finish(&mut self, sink: &mut dyn ReportSink) {
        for engine in &mut self.active {
            dispatch(engine.finish(), sink);
        }
    }

    /// Explicit pull start for every active engine
    pub fn start_pull(&mut self, at: NaiveDateTime, sink: &mut dyn ReportSink) {
        for engine in &mut self.active {
            dispatch(engine.start_pull(at), sink);
        }
    }

    pub fn reset(&mut self) {
        for engine in &mut self.active {
            engine.reset();
        }
    }

    /// Applies to active engines and to engines started later
    pub fn set_language(&mut self, lang: Lang) {
        self.config.language = lang;
        for engine in &mut self.active {
            engine.set_language(lang);
        }
    }

    fn start_engine(&mut self, set_id: &str, sink: &mut dyn ReportSink) {
        let Some(entry) = self.catalogue.get(set_id) else {
            return;
        };
        match entry.instantiate(&self.config) {
            Ok(engine) => {
                tracing::debug!(set = set_id, "Activated trigger set");
                self.active.push(engine);
                sink.on_set_activated(set_id);
            }
            Err(err) => tracing::error!(set = set_id, error = %err, "Failed to start trigger set"),
        }
    }
}

fn dispatch(emitted: Vec<Emitted>, sink: &mut dyn ReportSink) {
    for item in &emitted {
        item.dispatch(sink);
    }
}
