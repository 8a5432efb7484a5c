use chrono::NaiveDateTime;
use raidwatch_types::Lang;

use crate::combat_log::LogEvent;
use crate::engine::{Emitted, EncounterEngine};

/// An encounter engine with its state type erased, so sets with different
/// `Data` types can run side by side in one session.
pub trait EncounterRuntime {
    fn set_id(&self) -> &str;

    fn process_event(&mut self, event: &LogEvent) -> Vec<Emitted>;

    fn advance_to(&mut self, now: NaiveDateTime) -> Vec<Emitted>;

    fn finish(&mut self) -> Vec<Emitted>;

    fn start_pull(&mut self, at: NaiveDateTime) -> Vec<Emitted>;

    fn reset(&mut self);

    fn set_language(&mut self, lang: Lang);

    fn pending_tasks(&self) -> usize;
}

impl<S: 'static> EncounterRuntime for EncounterEngine<S> {
    fn set_id(&self) -> &str {
        EncounterEngine::set_id(self)
    }

    fn process_event(&mut self, event: &LogEvent) -> Vec<Emitted> {
        EncounterEngine::process_event(self, event)
    }

    fn advance_to(&mut self, now: NaiveDateTime) -> Vec<Emitted> {
        EncounterEngine::advance_to(self, now)
    }

    fn finish(&mut self) -> Vec<Emitted> {
        EncounterEngine::finish(self)
    }

    fn start_pull(&mut self, at: NaiveDateTime) -> Vec<Emitted> {
        EncounterEngine::start_pull(self, at)
    }

    fn reset(&mut self) {
        EncounterEngine::reset(self)
    }

    fn set_language(&mut self, lang: Lang) {
        EncounterEngine::set_language(self, lang)
    }

    fn pending_tasks(&self) -> usize {
        EncounterEngine::pending_tasks(self)
    }
}
