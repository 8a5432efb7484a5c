//! Encounter engine
//!
//! Runs one compiled trigger set against a stream of log events. Owns the
//! per-encounter [`Data`], the timer queue, the mistake collector and the
//! death tracker. Everything is driven by log time.

use chrono::NaiveDateTime;
use hashbrown::HashMap;
use raidwatch_types::{EngineConfig, Lang, MistakeType};

use super::guard::guarded;
use super::{Emitted, Notification};
use crate::combat_log::{EventType, LogEvent, Matches};
use crate::death_report::{DeathTracker, TrackedEvent, TrackedEventKind};
use crate::mistakes::{DeathReason, Mistake, MistakeCollector, MistakeProposal, Proposed};
use crate::output::{Output, library};
use crate::timers::{TimerKey, TimerQueue, log_time};
use crate::triggers::{
    CompiledSet, Data, RegisteredTrigger, Seconds, Severity, SuppressionScope, Trigger,
    TriggerError, TriggerOutput, TriggerSet,
};

/// ActorControl commands that mean the party wiped (fade out)
const WIPE_COMMANDS: [u64; 2] = [0x4000_000F, 0x4000_0010];

const PULL_MISTAKE_ID: &str = "pull";
const WIPE_MISTAKE_ID: &str = "wipe";
const DEATH_MISTAKE_ID: &str = "death";

#[derive(Debug)]
enum Task {
    Fire { trigger_idx: usize, matches: Matches },
    CloseWindow,
}

pub struct EncounterEngine<S> {
    set_id: String,
    triggers: Vec<RegisteredTrigger<S>>,
    init_data: Box<dyn Fn() -> S>,
    state: EngineState<S>,
}

/// Mutable engine state, split from the trigger list so callbacks can borrow
/// a trigger while the state is mutated.
struct EngineState<S> {
    data: Data<S>,
    queue: TimerQueue<Task>,
    next_instance: u64,
    /// Suppression deadlines keyed by (trigger index, scope value)
    suppressed_until: HashMap<(usize, Option<String>), NaiveDateTime>,
    collector: MistakeCollector,
    deaths: DeathTracker,
    /// Pending death reasons keyed by target id
    death_reasons: HashMap<String, DeathReason>,
    pull_started_at: Option<NaiveDateTime>,
    in_combat: bool,
    pulls: u32,
}

impl<S: 'static> EncounterEngine<S> {
    /// Compile and load a trigger set
    pub fn new(set: TriggerSet<S>, config: &EngineConfig) -> Result<Self, TriggerError> {
        Ok(Self::from_compiled(set.compile()?, config))
    }

    pub fn from_compiled(set: CompiledSet<S>, config: &EngineConfig) -> Self {
        let option_values = set.option_values(config);
        let mut collector = MistakeCollector::new(config.language);
        for (id, policy) in set.policies {
            collector.register(id, policy);
        }

        let state = (set.init_data)();
        let mut data = Data::new(config, state);
        data.trigger_set_config = option_values;
        tracing::info!(set = %set.id, triggers = set.triggers.len(), "Loaded trigger set");

        Self {
            set_id: set.id,
            triggers: set.triggers,
            init_data: set.init_data,
            state: EngineState {
                data,
                queue: TimerQueue::new(),
                next_instance: 0,
                suppressed_until: HashMap::new(),
                collector,
                deaths: DeathTracker::new(
                    config.death_report_retention_secs,
                    config.death_report_capacity,
                ),
                death_reasons: HashMap::new(),
                pull_started_at: None,
                in_combat: false,
                pulls: 0,
            },
        }
    }
}

impl<S> EncounterEngine<S> {
    pub fn set_id(&self) -> &str {
        &self.set_id
    }

    pub fn data(&self) -> &Data<S> {
        &self.state.data
    }

    pub fn data_mut(&mut self) -> &mut Data<S> {
        &mut self.state.data
    }

    pub fn language(&self) -> Lang {
        self.state.data.lang
    }

    /// Applies to the next formatted output
    pub fn set_language(&mut self, lang: Lang) {
        self.state.data.lang = lang;
        self.state.collector.set_lang(lang);
    }

    /// Delayed firings and collection windows not yet run
    pub fn pending_tasks(&self) -> usize {
        self.state.queue.len()
    }

    pub fn in_combat(&self) -> bool {
        self.state.in_combat
    }

    pub fn pulls(&self) -> u32 {
        self.state.pulls
    }

    /// Process one event: run due tasks, handle pull/wipe, then evaluate
    /// triggers in registration order.
    pub fn process_event(&mut self, event: &LogEvent) -> Vec<Emitted> {
        let mut out = Vec::new();
        self.run_due(event.timestamp, &mut out);

        self.handle_lifecycle(event, &mut out);
        self.state.track_for_report(event);

        for (idx, registered) in self.triggers.iter().enumerate() {
            self.state.evaluate(idx, registered, event, &mut out);
        }

        if event.event_type == EventType::WasDefeated {
            self.state.handle_death(event, &mut out);
        }
        out
    }

    /// Run every task due at or before `now`
    pub fn advance_to(&mut self, now: NaiveDateTime) -> Vec<Emitted> {
        let mut out = Vec::new();
        self.run_due(now, &mut out);
        out
    }

    /// Run every remaining task in order (end of a replay)
    pub fn finish(&mut self) -> Vec<Emitted> {
        let mut out = Vec::new();
        while let Some((due, key, task)) = self.state.queue.pop_next() {
            self.run_task(due, key, task, &mut out);
        }
        out
    }

    /// Start a new pull: rebuild state, cancel pending work, emit a pull
    /// mistake.
    pub fn start_pull(&mut self, at: NaiveDateTime) -> Vec<Emitted> {
        let mut out = Vec::new();
        self.begin_pull(at, &mut out);
        out
    }

    /// Drop all pending work and rebuild the encounter state
    pub fn reset(&mut self) {
        let state = &mut self.state;
        let cancelled = state.queue.len();
        state.queue.clear();
        state.suppressed_until.clear();
        state.collector.reset();
        state.deaths.reset();
        state.death_reasons.clear();
        state.pull_started_at = None;
        state.in_combat = false;

        match guarded(&self.set_id, "init_data", || (self.init_data)()) {
            Some(fresh) => state.data.state = fresh,
            None => tracing::warn!(set = %self.set_id, "Keeping previous state after init failure"),
        }
        tracing::debug!(set = %self.set_id, cancelled, "Encounter reset");
    }

    fn begin_pull(&mut self, at: NaiveDateTime, out: &mut Vec<Emitted>) {
        self.reset();
        let state = &mut self.state;
        state.pull_started_at = Some(at);
        state.in_combat = true;
        state.pulls += 1;
        tracing::info!(set = %self.set_id, pull = state.pulls, "Pull started");
        out.push(Emitted::Mistake(state.lifecycle_mistake(
            MistakeType::Pull,
            PULL_MISTAKE_ID,
            at,
        )));
    }

    fn handle_lifecycle(&mut self, event: &LogEvent, out: &mut Vec<Emitted>) {
        match event.event_type {
            EventType::InCombat => {
                let in_game = event.fields.get_i64("inGameCombat") == Some(1);
                if in_game && !self.state.in_combat {
                    self.begin_pull(event.timestamp, out);
                } else if !in_game && self.state.in_combat {
                    self.state.in_combat = false;
                    tracing::debug!(set = %self.set_id, "Combat ended");
                }
            }
            EventType::ActorControl => {
                let is_wipe = event
                    .fields
                    .get_hex("command")
                    .is_some_and(|c| WIPE_COMMANDS.contains(&c));
                if is_wipe && self.state.pull_started_at.is_some() {
                    let state = &mut self.state;
                    let cancelled = state
                        .queue
                        .cancel_where(|key| key.instance.is_some());
                    state.pull_started_at = None;
                    state.in_combat = false;
                    tracing::info!(set = %self.set_id, cancelled, "Wipe");
                    out.push(Emitted::Mistake(state.lifecycle_mistake(
                        MistakeType::Wipe,
                        WIPE_MISTAKE_ID,
                        event.timestamp,
                    )));
                }
            }
            _ => {}
        }
    }

    fn run_due(&mut self, now: NaiveDateTime, out: &mut Vec<Emitted>) {
        while let Some((due, key, task)) = self.state.queue.pop_due(now) {
            self.run_task(due, key, task, out);
        }
    }

    fn run_task(&mut self, due: NaiveDateTime, key: TimerKey, task: Task, out: &mut Vec<Emitted>) {
        match task {
            Task::Fire {
                trigger_idx,
                matches,
            } => {
                if let Some(registered) = self.triggers.get(trigger_idx) {
                    self.state.fire(&registered.trigger, &matches, due, out);
                }
            }
            Task::CloseWindow => {
                if let Some(mistake) = self.state.collector.close_window(&key.owner_id, due) {
                    self.state.emit_mistake(mistake, out);
                }
            }
        }
    }
}

impl<S> EngineState<S> {
    // ═══════════════════════════════════════════════════════════════════════
    // Trigger evaluation
    // ═══════════════════════════════════════════════════════════════════════

    fn evaluate(
        &mut self,
        idx: usize,
        registered: &RegisteredTrigger<S>,
        event: &LogEvent,
        out: &mut Vec<Emitted>,
    ) {
        let trigger = &registered.trigger;
        if trigger.disabled || !registered.pattern_for(self.data.lang).matches(event) {
            return;
        }
        let matches = &event.fields;
        let now = event.timestamp;

        if let Some(condition) = &trigger.condition
            && guarded(&trigger.id, "condition", || condition(&self.data, matches)) != Some(true)
        {
            return;
        }

        if let Some(suppress) = &trigger.suppress_seconds {
            let key = (idx, scope_value(&trigger.suppression_scope, matches));
            if let Some(until) = self.suppressed_until.get(&key)
                && now < *until
            {
                tracing::debug!(trigger = %trigger.id, "Suppressed");
                return;
            }
            if let Some(window) = self.seconds(trigger, "suppress_seconds", suppress, matches) {
                let until = log_time::after(now, window).unwrap_or_else(|| {
                    tracing::warn!(
                        trigger = %trigger.id,
                        window,
                        "Suppression window out of range, suppressing for good"
                    );
                    NaiveDateTime::MAX
                });
                self.suppressed_until.insert(key, until);
            }
        }

        let delay = trigger
            .delay_seconds
            .as_ref()
            .and_then(|delay| self.seconds(trigger, "delay_seconds", delay, matches))
            .filter(|delay| *delay > 0.0);
        match delay {
            Some(delay) => {
                let Some(due) = log_time::after(now, delay) else {
                    tracing::warn!(trigger = %trigger.id, delay, "Delay out of range, dropping firing");
                    return;
                };
                let instance = self.next_instance;
                self.next_instance += 1;
                tracing::debug!(trigger = %trigger.id, instance, delay, "Delayed firing");
                self.queue.schedule(
                    due,
                    TimerKey::firing(&trigger.id, instance),
                    Task::Fire {
                        trigger_idx: idx,
                        matches: matches.clone(),
                    },
                );
            }
            None => self.fire(trigger, matches, now, out),
        }
    }

    /// Promise, run, output. Called at match time or when a delay expires.
    fn fire(&mut self, trigger: &Trigger<S>, matches: &Matches, now: NaiveDateTime, out: &mut Vec<Emitted>) {
        let id = trigger.id.as_str();

        if let Some(promise) = &trigger.promise
            && guarded(id, "promise", || promise(&mut self.data, matches)) != Some(true)
        {
            tracing::debug!(trigger = id, "Promise rejected firing");
            return;
        }

        let output = Output::new(self.data.lang, &trigger.output_strings);

        if let Some(run) = &trigger.run {
            match guarded(id, "run", || run(&mut self.data, matches, &output)) {
                Some(Ok(())) => {}
                Some(Err(err)) => {
                    tracing::warn!(trigger = id, error = %err, "run failed");
                    return;
                }
                None => return,
            }
        }

        match &trigger.output {
            TriggerOutput::None => {}
            TriggerOutput::Text { severity, produce } => {
                match guarded(id, "output", || produce(&mut self.data, matches, &output)) {
                    Some(Ok(Some(text))) => self.notify(trigger, matches, *severity, text, now, out),
                    Some(Ok(None)) | None => {}
                    Some(Err(err)) => tracing::warn!(trigger = id, error = %err, "Output failed"),
                }
            }
            TriggerOutput::Response(respond) => {
                match guarded(id, "response", || respond(&mut self.data, matches, &output)) {
                    Some(Ok(Some(alert))) => {
                        self.notify(trigger, matches, alert.severity, alert.text, now, out)
                    }
                    Some(Ok(None)) | None => {}
                    Some(Err(err)) => tracing::warn!(trigger = id, error = %err, "Response failed"),
                }
            }
            TriggerOutput::Mistake(produce) => {
                match guarded(id, "mistake", || produce(&mut self.data, matches, &output)) {
                    Some(Ok(proposals)) => {
                        for proposal in proposals {
                            self.propose(id, proposal, now, out);
                        }
                    }
                    Some(Err(err)) => tracing::warn!(trigger = id, error = %err, "Mistake failed"),
                    None => {}
                }
            }
            TriggerOutput::DeathReason(produce) => {
                if let Some(Some(reason)) = guarded(id, "death_reason", || produce(&mut self.data, matches)) {
                    tracing::debug!(trigger = id, target = %reason.name, "Death reason recorded");
                    self.death_reasons.insert(reason.id.clone(), reason);
                }
            }
        }
    }

    fn notify(
        &mut self,
        trigger: &Trigger<S>,
        matches: &Matches,
        severity: Severity,
        text: String,
        now: NaiveDateTime,
        out: &mut Vec<Emitted>,
    ) {
        let duration_secs = trigger
            .duration_seconds
            .as_ref()
            .and_then(|d| self.seconds(trigger, "duration_seconds", d, matches));
        let countdown_secs = trigger
            .countdown_seconds
            .as_ref()
            .and_then(|c| self.seconds(trigger, "countdown_seconds", c, matches));

        tracing::debug!(trigger = %trigger.id, %severity, text = %text, "Notification");
        out.push(Emitted::Notification(Notification {
            trigger_id: trigger.id.clone(),
            severity,
            text,
            timestamp: now,
            duration_secs,
            countdown_secs,
        }));
    }

    /// Resolve a seconds field. Negative, zero and non-finite values are None.
    fn seconds(
        &self,
        trigger: &Trigger<S>,
        stage: &'static str,
        value: &Seconds<S>,
        matches: &Matches,
    ) -> Option<f32> {
        guarded(&trigger.id, stage, || value.resolve(&self.data, matches))
            .flatten()
            .filter(|secs| secs.is_finite() && *secs > 0.0)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mistakes & deaths
    // ═══════════════════════════════════════════════════════════════════════

    fn propose(&mut self, trigger_id: &str, proposal: MistakeProposal, now: NaiveDateTime, out: &mut Vec<Emitted>) {
        let mistake_id = proposal
            .mistake_id
            .clone()
            .unwrap_or_else(|| trigger_id.to_string());
        match self
            .collector
            .propose(&mistake_id, proposal, &self.data.party, now)
        {
            Proposed::Emitted(mistake) => self.emit_mistake(mistake, out),
            Proposed::WindowOpened { closes_at: Some(closes_at) } => {
                self.queue
                    .schedule(closes_at, TimerKey::window(&mistake_id), Task::CloseWindow);
            }
            Proposed::WindowOpened { closes_at: None } => {
                tracing::warn!(
                    mistake_id,
                    "Collection window out of range, it will never report"
                );
            }
            Proposed::Collected | Proposed::Suppressed | Proposed::Filtered => {}
        }
    }

    fn emit_mistake(&mut self, mistake: Mistake, out: &mut Vec<Emitted>) {
        if let Some(blame) = &mistake.blame {
            self.deaths.track_by_name(
                blame,
                TrackedEvent::new(
                    mistake.timestamp,
                    TrackedEventKind::Mistake {
                        mistake_type: mistake.mistake_type,
                        text: mistake.text.clone(),
                    },
                ),
            );
        }
        out.push(Emitted::Mistake(mistake));
    }

    fn lifecycle_mistake(&self, mistake_type: MistakeType, id: &str, at: NaiveDateTime) -> Mistake {
        let text = library::get(id)
            .map(|t| t.get(self.data.lang).to_string())
            .unwrap_or_else(|| id.to_string());
        Mistake {
            mistake_type,
            mistake_id: id.to_string(),
            name: None,
            blame: None,
            text,
            count: 1,
            report_id: None,
            trigger_type: None,
            report: None,
            timestamp: at,
        }
    }

    /// Players get death reports. With no configured party, player actor ids
    /// (which start with `1`) are tracked.
    fn is_tracked(&self, target_id: &str, target: &str) -> bool {
        let party = &self.data.party;
        if party.is_empty() {
            return target_id.starts_with('1');
        }
        party.member_by_id(target_id).is_some() || party.contains(target)
    }

    fn track_for_report(&mut self, event: &LogEvent) {
        let fields = &event.fields;
        let (target_id, target) = (fields.target_id(), fields.target());
        if target_id.is_empty() || !self.is_tracked(target_id, target) {
            return;
        }

        let kind = match event.event_type {
            EventType::Ability => {
                let amount = |key: &str| fields.get_i64(key).filter(|v| *v > 0);
                if let Some(damage) = amount("damage") {
                    TrackedEventKind::Damage {
                        ability_id: fields.id().to_string(),
                        ability: fields.field("ability").to_string(),
                        source: fields.source().to_string(),
                        amount: damage,
                    }
                } else if let Some(heal) = amount("heal") {
                    TrackedEventKind::Heal {
                        ability: fields.field("ability").to_string(),
                        source: fields.source().to_string(),
                        amount: heal,
                    }
                } else {
                    return;
                }
            }
            EventType::GainsEffect => TrackedEventKind::GainsEffect {
                effect_id: fields.field("effectId").to_string(),
                effect: fields.field("effect").to_string(),
                source: fields.source().to_string(),
                duration_secs: fields.get_f32("duration").unwrap_or(0.0),
            },
            EventType::LosesEffect => TrackedEventKind::LosesEffect {
                effect_id: fields.field("effectId").to_string(),
                effect: fields.field("effect").to_string(),
            },
            _ => return,
        };
        self.deaths
            .track(target_id, target, TrackedEvent::new(event.timestamp, kind));
    }

    fn handle_death(&mut self, event: &LogEvent, out: &mut Vec<Emitted>) {
        let fields = &event.fields;
        let (target_id, target) = (fields.target_id(), fields.target());
        if !self.is_tracked(target_id, target) {
            return;
        }
        let lang = self.data.lang;
        let Some((report_id, report)) = self.deaths.finalize(
            target_id,
            target,
            fields.source(),
            event.timestamp,
            lang,
            self.pull_started_at,
        ) else {
            return;
        };

        let reason = self.death_reasons.remove(target_id).or_else(|| {
            let key = self
                .death_reasons
                .iter()
                .find(|(_, r)| r.name == target)
                .map(|(k, _)| k.clone())?;
            self.death_reasons.remove(&key)
        });
        let text = match (reason, report.last_damage()) {
            (Some(reason), _) => reason.text.resolve(lang),
            (None, Some((ability, amount))) => format!("{ability} ({amount})"),
            (None, None) => library::get("died")
                .map(|t| t.get(lang).to_string())
                .unwrap_or_default(),
        };

        tracing::debug!(target = %target, report_id = %report_id, "Death report built");
        // Pushed directly: tracking the death mistake would reopen the buffer
        out.push(Emitted::Mistake(Mistake {
            mistake_type: MistakeType::Death,
            mistake_id: DEATH_MISTAKE_ID.to_string(),
            name: None,
            blame: Some(report.target_name.clone()),
            text,
            count: 1,
            report_id: Some(report_id),
            trigger_type: None,
            report: Some(report),
            timestamp: event.timestamp,
        }));
    }
}

fn scope_value(scope: &SuppressionScope, matches: &Matches) -> Option<String> {
    match scope {
        SuppressionScope::Global => None,
        SuppressionScope::ByField(field) => Some(matches.field(field).to_string()),
    }
}
