use std::collections::BTreeMap;

use hashbrown::{HashMap, HashSet};
use raidwatch_types::{EngineConfig, Lang, LocaleText, MistakeMaps, SetOption};

use super::{CompiledPattern, Trigger, TriggerError};
use crate::mistakes::MistakePolicy;
use crate::mistakes::families;

/// A named group of triggers for one or more zones.
pub struct TriggerSet<S> {
    pub id: String,
    /// Empty matches every zone
    pub zone_ids: Vec<u32>,
    pub zone_label: Option<LocaleText>,
    pub mistake_maps: MistakeMaps,
    /// User-selectable settings, read by triggers through [`Data::set_option`]
    ///
    /// [`Data::set_option`]: super::Data::set_option
    pub options: Vec<SetOption>,
    /// Builds fresh encounter state at load and on every pull
    pub init_data: Box<dyn Fn() -> S>,
    pub triggers: Vec<Trigger<S>>,
}

impl<S: Default + 'static> TriggerSet<S> {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_init(id, S::default)
    }
}

impl<S> TriggerSet<S> {
    pub fn with_init<F>(id: impl Into<String>, init: F) -> Self
    where
        F: Fn() -> S + 'static,
    {
        Self {
            id: id.into(),
            zone_ids: Vec::new(),
            zone_label: None,
            mistake_maps: MistakeMaps::default(),
            options: Vec::new(),
            init_data: Box::new(init),
            triggers: Vec::new(),
        }
    }

    pub fn zone(mut self, zone_id: u32) -> Self {
        self.zone_ids.push(zone_id);
        self
    }

    pub fn zone_label(mut self, label: impl Into<LocaleText>) -> Self {
        self.zone_label = Some(label.into());
        self
    }

    pub fn mistakes(mut self, maps: MistakeMaps) -> Self {
        self.mistake_maps = maps;
        self
    }

    /// Declare a select option: `(label, value)` choices and the default value
    pub fn option<L, V>(
        self,
        id: impl Into<String>,
        choices: impl IntoIterator<Item = (L, V)>,
        default: impl Into<String>,
    ) -> Self
    where
        L: Into<LocaleText>,
        V: Into<String>,
    {
        let option = choices
            .into_iter()
            .fold(SetOption::new(id, default), |option, (label, value)| option.choice(label, value));
        self.with_option(option)
    }

    pub fn with_option(mut self, option: SetOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn trigger(mut self, trigger: Trigger<S>) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn applies_to_zone(&self, zone_id: u32) -> bool {
        self.zone_ids.is_empty() || self.zone_ids.contains(&zone_id)
    }
}

impl<S: 'static> TriggerSet<S> {
    /// Validate and compile the set. Any error rejects the whole set.
    ///
    /// Mistake map triggers are appended after the hand-written ones.
    pub fn compile(self) -> Result<CompiledSet<S>, TriggerError> {
        if self.id.trim().is_empty() {
            return Err(TriggerError::EmptySetId);
        }

        let mut option_ids = HashSet::new();
        for option in &self.options {
            if !option_ids.insert(option.id.as_str()) {
                return Err(TriggerError::DuplicateOption {
                    set: self.id.clone(),
                    id: option.id.clone(),
                });
            }
            if !option.accepts(&option.default) {
                return Err(TriggerError::InvalidOptionDefault {
                    set: self.id.clone(),
                    option: option.id.clone(),
                    default: option.default.clone(),
                });
            }
        }
        drop(option_ids);

        let generated = families::generate::<S>(&self.mistake_maps)?;
        let mut seen = HashSet::new();
        let mut triggers = Vec::with_capacity(self.triggers.len() + generated.triggers.len());

        for trigger in self.triggers.into_iter().chain(generated.triggers) {
            if !seen.insert(trigger.id.clone()) {
                return Err(TriggerError::DuplicateId {
                    set: self.id.clone(),
                    id: trigger.id.clone(),
                });
            }
            triggers.push(RegisteredTrigger::new(trigger)?);
        }

        tracing::debug!(
            set = %self.id,
            triggers = triggers.len(),
            "Compiled trigger set"
        );

        Ok(CompiledSet {
            id: self.id,
            zone_ids: self.zone_ids,
            zone_label: self.zone_label,
            options: self.options,
            init_data: self.init_data,
            triggers,
            policies: generated.policies,
        })
    }
}

/// A trigger with its patterns validated and compiled
pub struct RegisteredTrigger<S> {
    pub trigger: Trigger<S>,
    pattern: CompiledPattern,
    localized: BTreeMap<Lang, CompiledPattern>,
}

impl<S> RegisteredTrigger<S> {
    fn new(trigger: Trigger<S>) -> Result<Self, TriggerError> {
        let outputs = trigger.declared_outputs();
        if outputs.len() > 1 {
            return Err(TriggerError::ConflictingOutputs {
                trigger: trigger.id.clone(),
                fields: outputs,
            });
        }

        let pattern = trigger.pattern.compile(&trigger.id)?;
        let mut localized = BTreeMap::new();
        for (lang, variant) in &trigger.localized_patterns {
            if variant.event_type() != pattern.event_type() {
                return Err(TriggerError::PatternTypeMismatch {
                    trigger: trigger.id.clone(),
                    lang: lang.to_string(),
                    expected: pattern.event_type().name(),
                    found: variant.event_type().name(),
                });
            }
            localized.insert(*lang, variant.compile(&trigger.id)?);
        }

        if let super::SuppressionScope::ByField(field) = &trigger.suppression_scope
            && !pattern.event_type().has_field(field)
        {
            return Err(TriggerError::UnknownField {
                trigger: trigger.id.clone(),
                event_type: pattern.event_type().name(),
                field: field.clone(),
            });
        }

        Ok(Self {
            trigger,
            pattern,
            localized,
        })
    }

    pub fn pattern_for(&self, lang: Lang) -> &CompiledPattern {
        self.localized.get(&lang).unwrap_or(&self.pattern)
    }
}

/// Output of [`TriggerSet::compile`], consumed by the encounter engine
pub struct CompiledSet<S> {
    pub id: String,
    pub zone_ids: Vec<u32>,
    pub zone_label: Option<LocaleText>,
    pub options: Vec<SetOption>,
    pub init_data: Box<dyn Fn() -> S>,
    pub triggers: Vec<RegisteredTrigger<S>>,
    pub policies: Vec<(String, MistakePolicy)>,
}

impl<S> CompiledSet<S> {
    /// Selected value of every declared option. Overrides from `config` win
    /// when they name one of the option's choices; anything else falls back
    /// to the default.
    pub fn option_values(&self, config: &EngineConfig) -> HashMap<String, String> {
        let overrides = config.set_options.get(&self.id);
        if let Some(overrides) = overrides {
            for id in overrides.keys() {
                if !self.options.iter().any(|o| o.id == *id) {
                    tracing::warn!(set = %self.id, option = %id, "Ignoring unknown set option");
                }
            }
        }

        self.options
            .iter()
            .map(|option| {
                let selected = match overrides.and_then(|o| o.get(&option.id)) {
                    Some(value) if option.accepts(value) => value.clone(),
                    Some(value) => {
                        tracing::warn!(
                            set = %self.id,
                            option = %option.id,
                            value = %value,
                            "Invalid set option value, using default"
                        );
                        option.default.clone()
                    }
                    None => option.default.clone(),
                };
                (option.id.clone(), selected)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::{Pattern, Severity};
    use raidwatch_types::MistakeEntry;

    #[test]
    fn duplicate_ids_reject_the_set() {
        let set: TriggerSet<()> = TriggerSet::new("dupes")
            .trigger(Trigger::new("a", Pattern::ability()))
            .trigger(Trigger::new("a", Pattern::head_marker()));
        assert!(matches!(
            set.compile(),
            Err(TriggerError::DuplicateId { ref id, .. }) if id == "a"
        ));
    }

    #[test]
    fn generated_mistake_ids_collide_with_triggers() {
        let mut maps = MistakeMaps::default();
        maps.damage_warn.insert("a".into(), MistakeEntry::Id("9CD0".into()));
        let set: TriggerSet<()> = TriggerSet::new("dupes")
            .mistakes(maps)
            .trigger(Trigger::new("a", Pattern::ability()));
        assert!(matches!(set.compile(), Err(TriggerError::DuplicateId { .. })));
    }

    #[test]
    fn conflicting_outputs_reject_the_set() {
        let set: TriggerSet<()> = TriggerSet::new("conflict").trigger(
            Trigger::new("a", Pattern::ability())
                .text_key(Severity::Alert, "spread")
                .text_key(Severity::Info, "stacks"),
        );
        assert!(matches!(set.compile(), Err(TriggerError::ConflictingOutputs { .. })));
    }

    #[test]
    fn localized_pattern_must_keep_event_type() {
        let set: TriggerSet<()> = TriggerSet::new("mismatch").trigger(
            Trigger::new("a", Pattern::ability()).localized(Lang::Ja, Pattern::starts_using()),
        );
        assert!(matches!(set.compile(), Err(TriggerError::PatternTypeMismatch { .. })));
    }

    #[test]
    fn suppress_by_field_must_exist() {
        let set: TriggerSet<()> = TriggerSet::new("scope")
            .trigger(Trigger::new("a", Pattern::head_marker()).suppress(1.0).suppress_by("ability"));
        assert!(matches!(set.compile(), Err(TriggerError::UnknownField { .. })));
    }

    #[test]
    fn empty_zone_list_matches_everywhere() {
        let set: TriggerSet<()> = TriggerSet::new("global");
        assert!(set.applies_to_zone(1238));
        let set: TriggerSet<()> = TriggerSet::new("fru").zone(1238);
        assert!(set.applies_to_zone(1238));
        assert!(!set.applies_to_zone(1));
    }

    #[test]
    fn compiled_set_keeps_registration_order() {
        let mut maps = MistakeMaps::default();
        maps.damage_fail.insert("z".into(), MistakeEntry::Id("9CD0".into()));
        let compiled = TriggerSet::<()>::new("order")
            .mistakes(maps)
            .trigger(Trigger::new("b", Pattern::ability()))
            .trigger(Trigger::new("a", Pattern::ability()))
            .compile()
            .unwrap();
        let ids: Vec<&str> = compiled.triggers.iter().map(|t| t.trigger.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "z"]);
        assert_eq!(compiled.policies.len(), 1);
    }

    fn strategy_set() -> TriggerSet<()> {
        TriggerSet::new("strats").option("rotate", [("Clockwise", "cw"), ("Counter", "ccw")], "cw")
    }

    #[test]
    fn option_defaults_must_be_a_choice() {
        let set: TriggerSet<()> = TriggerSet::new("bad").option("rotate", [("Clockwise", "cw")], "ccw");
        assert!(matches!(
            set.compile(),
            Err(TriggerError::InvalidOptionDefault { ref option, .. }) if option == "rotate"
        ));

        let set = strategy_set().option("rotate", [("Clockwise", "cw")], "cw");
        assert!(matches!(set.compile(), Err(TriggerError::DuplicateOption { .. })));
    }

    #[test]
    fn option_values_prefer_valid_overrides() {
        let compiled = strategy_set().compile().unwrap();
        let mut config = EngineConfig::default();
        assert_eq!(compiled.option_values(&config).get("rotate").map(String::as_str), Some("cw"));

        config.select_option("strats", "rotate", "ccw");
        assert_eq!(compiled.option_values(&config).get("rotate").map(String::as_str), Some("ccw"));

        config.select_option("strats", "rotate", "sideways");
        config.select_option("strats", "unknown", "x");
        let values = compiled.option_values(&config);
        assert_eq!(values.get("rotate").map(String::as_str), Some("cw"));
        assert_eq!(values.len(), 1);
    }
}
