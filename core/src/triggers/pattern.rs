//! Event patterns
//!
//! A pattern names an event type and constrains some of its fields. Fields
//! left out are wildcards. Regex constraints are anchored and compiled when
//! the trigger set is registered.

use regex::Regex;

use super::TriggerError;
use crate::combat_log::{EventType, LogEvent};

/// Field constraint as authored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    Exact(String),
    AnyOf(Vec<String>),
    Regex(String),
}

impl From<&str> for FieldSpec {
    fn from(value: &str) -> Self {
        FieldSpec::Exact(value.to_string())
    }
}

impl From<String> for FieldSpec {
    fn from(value: String) -> Self {
        FieldSpec::Exact(value)
    }
}

impl<const N: usize> From<[&str; N]> for FieldSpec {
    fn from(values: [&str; N]) -> Self {
        FieldSpec::AnyOf(values.iter().map(|v| v.to_string()).collect())
    }
}

impl From<Vec<String>> for FieldSpec {
    fn from(values: Vec<String>) -> Self {
        FieldSpec::AnyOf(values)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    event_type: EventType,
    fields: Vec<(String, FieldSpec)>,
}

impl Pattern {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            fields: Vec::new(),
        }
    }

    pub fn starts_using() -> Self {
        Self::new(EventType::StartsUsing)
    }

    pub fn ability() -> Self {
        Self::new(EventType::Ability)
    }

    pub fn gains_effect() -> Self {
        Self::new(EventType::GainsEffect)
    }

    pub fn loses_effect() -> Self {
        Self::new(EventType::LosesEffect)
    }

    pub fn head_marker() -> Self {
        Self::new(EventType::HeadMarker)
    }

    pub fn added_combatant() -> Self {
        Self::new(EventType::AddedCombatant)
    }

    pub fn tether() -> Self {
        Self::new(EventType::Tether)
    }

    pub fn was_defeated() -> Self {
        Self::new(EventType::WasDefeated)
    }

    /// Exact value, or any of several values when given an array
    pub fn field(mut self, name: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
        self.fields.push((name.into(), spec.into()));
        self
    }

    pub fn regex(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.fields
            .push((name.into(), FieldSpec::Regex(pattern.into())));
        self
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn fields(&self) -> &[(String, FieldSpec)] {
        &self.fields
    }

    /// Check field names against the event type and compile regexes
    pub fn compile(&self, trigger_id: &str) -> Result<CompiledPattern, TriggerError> {
        let mut matchers = Vec::with_capacity(self.fields.len());
        for (name, spec) in &self.fields {
            if !self.event_type.has_field(name) {
                return Err(TriggerError::UnknownField {
                    trigger: trigger_id.to_string(),
                    event_type: self.event_type.name(),
                    field: name.clone(),
                });
            }
            let matcher = match spec {
                FieldSpec::Exact(value) => FieldMatcher::Exact(value.clone()),
                FieldSpec::AnyOf(values) => FieldMatcher::AnyOf(values.clone()),
                FieldSpec::Regex(pattern) => {
                    let anchored = format!("^(?:{pattern})$");
                    let regex = Regex::new(&anchored).map_err(|source| {
                        TriggerError::InvalidRegex {
                            trigger: trigger_id.to_string(),
                            field: name.clone(),
                            source,
                        }
                    })?;
                    FieldMatcher::Regex(regex)
                }
            };
            matchers.push((name.clone(), matcher));
        }
        Ok(CompiledPattern {
            event_type: self.event_type,
            matchers,
        })
    }
}

#[derive(Debug, Clone)]
enum FieldMatcher {
    Exact(String),
    AnyOf(Vec<String>),
    Regex(Regex),
}

impl FieldMatcher {
    fn matches(&self, value: &str) -> bool {
        match self {
            FieldMatcher::Exact(expected) => expected == value,
            FieldMatcher::AnyOf(values) => values.iter().any(|v| v == value),
            FieldMatcher::Regex(regex) => regex.is_match(value),
        }
    }
}

/// A validated pattern ready for matching
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    event_type: EventType,
    matchers: Vec<(String, FieldMatcher)>,
}

impl CompiledPattern {
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Absent fields never match a constraint
    pub fn matches(&self, event: &LogEvent) -> bool {
        event.event_type == self.event_type
            && self.matchers.iter().all(|(name, matcher)| {
                event
                    .fields
                    .get(name)
                    .is_some_and(|value| matcher.matches(value))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat_log::Matches;
    use chrono::NaiveDateTime;

    fn event(ty: EventType, fields: Matches) -> LogEvent {
        let ts = NaiveDateTime::parse_from_str("2025-01-01 20:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        LogEvent::new(ts, ty, fields)
    }

    #[test]
    fn exact_any_of_and_regex_constraints() {
        let pattern = Pattern::starts_using()
            .field("id", ["9CD0", "9D89"])
            .field("source", "Fatebreaker")
            .regex("target", "Tini.*")
            .compile("t")
            .unwrap();

        let hit = Matches::new()
            .with("id", "9D89")
            .with("source", "Fatebreaker")
            .with("target", "Tini Poutini");
        assert!(pattern.matches(&event(EventType::StartsUsing, hit.clone())));
        assert!(!pattern.matches(&event(EventType::Ability, hit.clone())));

        let wrong_id = hit.clone().with("id", "9CD1");
        assert!(!pattern.matches(&event(EventType::StartsUsing, wrong_id)));

        let missing_source = Matches::new().with("id", "9CD0").with("target", "Tini Poutini");
        assert!(!pattern.matches(&event(EventType::StartsUsing, missing_source)));
    }

    #[test]
    fn regex_is_anchored() {
        let pattern = Pattern::ability().regex("id", "9D0[AB]").compile("t").unwrap();
        assert!(pattern.matches(&event(EventType::Ability, Matches::new().with("id", "9D0A"))));
        assert!(!pattern.matches(&event(EventType::Ability, Matches::new().with("id", "19D0A"))));
    }

    #[test]
    fn unspecified_fields_are_wildcards() {
        let pattern = Pattern::head_marker().compile("t").unwrap();
        assert!(pattern.matches(&event(EventType::HeadMarker, Matches::new().with("id", "0017"))));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = Pattern::head_marker().field("ability", "x").compile("marker").unwrap_err();
        assert!(matches!(err, TriggerError::UnknownField { ref field, .. } if field == "ability"));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = Pattern::ability().regex("id", "(").compile("bad").unwrap_err();
        assert!(matches!(err, TriggerError::InvalidRegex { .. }));
    }
}
