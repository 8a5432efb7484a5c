use std::collections::BTreeMap;

use chrono::NaiveDateTime;

/// Typed log-line kinds the engine understands.
///
/// Each type has a fixed set of capture fields (see [`EventType::fields`]).
/// Trigger patterns may only constrain fields that exist for their type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    ChangeZone,
    InCombat,
    AddedCombatant,
    StartsUsing,
    Ability,
    WasDefeated,
    GainsEffect,
    LosesEffect,
    HeadMarker,
    Tether,
    ActorControl,
    ActorControlExtra,
    ActorSetPos,
}

static EVENT_TYPES: phf::Map<&'static str, EventType> = phf::phf_map! {
    "ChangeZone" => EventType::ChangeZone,
    "InCombat" => EventType::InCombat,
    "AddedCombatant" => EventType::AddedCombatant,
    "StartsUsing" => EventType::StartsUsing,
    "Ability" => EventType::Ability,
    "WasDefeated" => EventType::WasDefeated,
    "GainsEffect" => EventType::GainsEffect,
    "LosesEffect" => EventType::LosesEffect,
    "HeadMarker" => EventType::HeadMarker,
    "Tether" => EventType::Tether,
    "ActorControl" => EventType::ActorControl,
    "ActorControlExtra" => EventType::ActorControlExtra,
    "ActorSetPos" => EventType::ActorSetPos,
};

const EFFECT_FIELDS: &[&str] = &[
    "effectId", "effect", "duration", "sourceId", "source", "targetId", "target", "count",
];

impl EventType {
    pub fn from_name(name: &str) -> Option<Self> {
        EVENT_TYPES.get(name).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventType::ChangeZone => "ChangeZone",
            EventType::InCombat => "InCombat",
            EventType::AddedCombatant => "AddedCombatant",
            EventType::StartsUsing => "StartsUsing",
            EventType::Ability => "Ability",
            EventType::WasDefeated => "WasDefeated",
            EventType::GainsEffect => "GainsEffect",
            EventType::LosesEffect => "LosesEffect",
            EventType::HeadMarker => "HeadMarker",
            EventType::Tether => "Tether",
            EventType::ActorControl => "ActorControl",
            EventType::ActorControlExtra => "ActorControlExtra",
            EventType::ActorSetPos => "ActorSetPos",
        }
    }

    /// Capture fields carried by this event type.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            EventType::ChangeZone => &["id", "name"],
            EventType::InCombat => &["inACTCombat", "inGameCombat"],
            EventType::AddedCombatant => &[
                "id", "name", "npcNameId", "npcBaseId", "currentHp", "maxHp", "x", "y", "z",
                "heading",
            ],
            EventType::StartsUsing => &[
                "sourceId", "source", "id", "ability", "targetId", "target", "castTime", "x", "y",
                "z", "heading",
            ],
            EventType::Ability => &[
                "sourceId", "source", "id", "ability", "targetId", "target", "flags", "damage",
                "heal", "targetCurrentHp", "targetMaxHp", "x", "y", "z", "heading", "targetX",
                "targetY", "targetCount", "targetIndex",
            ],
            EventType::WasDefeated => &["targetId", "target", "sourceId", "source"],
            EventType::GainsEffect | EventType::LosesEffect => EFFECT_FIELDS,
            EventType::HeadMarker => &["targetId", "target", "id"],
            EventType::Tether => &["sourceId", "source", "targetId", "target", "id"],
            EventType::ActorControl => &["instance", "command", "data0", "data1", "data2", "data3"],
            EventType::ActorControlExtra => {
                &["id", "category", "param1", "param2", "param3", "param4"]
            }
            EventType::ActorSetPos => &["id", "x", "y", "z", "heading"],
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields().contains(&field)
    }
}

/// Named capture bindings produced by a match (and carried by every event).
///
/// Ordered map so debug output and serialized traces are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
    fields: BTreeMap<String, String>,
}

impl Matches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert (used by the parser and tests)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Field value or empty string if absent
    pub fn field(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// Parse a numeric field (decimal). None if absent or malformed.
    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(|v| v.trim().parse::<f32>().ok())
    }

    /// Parse a decimal integer field
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.trim().parse::<i64>().ok())
    }

    /// Parse a hex field as written in the log (ids, zone ids, commands)
    pub fn get_hex(&self, key: &str) -> Option<u64> {
        let raw = self.get(key)?.trim();
        u64::from_str_radix(raw.trim_start_matches("0x"), 16).ok()
    }

    pub fn id(&self) -> &str {
        self.field("id")
    }

    pub fn source(&self) -> &str {
        self.field("source")
    }

    pub fn target(&self) -> &str {
        self.field("target")
    }

    pub fn target_id(&self) -> &str {
        self.field("targetId")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One typed, timestamped log-line event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub line_number: u64,
    pub timestamp: NaiveDateTime,
    pub event_type: EventType,
    pub fields: Matches,
}

impl LogEvent {
    pub fn new(timestamp: NaiveDateTime, event_type: EventType, fields: Matches) -> Self {
        Self {
            line_number: 0,
            timestamp,
            event_type,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_names_round_trip_through_lookup() {
        for name in ["StartsUsing", "GainsEffect", "ActorControlExtra", "WasDefeated"] {
            let ty = EventType::from_name(name).unwrap();
            assert_eq!(ty.name(), name);
        }
        assert!(EventType::from_name("NetworkBuff").is_none());
    }

    #[test]
    fn matches_parse_numeric_fields() {
        let m = Matches::new()
            .with("duration", "31.00")
            .with("count", "02")
            .with("param1", "3F");
        assert_eq!(m.get_f32("duration"), Some(31.0));
        assert_eq!(m.get_i64("count"), Some(2));
        assert_eq!(m.get_hex("param1"), Some(0x3F));
        assert_eq!(m.get_i64("param1"), None);
        assert_eq!(m.get_f32("missing"), None);
        assert_eq!(m.target(), "");
    }
}
