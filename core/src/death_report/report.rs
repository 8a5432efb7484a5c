use chrono::NaiveDateTime;
use raidwatch_types::{Lang, MistakeType};

#[derive(Debug, Clone, PartialEq)]
pub enum TrackedEventKind {
    Damage {
        ability_id: String,
        ability: String,
        source: String,
        amount: i64,
    },
    Heal {
        ability: String,
        source: String,
        amount: i64,
    },
    GainsEffect {
        effect_id: String,
        effect: String,
        source: String,
        duration_secs: f32,
    },
    LosesEffect {
        effect_id: String,
        effect: String,
    },
    Mistake {
        mistake_type: MistakeType,
        text: String,
    },
    Death {
        source: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEvent {
    pub timestamp: NaiveDateTime,
    pub kind: TrackedEventKind,
}

impl TrackedEvent {
    pub fn new(timestamp: NaiveDateTime, kind: TrackedEventKind) -> Self {
        Self { timestamp, kind }
    }
}

/// Events leading up to one death, oldest first, ending with the death.
#[derive(Debug, Clone, PartialEq)]
pub struct DeathReport {
    pub lang: Lang,
    /// Pull start, if the death happened during a pull
    pub base_timestamp: Option<NaiveDateTime>,
    pub death_timestamp: NaiveDateTime,
    pub target_id: String,
    pub target_name: String,
    pub events: Vec<TrackedEvent>,
}

impl DeathReport {
    /// Most recent damage taken before the death
    pub fn last_damage(&self) -> Option<(&str, i64)> {
        self.events.iter().rev().find_map(|e| match &e.kind {
            TrackedEventKind::Damage {
                ability, amount, ..
            } => Some((ability.as_str(), *amount)),
            _ => None,
        })
    }

    /// Seconds from the pull start (or the death, if no pull) to `at`
    pub fn relative_secs(&self, at: NaiveDateTime) -> f32 {
        let base = self.base_timestamp.unwrap_or(self.death_timestamp);
        at.signed_duration_since(base).num_milliseconds() as f32 / 1000.0
    }
}
