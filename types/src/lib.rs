//! Shared configuration types for raidwatch
//!
//! This crate contains serializable types that are shared between the engine
//! (raidwatch-core), trigger-set files, and the replay CLI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Languages
// ─────────────────────────────────────────────────────────────────────────────

/// Display language for notifications, mistakes and death reports.
///
/// English is the default and the mandatory fallback for every localized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    De,
    Fr,
    Ja,
    Cn,
    Ko,
}

impl Lang {
    pub const ALL: [Lang; 6] = [Lang::En, Lang::De, Lang::Fr, Lang::Ja, Lang::Cn, Lang::Ko];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::De => "de",
            Lang::Fr => "fr",
            Lang::Ja => "ja",
            Lang::Cn => "cn",
            Lang::Ko => "ko",
        }
    }

    /// Parse a language tag (case-insensitive). Returns None for unknown tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text with a mandatory English entry and optional translations.
///
/// The default entry is a required field, so a `LocaleText` can never be
/// missing its fallback: deserializing one without `en` fails at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleText {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub de: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ja: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ko: Option<String>,
}

impl LocaleText {
    pub fn new(en: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            de: None,
            fr: None,
            ja: None,
            cn: None,
            ko: None,
        }
    }

    /// Builder-style setter for one translation
    pub fn with(mut self, lang: Lang, text: impl Into<String>) -> Self {
        let text = text.into();
        match lang {
            Lang::En => self.en = text,
            Lang::De => self.de = Some(text),
            Lang::Fr => self.fr = Some(text),
            Lang::Ja => self.ja = Some(text),
            Lang::Cn => self.cn = Some(text),
            Lang::Ko => self.ko = Some(text),
        }
        self
    }

    /// Translation for `lang`, if one exists (English always exists)
    pub fn translation(&self, lang: Lang) -> Option<&str> {
        match lang {
            Lang::En => Some(self.en.as_str()),
            Lang::De => self.de.as_deref(),
            Lang::Fr => self.fr.as_deref(),
            Lang::Ja => self.ja.as_deref(),
            Lang::Cn => self.cn.as_deref(),
            Lang::Ko => self.ko.as_deref(),
        }
    }

    /// Text for `lang`, falling back to English
    pub fn get(&self, lang: Lang) -> &str {
        self.translation(lang).unwrap_or(&self.en)
    }
}

impl From<&str> for LocaleText {
    fn from(en: &str) -> Self {
        Self::new(en)
    }
}

impl From<String> for LocaleText {
    fn from(en: String) -> Self {
        Self::new(en)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Roles & Mistake Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tank,
    Healer,
    Dps,
    #[default]
    None,
}

impl Role {
    /// Tanks and healers
    pub fn is_support(&self) -> bool {
        matches!(self, Role::Tank | Role::Healer)
    }
}

/// Severity/category of a finalized mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MistakeType {
    Pull,
    Warn,
    Fail,
    Potion,
    Death,
    Wipe,
    Damage,
    Heal,
    Good,
}

impl MistakeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MistakeType::Pull => "pull",
            MistakeType::Warn => "warn",
            MistakeType::Fail => "fail",
            MistakeType::Potion => "potion",
            MistakeType::Death => "death",
            MistakeType::Wipe => "wipe",
            MistakeType::Damage => "damage",
            MistakeType::Heal => "heal",
            MistakeType::Good => "good",
        }
    }
}

impl fmt::Display for MistakeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mistake Maps
// ─────────────────────────────────────────────────────────────────────────────

/// `onlyForRole` accepts one role or a list of roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleFilter {
    One(Role),
    Many(Vec<Role>),
}

impl RoleFilter {
    pub fn contains(&self, role: Role) -> bool {
        match self {
            RoleFilter::One(r) => *r == role,
            RoleFilter::Many(roles) => roles.contains(&role),
        }
    }
}

/// Details for an immediate mistake map entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MistakeDetails {
    /// Ability or effect id (hex, as it appears in the log)
    pub id: String,
    /// Only a mistake if the player has one of these roles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_for_role: Option<RoleFilter>,
    /// Override the default text (ability/effect name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<LocaleText>,
}

/// Details for a collected ("missed"/"multiple") mistake map entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectMistakeDetails {
    #[serde(flatten)]
    pub details: MistakeDetails,
    /// Time to collect occurrences before reporting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collect_seconds: Option<f32>,
    /// Time after a report until the same mistake can be collected again
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_seconds: Option<f32>,
    /// Number of occurrences in a window before a mistake is reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<i32>,
}

/// A mistake map value: either a bare id or a details record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MistakeEntry {
    Id(String),
    Details(MistakeDetails),
}

impl MistakeEntry {
    pub fn into_details(self) -> MistakeDetails {
        match self {
            MistakeEntry::Id(id) => MistakeDetails {
                id,
                only_for_role: None,
                text: None,
            },
            MistakeEntry::Details(details) => details,
        }
    }
}

/// A collected mistake map value: either a bare id or a details record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectMistakeEntry {
    Id(String),
    Details(CollectMistakeDetails),
}

impl CollectMistakeEntry {
    pub fn into_details(self) -> CollectMistakeDetails {
        match self {
            CollectMistakeEntry::Id(id) => CollectMistakeDetails {
                details: MistakeDetails {
                    id,
                    only_for_role: None,
                    text: None,
                },
                collect_seconds: None,
                suppress_seconds: None,
                min_count: None,
            },
            CollectMistakeEntry::Details(details) => details,
        }
    }
}

/// Mistake identifier → entry. Ordered so generated triggers are deterministic.
pub type MistakeMap = BTreeMap<String, MistakeEntry>;
pub type CollectMistakeMap = BTreeMap<String, CollectMistakeEntry>;

/// All mistake maps a trigger set may declare.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MistakeMaps {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub damage_warn: MistakeMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub damage_fail: MistakeMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub gains_effect_warn: MistakeMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub gains_effect_fail: MistakeMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub share_warn: MistakeMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub share_fail: MistakeMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub solo_warn: MistakeMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub solo_fail: MistakeMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub missed_warn: CollectMistakeMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub missed_fail: CollectMistakeMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub multiple_warn: CollectMistakeMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub multiple_fail: CollectMistakeMap,
}

impl MistakeMaps {
    pub fn is_empty(&self) -> bool {
        self.damage_warn.is_empty()
            && self.damage_fail.is_empty()
            && self.gains_effect_warn.is_empty()
            && self.gains_effect_fail.is_empty()
            && self.share_warn.is_empty()
            && self.share_fail.is_empty()
            && self.solo_warn.is_empty()
            && self.solo_fail.is_empty()
            && self.missed_warn.is_empty()
            && self.missed_fail.is_empty()
            && self.multiple_warn.is_empty()
            && self.multiple_fail.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Trigger Set Options
// ─────────────────────────────────────────────────────────────────────────────

/// One selectable value of a [`SetOption`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOptionChoice {
    pub label: LocaleText,
    pub value: String,
}

/// A user setting declared by a trigger set (a strategy choice, for example).
/// Triggers read the selected value at run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOption {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocaleText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<LocaleText>,
    pub choices: Vec<SetOptionChoice>,
    pub default: String,
}

impl SetOption {
    pub fn new(id: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            comment: None,
            choices: Vec::new(),
            default: default.into(),
        }
    }

    pub fn name(mut self, name: impl Into<LocaleText>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<LocaleText>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn choice(mut self, label: impl Into<LocaleText>, value: impl Into<String>) -> Self {
        self.choices.push(SetOptionChoice {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.choices.iter().any(|c| c.value == value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// A party member as configured by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyMemberConfig {
    /// Actor id as it appears in the log (hex)
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    /// Short display name (nickname)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
}

/// Engine settings persisted between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub language: Lang,

    /// Name of the local player ("me")
    #[serde(default)]
    pub player_name: String,

    #[serde(default)]
    pub party: Vec<PartyMemberConfig>,

    /// Events older than this (relative to a death) are left out of the report
    #[serde(default = "default_death_report_retention_secs")]
    pub death_report_retention_secs: f32,

    /// Maximum number of tracked events kept per target
    #[serde(default = "default_death_report_capacity")]
    pub death_report_capacity: usize,

    /// Selected set option values: set id → option id → value
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_options: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            language: Lang::default(),
            player_name: String::new(),
            party: Vec::new(),
            death_report_retention_secs: default_death_report_retention_secs(),
            death_report_capacity: default_death_report_capacity(),
            set_options: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Role of the configured local player (None if not in the party list)
    pub fn player_role(&self) -> Role {
        self.party
            .iter()
            .find(|m| m.name == self.player_name)
            .map(|m| m.role)
            .unwrap_or_default()
    }

    /// Select `value` for a set option
    pub fn select_option(
        &mut self,
        set_id: impl Into<String>,
        option_id: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.set_options
            .entry(set_id.into())
            .or_default()
            .insert(option_id.into(), value.into());
    }
}

fn default_death_report_retention_secs() -> f32 {
    15.0
}

fn default_death_report_capacity() -> usize {
    64
}
