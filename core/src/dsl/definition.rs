//! Trigger-set file types
//!
//! A file holds one data-only trigger set:
//!
//! ```toml
//! [set]
//! id = "FuturesRewrittenUltimate.Mistakes"
//! zone_ids = [1238]
//!
//! [[set.option]]
//! id = "callouts"
//! default = "full"
//! choices = [{ label = "Full", value = "full" }, { label = "Minimal", value = "minimal" }]
//!
//! [mistakes.damage_warn]
//! "FRU Cyclonic Break" = "9CD0"
//!
//! [[trigger]]
//! id = "FRU P2 Diamond Dust"
//! type = "StartsUsing"
//! fields = { id = "9D05", source = "Usurper of Frost" }
//! response = "big_aoe"
//! when_option = { callouts = "full" }
//! ```

use std::collections::BTreeMap;

use raidwatch_types::{Lang, LocaleText, MistakeMaps, MistakeType, SetOption};
use serde::{Deserialize, Serialize};

use super::DslError;
use crate::combat_log::{EventType, Matches};
use crate::mistakes::{DeathReason, MistakeProposal, MistakeText};
use crate::output::Output;
use crate::triggers::{
    Data, FieldSpec, Pattern, Severity, TextFn, Trigger, TriggerSet, conditions, responses,
};

// ═══════════════════════════════════════════════════════════════════════════
// File Structure
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerSetFile {
    pub set: SetHeader,

    #[serde(default, skip_serializing_if = "MistakeMaps::is_empty")]
    pub mistakes: MistakeMaps,

    #[serde(default, rename = "trigger", skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<TriggerDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetHeader {
    pub id: String,

    /// Empty applies the set to every zone
    #[serde(default)]
    pub zone_ids: Vec<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_label: Option<TextDef>,

    #[serde(default, rename = "option", skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SetOptionDef>,
}

/// `[[set.option]]`: a select option with its choices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOptionDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<TextDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<TextDef>,
    pub choices: Vec<ChoiceDef>,
    pub default: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceDef {
    pub label: TextDef,
    pub value: String,
}

impl SetOptionDef {
    pub fn to_option(&self) -> SetOption {
        let mut option = self
            .choices
            .iter()
            .fold(SetOption::new(self.id.clone(), self.default.clone()), |option, choice| {
                option.choice(choice.label.to_locale(), choice.value.clone())
            });
        if let Some(name) = &self.name {
            option = option.name(name.to_locale());
        }
        if let Some(comment) = &self.comment {
            option = option.comment(comment.to_locale());
        }
        option
    }
}

/// Plain English text or a table of translations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextDef {
    Plain(String),
    Localized(LocaleText),
}

impl TextDef {
    pub fn to_locale(&self) -> LocaleText {
        match self {
            TextDef::Plain(text) => LocaleText::new(text.as_str()),
            TextDef::Localized(text) => text.clone(),
        }
    }
}

/// Field constraint: exact value, list of values, or `{ regex = "..." }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldDef {
    Exact(String),
    AnyOf(Vec<String>),
    Regex { regex: String },
}

impl From<&FieldDef> for FieldSpec {
    fn from(def: &FieldDef) -> Self {
        match def {
            FieldDef::Exact(value) => FieldSpec::Exact(value.clone()),
            FieldDef::AnyOf(values) => FieldSpec::AnyOf(values.clone()),
            FieldDef::Regex { regex } => FieldSpec::Regex(regex.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MistakeDef {
    #[serde(rename = "type")]
    pub mistake_type: MistakeType,

    /// Defaults to the ability (or effect) name from the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextDef>,

    /// Capture field naming the blamed player
    #[serde(default = "default_blame")]
    pub blame: String,

    /// Collector id; defaults to the trigger id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

fn default_blame() -> String {
    "target".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathReasonDef {
    pub text: TextDef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDef {
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub fields: BTreeMap<String, FieldDef>,

    /// Per-language replacements for `fields`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub localized_fields: BTreeMap<Lang, BTreeMap<String, FieldDef>>,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<TextDef>,

    /// Name from the conditions library
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Set option id → value that must be selected for the trigger to run
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub when_option: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_seconds: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown_seconds: Option<f32>,

    /// Output key shown as an alarm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,

    /// Placeholder name → capture field, for alarm/alert/info templates
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,

    /// Name from the responses library
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mistake: Option<MistakeDef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_reason: Option<DeathReasonDef>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub output_strings: BTreeMap<String, TextDef>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Conversion
// ═══════════════════════════════════════════════════════════════════════════

impl TriggerSetFile {
    /// Build a runnable set. Pattern and output validation happens when the
    /// set is compiled.
    pub fn build(&self) -> Result<TriggerSet<()>, DslError> {
        let mut set = TriggerSet::new(self.set.id.clone()).mistakes(self.mistakes.clone());
        for zone_id in &self.set.zone_ids {
            set = set.zone(*zone_id);
        }
        if let Some(label) = &self.set.zone_label {
            set = set.zone_label(label.to_locale());
        }
        let options: Vec<SetOption> = self.set.options.iter().map(SetOptionDef::to_option).collect();
        for def in &self.triggers {
            def.check_options(&options)?;
            set = set.trigger(def.build()?);
        }
        for option in options {
            set = set.with_option(option);
        }
        Ok(set)
    }
}

impl TriggerDef {
    fn invalid(&self, reason: String) -> DslError {
        DslError::InvalidTrigger {
            trigger: self.id.clone(),
            reason,
        }
    }

    fn check_options(&self, options: &[SetOption]) -> Result<(), DslError> {
        for (id, value) in &self.when_option {
            let option = options
                .iter()
                .find(|o| o.id == *id)
                .ok_or_else(|| self.invalid(format!("unknown set option '{id}'")))?;
            if !option.accepts(value) {
                return Err(self.invalid(format!("'{value}' is not a choice of option '{id}'")));
            }
        }
        Ok(())
    }

    pub fn build(&self) -> Result<Trigger<()>, DslError> {
        let event_type = EventType::from_name(&self.event_type)
            .ok_or_else(|| self.invalid(format!("unknown event type '{}'", self.event_type)))?;

        let mut trigger =
            Trigger::new(self.id.clone(), pattern(event_type, &self.fields)).disabled(self.disabled);
        for (lang, fields) in &self.localized_fields {
            trigger = trigger.localized(*lang, pattern(event_type, fields));
        }
        if let Some(comment) = &self.comment {
            trigger = trigger.comment(comment.to_locale());
        }
        let named = self
            .condition
            .as_ref()
            .map(|name| {
                conditions::by_name::<()>(name)
                    .ok_or_else(|| self.invalid(format!("unknown condition '{name}'")))
            })
            .transpose()?;
        if self.when_option.is_empty() {
            if let Some(condition) = named {
                trigger = trigger.condition(condition);
            }
        } else {
            let required = self.when_option.clone();
            trigger = trigger.condition(move |data: &Data<()>, matches: &Matches| {
                required
                    .iter()
                    .all(|(id, value)| data.set_option(id) == Some(value.as_str()))
                    && named.as_ref().is_none_or(|condition| condition(data, matches))
            });
        }

        if let Some(secs) = self.delay_seconds {
            trigger = trigger.delay(secs);
        }
        if let Some(secs) = self.suppress_seconds {
            trigger = trigger.suppress(secs);
        }
        if let Some(field) = &self.suppress_by {
            trigger = trigger.suppress_by(field.clone());
        }
        if let Some(secs) = self.duration_seconds {
            trigger = trigger.duration(secs);
        }
        if let Some(secs) = self.countdown_seconds {
            trigger = trigger.countdown(secs);
        }
        for (key, text) in &self.output_strings {
            trigger = trigger.output_string(key.clone(), text.to_locale());
        }

        // Declaring several is allowed here; compile rejects the conflict
        let texts = [
            (Severity::Alarm, &self.alarm),
            (Severity::Alert, &self.alert),
            (Severity::Info, &self.info),
        ];
        for (severity, key) in texts {
            if let Some(key) = key {
                trigger = trigger.text(severity, keyed_text(key.clone(), self.params.clone()));
            }
        }
        if let Some(name) = &self.response {
            let response = responses::by_name::<()>(name)
                .ok_or_else(|| self.invalid(format!("unknown response '{name}'")))?;
            trigger = trigger.response(response);
        }
        if let Some(mistake) = &self.mistake {
            trigger = with_mistake(trigger, event_type, mistake.clone());
        }
        if let Some(reason) = &self.death_reason {
            let text = reason.text.to_locale();
            trigger = trigger.death_reason(move |_: &mut Data<()>, matches: &Matches| {
                Some(DeathReason::new(
                    matches.target_id(),
                    matches.target(),
                    MistakeText::Localized(text.clone()),
                ))
            });
        }

        Ok(trigger)
    }
}

fn pattern(event_type: EventType, fields: &BTreeMap<String, FieldDef>) -> Pattern {
    fields
        .iter()
        .fold(Pattern::new(event_type), |pattern, (name, def)| {
            pattern.field(name.clone(), FieldSpec::from(def))
        })
}

/// Text output resolving `key`, with placeholders filled from capture fields.
/// Player names are shortened to their display names.
fn keyed_text(key: String, params: BTreeMap<String, String>) -> TextFn<()> {
    Box::new(move |data: &mut Data<()>, matches: &Matches, output: &Output<'_>| {
        if params.is_empty() {
            return output.text(&key).map(Some);
        }
        let values: Vec<(&str, &str)> = params
            .iter()
            .map(|(name, field)| (name.as_str(), data.short_name(matches.field(field))))
            .collect();
        output.format(&key, &values).map(Some)
    })
}

fn with_mistake(trigger: Trigger<()>, event_type: EventType, def: MistakeDef) -> Trigger<()> {
    let name_field = match event_type {
        EventType::GainsEffect | EventType::LosesEffect => "effect",
        _ => "ability",
    };
    let text = def.text.as_ref().map(TextDef::to_locale);

    trigger.mistake(move |_: &mut Data<()>, matches: &Matches, _: &Output<'_>| {
        let text = match &text {
            Some(text) => MistakeText::Localized(text.clone()),
            None => MistakeText::Plain(matches.field(name_field).to_string()),
        };
        let mut proposal =
            MistakeProposal::new(def.mistake_type, text).blame(matches.field(&def.blame));
        if let Some(id) = &def.id {
            proposal = proposal.with_id(id.clone());
        }
        Ok(vec![proposal])
    })
}
