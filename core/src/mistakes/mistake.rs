use chrono::NaiveDateTime;
use raidwatch_types::{Lang, LocaleText, MistakeType};

use crate::death_report::DeathReport;

/// Which built-in family produced a mistake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerFamily {
    Buff,
    Damage,
    GainsEffect,
    Share,
    Solo,
    Missed,
    Multiple,
}

impl TriggerFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerFamily::Buff => "Buff",
            TriggerFamily::Damage => "Damage",
            TriggerFamily::GainsEffect => "GainsEffect",
            TriggerFamily::Share => "Share",
            TriggerFamily::Solo => "Solo",
            TriggerFamily::Missed => "Missed",
            TriggerFamily::Multiple => "Multiple",
        }
    }
}

/// Mistake text before language resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MistakeText {
    Plain(String),
    Localized(LocaleText),
}

impl MistakeText {
    pub fn resolve(&self, lang: Lang) -> String {
        match self {
            MistakeText::Plain(text) => text.clone(),
            MistakeText::Localized(text) => text.get(lang).to_string(),
        }
    }
}

impl From<&str> for MistakeText {
    fn from(text: &str) -> Self {
        MistakeText::Plain(text.to_string())
    }
}

impl From<String> for MistakeText {
    fn from(text: String) -> Self {
        MistakeText::Plain(text)
    }
}

impl From<LocaleText> for MistakeText {
    fn from(text: LocaleText) -> Self {
        MistakeText::Localized(text)
    }
}

/// A mistake as produced by a trigger, before filtering and collection.
#[derive(Debug, Clone, PartialEq)]
pub struct MistakeProposal {
    /// Key for collection policy and suppression. Defaults to the trigger id.
    pub mistake_id: Option<String>,
    pub mistake_type: MistakeType,
    pub blame: Option<String>,
    pub name: Option<String>,
    pub text: MistakeText,
    pub report_id: Option<String>,
    pub trigger_type: Option<TriggerFamily>,
}

impl MistakeProposal {
    pub fn new(mistake_type: MistakeType, text: impl Into<MistakeText>) -> Self {
        Self {
            mistake_id: None,
            mistake_type,
            blame: None,
            name: None,
            text: text.into(),
            report_id: None,
            trigger_type: None,
        }
    }

    pub fn warn(text: impl Into<MistakeText>) -> Self {
        Self::new(MistakeType::Warn, text)
    }

    pub fn fail(text: impl Into<MistakeText>) -> Self {
        Self::new(MistakeType::Fail, text)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.mistake_id = Some(id.into());
        self
    }

    pub fn blame(mut self, target: impl Into<String>) -> Self {
        let target = target.into();
        self.blame = (!target.is_empty()).then_some(target);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn family(mut self, family: TriggerFamily) -> Self {
        self.trigger_type = Some(family);
        self
    }
}

/// A pending cause of death for a target, consumed by that target's next
/// death report.
#[derive(Debug, Clone, PartialEq)]
pub struct DeathReason {
    /// Target actor id
    pub id: String,
    pub name: String,
    pub text: MistakeText,
}

impl DeathReason {
    pub fn new(id: impl Into<String>, name: impl Into<String>, text: impl Into<MistakeText>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A finalized mistake delivered to the report sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Mistake {
    pub mistake_type: MistakeType,
    /// Originating mistake map key or trigger id
    pub mistake_id: String,
    pub name: Option<String>,
    pub blame: Option<String>,
    /// Text resolved in the language active at emission
    pub text: String,
    /// Occurrences summarized (1 for immediate mistakes)
    pub count: u32,
    pub report_id: Option<String>,
    pub trigger_type: Option<TriggerFamily>,
    pub report: Option<DeathReport>,
    pub timestamp: NaiveDateTime,
}

impl Mistake {
    pub(crate) fn from_proposal(
        proposal: MistakeProposal,
        fallback_id: &str,
        lang: Lang,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            mistake_type: proposal.mistake_type,
            mistake_id: proposal
                .mistake_id
                .unwrap_or_else(|| fallback_id.to_string()),
            name: proposal.name,
            blame: proposal.blame,
            text: proposal.text.resolve(lang),
            count: 1,
            report_id: proposal.report_id,
            trigger_type: proposal.trigger_type,
            report: None,
            timestamp,
        }
    }
}
