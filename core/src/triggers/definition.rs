//! Trigger definitions
//!
//! A trigger pairs a pattern with callbacks. Every callback receives the
//! encounter [`Data`] and the match bindings; output callbacks also get an
//! [`Output`] resolver bound to the trigger's strings.

use std::collections::BTreeMap;
use std::fmt;

use raidwatch_types::{Lang, LocaleText};

use super::{Data, Pattern};
use crate::combat_log::Matches;
use crate::mistakes::{DeathReason, MistakeProposal};
use crate::output::{Output, OutputError, OutputStrings};

// ═══════════════════════════════════════════════════════════════════════════
// Callback Types
// ═══════════════════════════════════════════════════════════════════════════

pub type ConditionFn<S> = Box<dyn Fn(&Data<S>, &Matches) -> bool>;
pub type SecondsFn<S> = Box<dyn Fn(&Data<S>, &Matches) -> Option<f32>>;
pub type PromiseFn<S> = Box<dyn Fn(&mut Data<S>, &Matches) -> bool>;
pub type RunFn<S> = Box<dyn Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<(), OutputError>>;
pub type TextFn<S> =
    Box<dyn Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<String>, OutputError>>;
pub type ResponseFn<S> =
    Box<dyn Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<Alert>, OutputError>>;
pub type MistakeFn<S> =
    Box<dyn Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Vec<MistakeProposal>, OutputError>>;
pub type DeathReasonFn<S> = Box<dyn Fn(&mut Data<S>, &Matches) -> Option<DeathReason>>;

/// Notification urgency, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Alarm,
    Alert,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Alarm => "alarm",
            Severity::Alert => "alert",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity-tagged text returned by a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub severity: Severity,
    pub text: String,
}

impl Alert {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }
}

/// A static or per-match number of seconds
pub enum Seconds<S> {
    Fixed(f32),
    Computed(SecondsFn<S>),
}

impl<S> Seconds<S> {
    pub fn resolve(&self, data: &Data<S>, matches: &Matches) -> Option<f32> {
        match self {
            Seconds::Fixed(secs) => Some(*secs),
            Seconds::Computed(f) => f(data, matches),
        }
    }
}

impl<S> fmt::Debug for Seconds<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seconds::Fixed(secs) => write!(f, "Fixed({secs})"),
            Seconds::Computed(_) => f.write_str("Computed"),
        }
    }
}

/// The single output shape of a trigger
pub enum TriggerOutput<S> {
    None,
    Text { severity: Severity, produce: TextFn<S> },
    Response(ResponseFn<S>),
    Mistake(MistakeFn<S>),
    DeathReason(DeathReasonFn<S>),
}

impl<S> TriggerOutput<S> {
    pub fn kind(&self) -> &'static str {
        match self {
            TriggerOutput::None => "none",
            TriggerOutput::Text {
                severity: Severity::Alarm,
                ..
            } => "alarm_text",
            TriggerOutput::Text {
                severity: Severity::Alert,
                ..
            } => "alert_text",
            TriggerOutput::Text {
                severity: Severity::Info,
                ..
            } => "info_text",
            TriggerOutput::Response(_) => "response",
            TriggerOutput::Mistake(_) => "mistake",
            TriggerOutput::DeathReason(_) => "death_reason",
        }
    }
}

/// Which firings share a suppression deadline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SuppressionScope {
    /// One deadline for the whole trigger
    #[default]
    Global,
    /// One deadline per value of a capture field (e.g. `target`)
    ByField(String),
}

// ═══════════════════════════════════════════════════════════════════════════
// Trigger
// ═══════════════════════════════════════════════════════════════════════════

pub struct Trigger<S> {
    pub id: String,
    pub pattern: Pattern,
    /// Per-language pattern variants (e.g. translated actor names)
    pub localized_patterns: BTreeMap<Lang, Pattern>,
    pub comment: Option<LocaleText>,
    pub disabled: bool,
    pub condition: Option<ConditionFn<S>>,
    pub delay_seconds: Option<Seconds<S>>,
    pub suppress_seconds: Option<Seconds<S>>,
    pub suppression_scope: SuppressionScope,
    pub duration_seconds: Option<Seconds<S>>,
    pub countdown_seconds: Option<Seconds<S>>,
    pub promise: Option<PromiseFn<S>>,
    pub run: Option<RunFn<S>>,
    pub output: TriggerOutput<S>,
    pub output_strings: OutputStrings,
    /// Output kinds set after the first one; rejected at registration
    overridden_outputs: Vec<&'static str>,
}

impl<S> Trigger<S> {
    pub fn new(id: impl Into<String>, pattern: Pattern) -> Self {
        Self {
            id: id.into(),
            pattern,
            localized_patterns: BTreeMap::new(),
            comment: None,
            disabled: false,
            condition: None,
            delay_seconds: None,
            suppress_seconds: None,
            suppression_scope: SuppressionScope::Global,
            duration_seconds: None,
            countdown_seconds: None,
            promise: None,
            run: None,
            output: TriggerOutput::None,
            output_strings: OutputStrings::new(),
            overridden_outputs: Vec::new(),
        }
    }

    pub fn localized(mut self, lang: Lang, pattern: Pattern) -> Self {
        self.localized_patterns.insert(lang, pattern);
        self
    }

    /// Pattern to match when `lang` is the active language
    pub fn pattern_for(&self, lang: Lang) -> &Pattern {
        self.localized_patterns.get(&lang).unwrap_or(&self.pattern)
    }

    pub fn comment(mut self, comment: impl Into<LocaleText>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn condition<F>(mut self, f: F) -> Self
    where
        F: Fn(&Data<S>, &Matches) -> bool + 'static,
    {
        self.condition = Some(Box::new(f));
        self
    }

    pub fn delay(mut self, secs: f32) -> Self {
        self.delay_seconds = Some(Seconds::Fixed(secs));
        self
    }

    pub fn delay_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Data<S>, &Matches) -> Option<f32> + 'static,
    {
        self.delay_seconds = Some(Seconds::Computed(Box::new(f)));
        self
    }

    pub fn suppress(mut self, secs: f32) -> Self {
        self.suppress_seconds = Some(Seconds::Fixed(secs));
        self
    }

    pub fn suppress_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Data<S>, &Matches) -> Option<f32> + 'static,
    {
        self.suppress_seconds = Some(Seconds::Computed(Box::new(f)));
        self
    }

    /// Track suppression separately per value of `field`
    pub fn suppress_by(mut self, field: impl Into<String>) -> Self {
        self.suppression_scope = SuppressionScope::ByField(field.into());
        self
    }

    pub fn duration(mut self, secs: f32) -> Self {
        self.duration_seconds = Some(Seconds::Fixed(secs));
        self
    }

    pub fn duration_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Data<S>, &Matches) -> Option<f32> + 'static,
    {
        self.duration_seconds = Some(Seconds::Computed(Box::new(f)));
        self
    }

    pub fn countdown(mut self, secs: f32) -> Self {
        self.countdown_seconds = Some(Seconds::Fixed(secs));
        self
    }

    pub fn countdown_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Data<S>, &Matches) -> Option<f32> + 'static,
    {
        self.countdown_seconds = Some(Seconds::Computed(Box::new(f)));
        self
    }

    /// Gate evaluated at fire time, after any delay. False drops the firing.
    pub fn promise<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Data<S>, &Matches) -> bool + 'static,
    {
        self.promise = Some(Box::new(f));
        self
    }

    pub fn run<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<(), OutputError> + 'static,
    {
        self.run = Some(Box::new(f));
        self
    }

    pub fn alarm_text<F>(self, f: F) -> Self
    where
        F: Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<String>, OutputError>
            + 'static,
    {
        self.text(Severity::Alarm, Box::new(f))
    }

    pub fn alert_text<F>(self, f: F) -> Self
    where
        F: Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<String>, OutputError>
            + 'static,
    {
        self.text(Severity::Alert, Box::new(f))
    }

    pub fn info_text<F>(self, f: F) -> Self
    where
        F: Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<String>, OutputError>
            + 'static,
    {
        self.text(Severity::Info, Box::new(f))
    }

    /// Text output that always resolves the same key
    pub fn text_key(self, severity: Severity, key: impl Into<String>) -> Self
    where
        S: 'static,
    {
        let key = key.into();
        self.text(
            severity,
            Box::new(move |_: &mut Data<S>, _: &Matches, output: &Output<'_>| {
                output.text(&key).map(Some)
            }),
        )
    }

    pub fn text(self, severity: Severity, produce: TextFn<S>) -> Self {
        self.set_output(TriggerOutput::Text { severity, produce })
    }

    pub fn response<F>(self, f: F) -> Self
    where
        F: Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<Alert>, OutputError>
            + 'static,
    {
        self.set_output(TriggerOutput::Response(Box::new(f)))
    }

    pub fn mistake<F>(self, f: F) -> Self
    where
        F: Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Vec<MistakeProposal>, OutputError>
            + 'static,
    {
        self.set_output(TriggerOutput::Mistake(Box::new(f)))
    }

    pub fn death_reason<F>(self, f: F) -> Self
    where
        F: Fn(&mut Data<S>, &Matches) -> Option<DeathReason> + 'static,
    {
        self.set_output(TriggerOutput::DeathReason(Box::new(f)))
    }

    pub fn output_string(mut self, key: impl Into<String>, text: impl Into<LocaleText>) -> Self {
        self.output_strings.insert(key, text);
        self
    }

    pub fn output_strings(mut self, strings: OutputStrings) -> Self {
        self.output_strings = strings;
        self
    }

    fn set_output(mut self, output: TriggerOutput<S>) -> Self {
        if !matches!(self.output, TriggerOutput::None) {
            self.overridden_outputs.push(output.kind());
        }
        if self.overridden_outputs.is_empty() {
            self.output = output;
        }
        self
    }

    /// Output kinds declared, first one first. More than one is an error.
    pub fn declared_outputs(&self) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        if !matches!(self.output, TriggerOutput::None) {
            kinds.push(self.output.kind());
        }
        kinds.extend(self.overridden_outputs.iter().copied());
        kinds
    }
}

impl<S> fmt::Debug for Trigger<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("id", &self.id)
            .field("event_type", &self.pattern.event_type())
            .field("disabled", &self.disabled)
            .field("delay_seconds", &self.delay_seconds)
            .field("suppress_seconds", &self.suppress_seconds)
            .field("suppression_scope", &self.suppression_scope)
            .field("output", &self.output.kind())
            .finish_non_exhaustive()
    }
}
