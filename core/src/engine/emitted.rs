use chrono::NaiveDateTime;

use crate::mistakes::Mistake;
use crate::triggers::Severity;

/// A text notification for the player
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub trigger_id: String,
    pub severity: Severity,
    pub text: String,
    pub timestamp: NaiveDateTime,
    /// How long to display the text
    pub duration_secs: Option<f32>,
    /// Countdown to show alongside the text
    pub countdown_secs: Option<f32>,
}

/// Everything the engine produces, in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum Emitted {
    Notification(Notification),
    Mistake(Mistake),
}

impl Emitted {
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            Emitted::Notification(n) => n.timestamp,
            Emitted::Mistake(m) => m.timestamp,
        }
    }

    pub fn as_notification(&self) -> Option<&Notification> {
        match self {
            Emitted::Notification(n) => Some(n),
            Emitted::Mistake(_) => None,
        }
    }

    pub fn as_mistake(&self) -> Option<&Mistake> {
        match self {
            Emitted::Mistake(m) => Some(m),
            Emitted::Notification(_) => None,
        }
    }

    pub fn dispatch(&self, sink: &mut dyn ReportSink) {
        match self {
            Emitted::Notification(n) => sink.on_notification(n),
            Emitted::Mistake(m) => sink.on_mistake(m),
        }
    }
}

/// Receives engine output (display layer, report writer, test recorder)
pub trait ReportSink {
    fn on_notification(&mut self, notification: &Notification);

    fn on_mistake(&mut self, mistake: &Mistake);

    /// Called when a trigger set becomes active for a zone
    fn on_set_activated(&mut self, _set_id: &str) {}
}
