//! Checkpoint-based replay verification
//!
//! An expectations file lists checkpoints at times relative to the first
//! pull. At each checkpoint the named notifications and mistakes must have
//! been emitted, and the `absent` triggers must not have fired.

use chrono::NaiveDateTime;
use raidwatch_core::{Mistake, Notification};
use raidwatch_types::MistakeType;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A notification that should have been shown. Unset fields match anything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedNotification {
    #[serde(default)]
    pub trigger: Option<String>,

    #[serde(default)]
    pub text: Option<String>,
}

impl ExpectedNotification {
    fn matches(&self, seen: &Notification) -> bool {
        self.trigger.as_ref().is_none_or(|id| *id == seen.trigger_id)
            && self.text.as_ref().is_none_or(|text| *text == seen.text)
    }
}

impl std::fmt::Display for ExpectedNotification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.trigger, &self.text) {
            (Some(id), Some(text)) => write!(f, "'{}' from '{}'", text, id),
            (Some(id), None) => write!(f, "output from '{}'", id),
            (None, Some(text)) => write!(f, "'{}'", text),
            (None, None) => write!(f, "any notification"),
        }
    }
}

/// A mistake that should have been reported. Unset fields match anything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedMistake {
    #[serde(default, rename = "type")]
    pub mistake_type: Option<MistakeType>,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub blame: Option<String>,

    #[serde(default)]
    pub count: Option<u32>,
}

impl ExpectedMistake {
    fn matches(&self, seen: &Mistake) -> bool {
        self.mistake_type.is_none_or(|ty| ty == seen.mistake_type)
            && self.id.as_ref().is_none_or(|id| *id == seen.mistake_id)
            && self
                .blame
                .as_ref()
                .is_none_or(|blame| seen.blame.as_deref() == Some(blame.as_str()))
            && self.count.is_none_or(|count| count == seen.count)
    }
}

impl std::fmt::Display for ExpectedMistake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ty = self.mistake_type.map(|ty| ty.as_str()).unwrap_or("any");
        write!(f, "{} mistake", ty)?;
        if let Some(id) = &self.id {
            write!(f, " '{}'", id)?;
        }
        if let Some(blame) = &self.blame {
            write!(f, " on {}", blame)?;
        }
        if let Some(count) = self.count {
            write!(f, " (x{})", count)?;
        }
        Ok(())
    }
}

/// Expected state at a pull-relative time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Seconds after the first pull
    pub at_secs: f32,

    #[serde(default)]
    pub notifications: Vec<ExpectedNotification>,

    #[serde(default)]
    pub mistakes: Vec<ExpectedMistake>,

    /// Trigger ids that must not have fired by this time
    #[serde(default)]
    pub absent: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Full expectations file for one recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expectations {
    pub meta: ExpectationsMeta,

    #[serde(rename = "checkpoint")]
    pub checkpoints: Vec<Checkpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectationsMeta {
    /// Trigger set the recording was made for
    pub set_id: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Tolerance in seconds for checkpoint times (default 0.5)
    #[serde(default = "default_tolerance")]
    pub tolerance_secs: f32,
}

fn default_tolerance() -> f32 {
    0.5
}

impl Expectations {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let expectations: Expectations = toml::from_str(&content)?;
        Ok(expectations)
    }
}

#[derive(Debug, Clone)]
pub struct CheckpointResult {
    pub checkpoint_idx: usize,
    pub at_secs: f32,
    pub passed: bool,
    pub failures: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub checkpoints_passed: u32,
    pub checkpoints_total: u32,
    pub results: Vec<CheckpointResult>,
}

impl VerificationResult {
    pub fn passed(&self) -> bool {
        self.checkpoints_passed == self.checkpoints_total
    }
}

/// Records replay output and checks it against the expectations in order
#[derive(Debug)]
pub struct CheckpointVerifier {
    expectations: Expectations,
    current_checkpoint_idx: usize,
    results: Vec<CheckpointResult>,

    /// Start of the first pull; checkpoints are relative to it
    origin: Option<NaiveDateTime>,

    notifications: Vec<Notification>,
    mistakes: Vec<Mistake>,
}

impl CheckpointVerifier {
    pub fn new(expectations: Expectations) -> Self {
        Self {
            expectations,
            current_checkpoint_idx: 0,
            results: Vec::new(),
            origin: None,
            notifications: Vec::new(),
            mistakes: Vec::new(),
        }
    }

    pub fn set_id(&self) -> &str {
        &self.expectations.meta.set_id
    }

    pub fn record_notification(&mut self, notification: &Notification) {
        self.notifications.push(notification.clone());
    }

    pub fn record_mistake(&mut self, mistake: &Mistake) {
        if mistake.mistake_type == MistakeType::Pull && self.origin.is_none() {
            self.origin = Some(mistake.timestamp);
        }
        self.mistakes.push(mistake.clone());
    }

    /// Verify the next checkpoint if `now` has reached it. Call repeatedly
    /// until it returns `None`.
    pub fn check_time(&mut self, now: NaiveDateTime) -> Option<CheckpointResult> {
        let origin = self.origin?;
        let checkpoint = self.expectations.checkpoints.get(self.current_checkpoint_idx)?;
        let elapsed = (now - origin).num_milliseconds() as f32 / 1000.0;
        if elapsed < checkpoint.at_secs + self.expectations.meta.tolerance_secs {
            return None;
        }
        Some(self.verify_current(origin))
    }

    /// Verify every checkpoint the replay never reached
    pub fn finalize(mut self) -> VerificationResult {
        while self.current_checkpoint_idx < self.expectations.checkpoints.len() {
            match self.origin {
                Some(origin) => {
                    self.verify_current(origin);
                }
                None => {
                    let checkpoint = &self.expectations.checkpoints[self.current_checkpoint_idx];
                    self.results.push(CheckpointResult {
                        checkpoint_idx: self.current_checkpoint_idx,
                        at_secs: checkpoint.at_secs,
                        passed: false,
                        failures: vec!["No pull started in the recording".to_string()],
                    });
                    self.current_checkpoint_idx += 1;
                }
            }
        }

        let passed = self.results.iter().filter(|r| r.passed).count() as u32;
        let total = self.results.len() as u32;

        VerificationResult {
            checkpoints_passed: passed,
            checkpoints_total: total,
            results: self.results,
        }
    }

    /// Checkpoints verified so far
    pub fn checked(&self) -> usize {
        self.current_checkpoint_idx
    }

    pub fn is_complete(&self) -> bool {
        self.current_checkpoint_idx >= self.expectations.checkpoints.len()
    }

    fn verify_current(&mut self, origin: NaiveDateTime) -> CheckpointResult {
        let checkpoint = &self.expectations.checkpoints[self.current_checkpoint_idx];
        let tolerance = self.expectations.meta.tolerance_secs;
        let deadline = chrono::TimeDelta::try_milliseconds(((checkpoint.at_secs + tolerance) * 1000.0) as i64)
            .and_then(|offset| origin.checked_add_signed(offset))
            .unwrap_or(NaiveDateTime::MAX);

        let notifications: Vec<&Notification> = self
            .notifications
            .iter()
            .filter(|n| n.timestamp <= deadline)
            .collect();
        let mistakes: Vec<&Mistake> = self
            .mistakes
            .iter()
            .filter(|m| m.timestamp <= deadline)
            .collect();

        let mut failures = Vec::new();

        for expected in &checkpoint.notifications {
            if !notifications.iter().any(|seen| expected.matches(seen)) {
                failures.push(format!("Expected {} but it was not shown", expected));
            }
        }

        for expected in &checkpoint.mistakes {
            if !mistakes.iter().any(|seen| expected.matches(seen)) {
                failures.push(format!("Expected {} but it was not reported", expected));
            }
        }

        for trigger_id in &checkpoint.absent {
            if notifications.iter().any(|seen| seen.trigger_id == *trigger_id) {
                failures.push(format!("Trigger '{}' fired but should not have", trigger_id));
            }
        }

        let result = CheckpointResult {
            checkpoint_idx: self.current_checkpoint_idx,
            at_secs: checkpoint.at_secs,
            passed: failures.is_empty(),
            failures,
        };

        self.results.push(result.clone());
        self.current_checkpoint_idx += 1;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use raidwatch_core::Severity;

    fn at(secs: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(21, 0, secs)
            .unwrap()
    }

    fn notification(trigger_id: &str, text: &str, secs: u32) -> Notification {
        Notification {
            trigger_id: trigger_id.to_string(),
            severity: Severity::Info,
            text: text.to_string(),
            timestamp: at(secs),
            duration_secs: None,
            countdown_secs: None,
        }
    }

    fn mistake(mistake_type: MistakeType, id: &str, secs: u32) -> Mistake {
        Mistake {
            mistake_type,
            mistake_id: id.to_string(),
            name: None,
            blame: None,
            text: String::new(),
            count: 1,
            report_id: None,
            trigger_type: None,
            report: None,
            timestamp: at(secs),
        }
    }

    fn sample_expectations() -> Expectations {
        toml::from_str(
            r#"
[meta]
set_id = "FuturesRewrittenUltimate"

[[checkpoint]]
at_secs = 10.0
notifications = [{ text = "Short Fire on you (w/ Aya)" }]
mistakes = [{ type = "warn", id = "FRU Burnt Strike Fire" }]
absent = ["FRU P1 Cyclonic Break Fire"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_checkpoint_pass() {
        let mut verifier = CheckpointVerifier::new(sample_expectations());
        verifier.record_mistake(&mistake(MistakeType::Pull, "pull", 0));
        verifier.record_notification(&notification("FRU Relativity", "Short Fire on you (w/ Aya)", 4));
        verifier.record_mistake(&mistake(MistakeType::Warn, "FRU Burnt Strike Fire", 6));

        assert!(verifier.check_time(at(5)).is_none());
        let result = verifier.check_time(at(11)).unwrap();
        assert!(result.passed, "Failures: {:?}", result.failures);
        assert!(verifier.is_complete());
    }

    #[test]
    fn test_checkpoint_fail_missing_and_unexpected() {
        let mut verifier = CheckpointVerifier::new(sample_expectations());
        verifier.record_mistake(&mistake(MistakeType::Pull, "pull", 0));
        verifier.record_notification(&notification("FRU P1 Cyclonic Break Fire", "AoE", 3));

        let result = verifier.check_time(at(11)).unwrap();
        assert!(!result.passed);
        assert_eq!(result.failures.len(), 3);
        assert!(result.failures.iter().any(|f| f.contains("should not have")));
    }

    #[test]
    fn test_unreached_checkpoints_fail_without_pull() {
        let verifier = CheckpointVerifier::new(sample_expectations());
        let result = verifier.finalize();
        assert!(!result.passed());
        assert_eq!(result.checkpoints_total, 1);
    }
}
