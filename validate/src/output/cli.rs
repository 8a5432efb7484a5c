//! Colored CLI output for replay results
//!
//! Formats notifications, mistakes and death reports with colored output
//! for easy visual parsing.

use chrono::NaiveDateTime;
use raidwatch_core::{DeathReport, Mistake, Notification, Severity, TrackedEventKind};
use raidwatch_types::MistakeType;
use std::io::{self, Write};

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum OutputLevel {
    /// Only show summary at end
    Quiet,
    /// Show notifications and mistakes (default)
    #[default]
    Normal,
    /// Also show full death reports and set activations
    Verbose,
}

/// CLI output formatter with color support
#[derive(Debug)]
pub struct CliOutput {
    level: OutputLevel,
    pull_start: Option<NaiveDateTime>,
    use_colors: bool,
    alarms: u32,
    alerts: u32,
    infos: u32,
    mistakes: u32,
    deaths: u32,
    pulls: u32,
    wipes: u32,
}

impl Default for CliOutput {
    fn default() -> Self {
        Self::new(OutputLevel::Normal)
    }
}

impl CliOutput {
    pub fn new(level: OutputLevel) -> Self {
        Self {
            level,
            pull_start: None,
            use_colors: atty::is(atty::Stream::Stdout),
            alarms: 0,
            alerts: 0,
            infos: 0,
            mistakes: 0,
            deaths: 0,
            pulls: 0,
            wipes: 0,
        }
    }

    /// Set pull start time for relative timestamps
    pub fn set_pull_start(&mut self, time: NaiveDateTime) {
        self.pull_start = Some(time);
    }

    /// Format timestamp relative to the current pull
    pub fn format_time(&self, time: NaiveDateTime) -> String {
        if let Some(start) = self.pull_start {
            let secs = (time - start).num_milliseconds() as f32 / 1000.0;
            let sign = if secs < 0.0 { "-" } else { "" };
            let secs = secs.abs();
            let mins = (secs / 60.0).floor() as u32;
            let secs_remainder = secs % 60.0;
            format!("{}{:02}:{:05.2}", sign, mins, secs_remainder)
        } else {
            time.format("%H:%M:%S%.3f").to_string()
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ANSI Color Codes
    // ═══════════════════════════════════════════════════════════════════════════

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.paint("32", text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint("33", text)
    }

    fn red(&self, text: &str) -> String {
        self.paint("31", text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint("36", text)
    }

    fn magenta(&self, text: &str) -> String {
        self.paint("35", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Event Output
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn notification(&mut self, notification: &Notification) {
        let (marker, label) = match notification.severity {
            Severity::Alarm => {
                self.alarms += 1;
                (self.red("!!!"), self.red("ALARM:"))
            }
            Severity::Alert => {
                self.alerts += 1;
                (self.yellow("!! "), self.yellow("ALERT:"))
            }
            Severity::Info => {
                self.infos += 1;
                (self.cyan("-->"), self.cyan("INFO: "))
            }
        };
        if self.level < OutputLevel::Normal {
            return;
        }

        let time_str = self.format_time(notification.timestamp);
        let id = self.dim(&format!("[{}]", notification.trigger_id));
        let timing = match (notification.duration_secs, notification.countdown_secs) {
            (_, Some(countdown)) => format!(" ({:.1}s countdown)", countdown),
            (Some(duration), None) => format!(" ({:.1}s)", duration),
            (None, None) => String::new(),
        };

        println!(
            "[{}] {} {} \"{}\"{} {}",
            time_str, marker, label, notification.text, timing, id
        );
    }

    pub fn mistake(&mut self, mistake: &Mistake) {
        match mistake.mistake_type {
            MistakeType::Pull => {
                self.pulls += 1;
                self.set_pull_start(mistake.timestamp);
                if self.level >= OutputLevel::Normal {
                    let label = self.bold(&self.green(&format!("═══ PULL {} ═══", self.pulls)));
                    println!("\n{}\n", label);
                }
                return;
            }
            MistakeType::Wipe => {
                self.wipes += 1;
                if self.level >= OutputLevel::Normal {
                    let time_str = self.format_time(mistake.timestamp);
                    let label = self.bold(&self.yellow("═══ WIPE ═══"));
                    println!("\n{} (at {})\n", label, time_str);
                }
                return;
            }
            MistakeType::Death => self.deaths += 1,
            _ => self.mistakes += 1,
        }
        if self.level < OutputLevel::Normal {
            return;
        }

        let time_str = self.format_time(mistake.timestamp);
        let marker = match mistake.mistake_type {
            MistakeType::Death => self.red("XXX"),
            MistakeType::Fail => self.red("xxx"),
            MistakeType::Good => self.green("+++"),
            _ => self.magenta("~~~"),
        };
        let label = self.magenta(&format!("{}:", mistake.mistake_type.as_str().to_uppercase()));
        let blame = mistake
            .blame
            .as_deref()
            .map(|b| format!(" <{}>", b))
            .unwrap_or_default();
        let count = if mistake.count > 1 {
            format!(" (x{})", mistake.count)
        } else {
            String::new()
        };
        let id = self.dim(&format!("[{}]", mistake.mistake_id));

        println!(
            "[{}] {} {}{} {}{} {}",
            time_str, marker, label, blame, mistake.text, count, id
        );

        if let Some(report) = &mistake.report
            && self.level >= OutputLevel::Verbose
        {
            self.death_report(report);
        }
    }

    fn death_report(&self, report: &DeathReport) {
        for event in &report.events {
            let at = format!("{:+7.2}s", report.relative_secs(event.timestamp));
            let line = match &event.kind {
                TrackedEventKind::Damage {
                    ability,
                    source,
                    amount,
                    ..
                } => format!("{} hit by {} from {}", self.red(&format!("-{}", amount)), ability, source),
                TrackedEventKind::Heal {
                    ability,
                    source,
                    amount,
                } => format!("{} {} from {}", self.green(&format!("+{}", amount)), ability, source),
                TrackedEventKind::GainsEffect {
                    effect,
                    source,
                    duration_secs,
                    ..
                } => format!("gains {} ({:.1}s) from {}", effect, duration_secs, source),
                TrackedEventKind::LosesEffect { effect, .. } => format!("loses {}", effect),
                TrackedEventKind::Mistake { mistake_type, text } => {
                    format!("{} {}", self.magenta(mistake_type.as_str()), text)
                }
                TrackedEventKind::Death { source } => self.red(&format!("died ({})", source)),
            };
            println!("      {} {}", self.dim(&at), line);
        }
    }

    pub fn set_activated(&self, set_id: &str) {
        if self.level < OutputLevel::Verbose {
            return;
        }
        println!("{} {}", self.bold(&self.cyan("SET ACTIVE:")), set_id);
    }

    pub fn checkpoint(&self, at_secs: f32, passed: bool, failures: &[String]) {
        if passed {
            println!("{} {:.1}s", self.green("CHECKPOINT OK:"), at_secs);
        } else {
            println!("{} {:.1}s", self.red("CHECKPOINT FAILED:"), at_secs);
            for failure in failures {
                println!("    - {}", failure);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Summary Report
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn print_summary(&self, event_count: usize, checkpoints_passed: Option<(u32, u32)>) {
        let line = "═".repeat(51);
        println!();
        println!("{}", line);
        println!("  REPLAY SUMMARY");
        println!("{}", line);
        println!("Events:          {}", event_count);
        println!("Pulls / Wipes:   {} / {}", self.pulls, self.wipes);
        println!("Alarms:          {}", self.alarms);
        println!("Alerts:          {}", self.alerts);
        println!("Infos:           {}", self.infos);
        println!(
            "Mistakes:        {}",
            if self.mistakes > 0 {
                self.magenta(&self.mistakes.to_string())
            } else {
                "0".to_string()
            }
        );
        println!(
            "Deaths:          {}",
            if self.deaths > 0 {
                self.red(&self.deaths.to_string())
            } else {
                "0".to_string()
            }
        );

        if let Some((passed, total)) = checkpoints_passed {
            let status = if passed == total {
                self.green(&format!("PASSED ({}/{})", passed, total))
            } else {
                self.red(&format!("FAILED ({}/{})", passed, total))
            };
            println!("Verification:    {}", status);
        }
        println!("{}", line);
    }

    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}
