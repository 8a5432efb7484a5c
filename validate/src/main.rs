//! Replay CLI for trigger sets
//!
//! Replays a recorded event log through the built-in trigger sets and/or
//! trigger-set files and prints every notification and mistake:
//! - Instant mode (default): fast replay, suitable for CI with `--expect`
//! - Realtime mode (1x): watch callouts at their recorded pace

mod logging;
mod output;
mod replay;
mod verification;

use std::borrow::Cow;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use encoding_rs::{UTF_8, WINDOWS_1252};

use raidwatch_core::{
    Catalogue, EngineConfigExt, Mistake, Notification, ReportSink, Session, load_set_from_file,
};
use raidwatch_core::combat_log::Reader;
use raidwatch_types::{EngineConfig, Lang};

use crate::output::{CliOutput, OutputLevel};
use crate::replay::VirtualClock;
use crate::verification::{CheckpointVerifier, Expectations};

// ═══════════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ReplayMode {
    /// 1x speed with actual timing delays
    Realtime,
    /// Fast replay with no delays (default)
    #[default]
    Instant,
}

#[derive(Parser, Debug)]
#[command(name = "raidwatch-validate")]
#[command(about = "Replay recorded event logs through trigger sets")]
#[command(version)]
struct Args {
    /// Path to a recorded event log
    #[arg(short, long, required_unless_present = "list_sets")]
    log: Option<PathBuf>,

    /// Trigger-set file or directory of files to load
    #[arg(short, long)]
    triggers: Option<PathBuf>,

    /// Do not register the built-in trigger sets
    #[arg(long)]
    no_builtin: bool,

    /// List the registered trigger sets and exit
    #[arg(long)]
    list_sets: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Activation
    // ─────────────────────────────────────────────────────────────────────────
    /// Activate every registered set instead of following zone changes
    #[arg(long)]
    all_sets: bool,

    /// Activate a set by id regardless of zone (repeatable)
    #[arg(long = "set")]
    sets: Vec<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Engine Settings
    // ─────────────────────────────────────────────────────────────────────────
    /// Engine config file (defaults to the user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local player name (overrides the config)
    #[arg(short, long)]
    player: Option<String>,

    /// Display language: en, de, fr, ja, cn, ko
    #[arg(long, value_parser = parse_lang)]
    lang: Option<Lang>,

    /// Trigger-set option as SET:OPTION=VALUE (repeatable)
    #[arg(long = "option", value_parser = parse_set_option)]
    options: Vec<SetOptionArg>,

    // ─────────────────────────────────────────────────────────────────────────
    // Replay Mode
    // ─────────────────────────────────────────────────────────────────────────
    /// Replay mode
    #[arg(long, value_enum, default_value_t = ReplayMode::Instant)]
    mode: ReplayMode,

    /// Custom speed multiplier (overrides --mode)
    #[arg(long)]
    speed: Option<f32>,

    // ─────────────────────────────────────────────────────────────────────────
    // Output Mode
    // ─────────────────────────────────────────────────────────────────────────
    /// Quiet mode: summary only
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode: death reports and set activations
    #[arg(short, long)]
    verbose: bool,

    /// Debug logging for the raidwatch crates (same as DEBUG_LOGGING=1)
    #[arg(long)]
    debug: bool,

    /// Also write diagnostics to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────
    /// Path to expectations TOML file for checkpoint verification
    #[arg(long)]
    expect: Option<PathBuf>,
}

fn parse_lang(tag: &str) -> Result<Lang, String> {
    Lang::from_tag(tag).ok_or_else(|| format!("unknown language '{}'", tag))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SetOptionArg {
    set_id: String,
    option_id: String,
    value: String,
}

fn parse_set_option(raw: &str) -> Result<SetOptionArg, String> {
    let invalid = || format!("expected SET:OPTION=VALUE, got '{}'", raw);
    let (target, value) = raw.split_once('=').ok_or_else(invalid)?;
    let (set_id, option_id) = target.split_once(':').ok_or_else(invalid)?;
    if set_id.is_empty() || option_id.is_empty() || value.is_empty() {
        return Err(invalid());
    }
    Ok(SetOptionArg {
        set_id: set_id.to_string(),
        option_id: option_id.to_string(),
        value: value.to_string(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Report Sink
// ═══════════════════════════════════════════════════════════════════════════════

/// Prints engine output and feeds the checkpoint verifier
struct ReplaySink {
    cli: CliOutput,
    verifier: Option<CheckpointVerifier>,
}

impl ReportSink for ReplaySink {
    fn on_notification(&mut self, notification: &Notification) {
        self.cli.notification(notification);
        if let Some(verifier) = &mut self.verifier {
            verifier.record_notification(notification);
        }
    }

    fn on_mistake(&mut self, mistake: &Mistake) {
        self.cli.mistake(mistake);
        if let Some(verifier) = &mut self.verifier {
            verifier.record_mistake(mistake);
        }
    }

    fn on_set_activated(&mut self, set_id: &str) {
        self.cli.set_activated(set_id);
    }
}

impl ReplaySink {
    fn run_checkpoints(&mut self, now: chrono::NaiveDateTime) {
        let Some(verifier) = &mut self.verifier else {
            return;
        };
        while let Some(result) = verifier.check_time(now) {
            self.cli.checkpoint(result.at_secs, result.passed, &result.failures);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main
// ═══════════════════════════════════════════════════════════════════════════════

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _log_guard = logging::init(args.debug, args.log_file.as_deref());

    let output_level = if args.quiet {
        OutputLevel::Quiet
    } else if args.verbose {
        OutputLevel::Verbose
    } else {
        OutputLevel::Normal
    };

    let speed = args.speed.unwrap_or(match args.mode {
        ReplayMode::Realtime => 1.0,
        ReplayMode::Instant => 0.0,
    });

    let config = load_config(&args)?;
    let catalogue = build_catalogue(&args)?;

    if args.list_sets {
        print_catalogue(&catalogue);
        return Ok(());
    }
    let Some(log_path) = args.log.as_deref() else {
        return Err("--log is required".into());
    };

    let verifier = match &args.expect {
        Some(path) => {
            let expectations = Expectations::load(path)?;
            if catalogue.get(&expectations.meta.set_id).is_none() {
                eprintln!(
                    "Warning: expectations are for '{}', which is not registered",
                    expectations.meta.set_id
                );
            }
            Some(CheckpointVerifier::new(expectations))
        }
        None => None,
    };

    let bytes = std::fs::read(log_path)?;
    let content = decode_log(&bytes);
    let events = Reader::from(log_path).parse_content(&content)?;
    if events.is_empty() {
        return Err("Log file has no events".into());
    }

    eprintln!(
        "Replaying {} events from {} ({} sets registered, player: {}, lang: {})",
        events.len(),
        log_path.display(),
        catalogue.len(),
        if config.player_name.is_empty() { "<none>" } else { &config.player_name },
        config.language,
    );

    let mut session = Session::new(catalogue, config);
    let mut sink = ReplaySink {
        cli: CliOutput::new(output_level),
        verifier,
    };

    if args.all_sets {
        session.activate_all(&mut sink);
    }
    for set_id in &args.sets {
        session.activate(set_id, &mut sink)?;
    }

    let mut clock = VirtualClock::new(events[0].timestamp, speed);
    for event in &events {
        clock.advance_to(event.timestamp);
        session.process_event(event, &mut sink);
        sink.run_checkpoints(event.timestamp);
        sink.cli.flush();
    }
    session.finish(&mut sink);
    sink.run_checkpoints(clock.current_log_time());

    let verification = sink.verifier.take().map(|verifier| {
        let set_id = verifier.set_id().to_string();
        let reached = verifier.checked();
        (set_id, reached, verifier.finalize())
    });
    if let Some((_, reached, result)) = &verification {
        for unreached in result.results.iter().skip(*reached) {
            sink.cli.checkpoint(unreached.at_secs, unreached.passed, &unreached.failures);
        }
    }

    sink.cli.print_summary(
        events.len(),
        verification
            .as_ref()
            .map(|(_, _, r)| (r.checkpoints_passed, r.checkpoints_total)),
    );

    match verification {
        Some((set_id, _, result)) if !result.passed() => Err(format!(
            "verification failed for '{}': {}/{} checkpoints passed",
            set_id, result.checkpoints_passed, result.checkpoints_total
        )
        .into()),
        _ => Ok(()),
    }
}

fn load_config(args: &Args) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load(),
    };
    if let Some(player) = &args.player {
        config.player_name = player.clone();
    }
    if let Some(lang) = args.lang {
        config.language = lang;
    }
    for option in &args.options {
        config.select_option(&option.set_id, &option.option_id, &option.value);
    }
    Ok(config)
}

fn build_catalogue(args: &Args) -> Result<Catalogue, Box<dyn std::error::Error>> {
    let mut catalogue = if args.no_builtin {
        Catalogue::new()
    } else {
        Catalogue::builtin()?
    };

    if let Some(path) = &args.triggers {
        if path.is_dir() {
            let registered = catalogue.load_dir(path)?;
            tracing::info!(dir = %path.display(), registered, "Loaded trigger set directory");
        } else {
            let file = load_set_from_file(path)?;
            catalogue.register_file(file, Some(path))?;
        }
    }
    Ok(catalogue)
}

fn print_catalogue(catalogue: &Catalogue) {
    for entry in catalogue.iter() {
        let zones = if entry.zone_ids.is_empty() {
            "any zone".to_string()
        } else {
            entry
                .zone_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let label = entry
            .zone_label
            .as_ref()
            .map(|l| format!(" - {}", l.get(Lang::En)))
            .unwrap_or_default();
        println!("{} ({} triggers; {}){}", entry.id, entry.trigger_count, zones, label);
        for option in &entry.options {
            let choices = option
                .choices
                .iter()
                .map(|c| c.value.as_str())
                .collect::<Vec<_>>()
                .join(" | ");
            println!("    {}:{} = {} [{}]", entry.id, option.id, option.default, choices);
        }
    }
}

/// Recorded logs are UTF-8, but older recorders wrote the game's Windows-1252
/// text unchanged.
fn decode_log(bytes: &[u8]) -> Cow<'_, str> {
    let (content, _, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return content;
    }
    tracing::debug!("Log is not valid UTF-8, decoding as Windows-1252");
    let (content, _, _) = WINDOWS_1252.decode(bytes);
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_windows_1252_fallback() {
        let bytes = b"10:00:00.000|Ability|target=Ren\xe9e";
        assert_eq!(decode_log(bytes), "10:00:00.000|Ability|target=Renée");
    }

    #[test]
    fn keeps_utf8() {
        let text = "10:00:00.000|Ability|target=Rückstoß";
        assert_eq!(decode_log(text.as_bytes()), text);
    }

    #[test]
    fn parses_language_tags() {
        assert_eq!(parse_lang("DE"), Ok(Lang::De));
        assert!(parse_lang("xx").is_err());
    }

    #[test]
    fn parses_set_options() {
        assert_eq!(
            parse_set_option("FuturesRewrittenUltimate:ultimateRel=none"),
            Ok(SetOptionArg {
                set_id: "FuturesRewrittenUltimate".into(),
                option_id: "ultimateRel".into(),
                value: "none".into(),
            })
        );
        assert!(parse_set_option("ultimateRel=none").is_err());
        assert!(parse_set_option("Set:opt=").is_err());
    }

    #[test]
    fn option_flags_reach_the_config() {
        let args = Args::parse_from([
            "raidwatch-validate",
            "--list-sets",
            "--config",
            concat!(env!("CARGO_MANIFEST_DIR"), "/../core/definitions/party.toml"),
            "--option",
            "FuturesRewrittenUltimate:ultimateRel=none",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(
            config.set_options["FuturesRewrittenUltimate"]["ultimateRel"],
            "none"
        );
    }
}
