//! Logging setup for the replay CLI
//!
//! Diagnostics go to stderr so they never interleave with the replay output
//! on stdout. Set `DEBUG_LOGGING=1` (or pass `--debug`) for debug output from
//! the raidwatch crates. `RUST_LOG` overrides both.

use std::path::Path;

use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEBUG_DIRECTIVE: &str = "warn,raidwatch_core=debug,raidwatch_validate=debug";
const DEFAULT_DIRECTIVE: &str = "warn";

/// Initialize logging, optionally mirroring everything to `log_file`.
///
/// Returns a `WorkerGuard` that must be held until exit so buffered file
/// output is flushed.
pub fn init(
    debug: bool,
    log_file: Option<&Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let debug_logging = debug || std::env::var("DEBUG_LOGGING").is_ok();
    let directive = if debug_logging { DEBUG_DIRECTIVE } else { DEFAULT_DIRECTIVE };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(stderr_layer).with(filter).init();
        return None;
    };

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let Some(file_name) = path.file_name() else {
        eprintln!("Invalid log file path {:?}, using stderr only", path);
        tracing_subscriber::registry().with(stderr_layer).with(filter).init();
        return None;
    };

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(file_layer.and_then(stderr_layer))
        .with(filter)
        .init();

    tracing::info!(log_file = ?path, debug_logging, "Logging initialized");
    Some(guard)
}
