use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use super::{LogEvent, LogParser, ReaderError};

const SESSION_HEADER: &str = "# session:";

/// Reads a recorded event log into memory.
///
/// Lines that fail to parse are logged and skipped so one bad line never
/// stops a replay.
pub struct Reader {
    path: PathBuf,
}

impl Reader {
    pub fn from(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_log_file(&self) -> Result<Vec<LogEvent>, ReaderError> {
        let bytes = std::fs::read(&self.path).map_err(|source| ReaderError::ReadFile {
            path: self.path.clone(),
            source,
        })?;
        // Lossy: non-UTF-8 player names must not make the whole file unreadable
        let content = String::from_utf8_lossy(&bytes);
        self.parse_content(&content)
    }

    /// Parse already-decoded log content.
    pub fn parse_content(&self, content: &str) -> Result<Vec<LogEvent>, ReaderError> {
        let session_date = extract_session_date(content).ok_or_else(|| {
            ReaderError::MissingSessionHeader {
                path: self.path.clone(),
            }
        })?;
        let parser = LogParser::new(session_date);

        let mut events = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            match parser.parse_line(idx as u64 + 1, line) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), error = %err, "Skipping log line");
                }
            }
        }

        // Recorded logs are expected in order, but a stable sort keeps replay
        // deterministic even if a recorder interleaved lines.
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}

/// Find `# session: YYYY-MM-DD HH:MM:SS` among the leading comment lines.
pub fn extract_session_date(content: &str) -> Option<NaiveDateTime> {
    content
        .lines()
        .take_while(|l| l.trim().is_empty() || l.starts_with('#'))
        .find_map(|l| l.strip_prefix(SESSION_HEADER))
        .and_then(|rest| {
            let rest = rest.trim();
            NaiveDateTime::parse_from_str(rest, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(rest, "%Y-%m-%dT%H:%M:%S"))
                .ok()
        })
}
