use chrono::{Days, NaiveDateTime, NaiveTime};
use memchr::{memchr, memchr_iter};

use super::{EventType, LogEvent, Matches, ParseError};

/// Parses recorded event lines: `HH:MM:SS.mmm|Type|key=value|...`
///
/// Times are relative to the session date. A time earlier than the session
/// start time is assumed to have rolled past midnight.
pub struct LogParser {
    session_date: NaiveDateTime,
}

impl LogParser {
    pub fn new(session_date: NaiveDateTime) -> Self {
        Self { session_date }
    }

    /// Parse one line. Blank lines and `#` comments yield `Ok(None)`.
    pub fn parse_line(&self, line_number: u64, line: &str) -> Result<Option<LogEvent>, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let b = line.as_bytes();
        let pipes: Vec<usize> = memchr_iter(b'|', b).collect();
        if pipes.is_empty() {
            return Err(ParseError::InvalidLineFormat { line_number });
        }

        let time_segment = &line[..pipes[0]];
        let timestamp = self
            .parse_timestamp(time_segment)
            .ok_or_else(|| ParseError::InvalidTimestamp {
                line_number,
                segment: time_segment.to_string(),
            })?;

        let type_end = pipes.get(1).copied().unwrap_or(line.len());
        let type_segment = &line[pipes[0] + 1..type_end];
        let event_type =
            EventType::from_name(type_segment).ok_or_else(|| ParseError::UnknownEventType {
                line_number,
                name: type_segment.to_string(),
            })?;

        let mut fields = Matches::new();
        for (i, &start) in pipes.iter().enumerate().skip(1) {
            let end = pipes.get(i + 1).copied().unwrap_or(line.len());
            let segment = &line[start + 1..end];
            if segment.is_empty() {
                continue;
            }
            let Some(eq) = memchr(b'=', segment.as_bytes()) else {
                return Err(ParseError::InvalidField {
                    line_number,
                    segment: segment.to_string(),
                });
            };
            fields.insert(&segment[..eq], &segment[eq + 1..]);
        }

        Ok(Some(LogEvent {
            line_number,
            timestamp,
            event_type,
            fields,
        }))
    }

    // parse HH:MM:SS.mmm
    fn parse_timestamp(&self, segment: &str) -> Option<NaiveDateTime> {
        let b = segment.as_bytes();
        if b.len() != 12 || b[2] != b':' || b[5] != b':' || b[8] != b'.' {
            return None;
        }
        if !b
            .iter()
            .enumerate()
            .all(|(i, c)| matches!(i, 2 | 5 | 8) || c.is_ascii_digit())
        {
            return None;
        }

        let hour = (b[0] - b'0') * 10 + (b[1] - b'0');
        let minute = (b[3] - b'0') * 10 + (b[4] - b'0');
        let second = (b[6] - b'0') * 10 + (b[7] - b'0');
        let millis =
            (b[9] - b'0') as u16 * 100 + (b[10] - b'0') as u16 * 10 + (b[11] - b'0') as u16;

        let time =
            NaiveTime::from_hms_milli_opt(hour as u32, minute as u32, second as u32, millis as u32)?;

        if time
            .signed_duration_since(self.session_date.time())
            .num_milliseconds()
            < 0
        {
            self.session_date
                .date()
                .and_time(time)
                .checked_add_days(Days::new(1))
        } else {
            Some(self.session_date.date().and_time(time))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_parser() -> LogParser {
        let date =
            NaiveDateTime::parse_from_str("2025-01-01 20:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        LogParser::new(date)
    }

    #[test]
    fn test_parse_starts_using() {
        let parser = test_parser();
        let line = "20:01:02.500|StartsUsing|id=9CD0|source=Fatebreaker|target=Tini Poutini";
        let event = parser.parse_line(7, line).unwrap().unwrap();

        assert_eq!(event.line_number, 7);
        assert_eq!(event.event_type, EventType::StartsUsing);
        assert_eq!(event.fields.id(), "9CD0");
        assert_eq!(event.fields.source(), "Fatebreaker");
        assert_eq!(event.fields.target(), "Tini Poutini");
        assert_eq!(event.timestamp.format("%H:%M:%S%.3f").to_string(), "20:01:02.500");
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let parser = test_parser();
        assert!(parser.parse_line(1, "# session: 2025-01-01 20:00:00").unwrap().is_none());
        assert!(parser.parse_line(2, "   ").unwrap().is_none());
    }

    #[test]
    fn test_midnight_rollover() {
        let parser = test_parser();
        let event = parser
            .parse_line(1, "00:00:05.000|InCombat|inGameCombat=1")
            .unwrap()
            .unwrap();
        assert_eq!(event.timestamp.format("%Y-%m-%d").to_string(), "2025-01-02");
    }

    #[test]
    fn test_value_may_contain_equals_sign() {
        let parser = test_parser();
        let event = parser
            .parse_line(1, "20:00:00.000|ChangeZone|id=4A4|name=a=b")
            .unwrap()
            .unwrap();
        assert_eq!(event.fields.get("name"), Some("a=b"));
    }

    #[test]
    fn test_invalid_lines_are_errors() {
        let parser = test_parser();
        assert!(matches!(
            parser.parse_line(1, "nonsense"),
            Err(ParseError::InvalidLineFormat { .. })
        ));
        assert!(matches!(
            parser.parse_line(2, "20:00|Ability|id=1"),
            Err(ParseError::InvalidTimestamp { .. })
        ));
        assert!(matches!(
            parser.parse_line(3, "20:00:00.000|Bogus|id=1"),
            Err(ParseError::UnknownEventType { .. })
        ));
        assert!(matches!(
            parser.parse_line(4, "20:00:00.000|Ability|id"),
            Err(ParseError::InvalidField { .. })
        ));
    }
}
