//! Seconds-to-log-time arithmetic
//!
//! Configured seconds are `f32` and may be far outside what a
//! `NaiveDateTime` can represent. These helpers never panic; a deadline that
//! does not fit is `None` and callers treat it as never reached.

use chrono::{NaiveDateTime, TimeDelta};

/// Seconds as a log-time offset, rounded to milliseconds.
/// None for non-finite values or values outside `TimeDelta`'s range.
pub(crate) fn secs(value: f32) -> Option<TimeDelta> {
    let millis = (value as f64 * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}

/// `at + seconds`, or None when the result is not representable.
pub(crate) fn after(at: NaiveDateTime, seconds: f32) -> Option<NaiveDateTime> {
    at.checked_add_signed(secs(seconds)?)
}

/// `at - seconds`, saturating at the earliest representable time.
pub(crate) fn before(at: NaiveDateTime, seconds: f32) -> NaiveDateTime {
    secs(seconds)
        .and_then(|delta| at.checked_sub_signed(delta))
        .unwrap_or(NaiveDateTime::MIN)
}

/// True while `now` is less than `seconds` after `since`. An unrepresentable
/// deadline never passes.
pub(crate) fn within(now: NaiveDateTime, since: NaiveDateTime, seconds: f32) -> bool {
    after(since, seconds).is_none_or(|until| now < until)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(ms: i64) -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-01-01 20:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
            + TimeDelta::milliseconds(ms)
    }

    #[test]
    fn rounds_to_milliseconds() {
        assert_eq!(secs(1.5), Some(TimeDelta::milliseconds(1500)));
        assert_eq!(after(t(0), 0.0004), Some(t(0)));
        assert_eq!(after(t(0), 2.25), Some(t(2250)));
    }

    #[test]
    fn huge_values_do_not_fit() {
        assert_eq!(secs(1.0e30), None);
        assert_eq!(secs(f32::NAN), None);
        assert_eq!(after(t(0), 1.0e30), None);
        assert_eq!(after(t(0), 1.0e15), None);
        assert_eq!(before(t(0), 1.0e30), NaiveDateTime::MIN);
    }

    #[test]
    fn unrepresentable_deadline_never_passes() {
        assert!(within(t(10_000), t(0), 1.0e30));
        assert!(within(t(500), t(0), 1.0));
        assert!(!within(t(1000), t(0), 1.0));
    }
}
