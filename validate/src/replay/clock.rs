//! Virtual clock for replay pacing
//!
//! - Instant (speed 0): no sleeping, events are processed back to back
//! - Realtime (speed 1): sleep between events for the recorded gap
//! - Custom speed: any multiplier (0.5x slow-mo, 10x fast-forward, etc.)

use chrono::NaiveDateTime;
use std::time::Duration;

#[derive(Debug)]
pub struct VirtualClock {
    /// First event of the replay
    replay_start: NaiveDateTime,

    /// Log time of the last event processed
    current_log_time: NaiveDateTime,

    /// Speed multiplier (1.0 = realtime, 0.0 = instant, 10.0 = 10x speed)
    speed_multiplier: f32,
}

impl VirtualClock {
    pub fn new(replay_start: NaiveDateTime, speed_multiplier: f32) -> Self {
        Self {
            replay_start,
            current_log_time: replay_start,
            speed_multiplier,
        }
    }

    pub fn instant(replay_start: NaiveDateTime) -> Self {
        Self::new(replay_start, 0.0)
    }

    pub fn realtime(replay_start: NaiveDateTime) -> Self {
        Self::new(replay_start, 1.0)
    }

    /// Advance to a log timestamp, sleeping unless in instant mode
    pub fn advance_to(&mut self, log_time: NaiveDateTime) {
        if self.speed_multiplier > 0.0 && log_time > self.current_log_time {
            let delta_ms = (log_time - self.current_log_time).num_milliseconds().max(0) as f32;
            let sleep_ms = (delta_ms / self.speed_multiplier) as u64;

            if sleep_ms > 0 {
                std::thread::sleep(Duration::from_millis(sleep_ms));
            }
        }

        self.current_log_time = self.current_log_time.max(log_time);
    }

    /// Seconds of log time since the replay started
    pub fn elapsed_secs(&self) -> f32 {
        (self.current_log_time - self.replay_start).num_milliseconds() as f32 / 1000.0
    }

    pub fn current_log_time(&self) -> NaiveDateTime {
        self.current_log_time
    }

    pub fn is_instant_mode(&self) -> bool {
        self.speed_multiplier == 0.0
    }

    pub fn speed(&self) -> f32 {
        self.speed_multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_time(hour: u32, min: u32, sec: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_milli_opt(hour, min, sec, ms)
            .unwrap()
    }

    #[test]
    fn test_elapsed() {
        let start = make_time(12, 0, 0, 0);
        let mut clock = VirtualClock::instant(start);

        assert_eq!(clock.elapsed_secs(), 0.0);

        clock.advance_to(make_time(12, 0, 30, 0));
        assert_eq!(clock.elapsed_secs(), 30.0);

        clock.advance_to(make_time(12, 1, 15, 500));
        assert!((clock.elapsed_secs() - 75.5).abs() < 0.001);
    }

    #[test]
    fn test_clock_never_moves_backwards() {
        let mut clock = VirtualClock::instant(make_time(12, 0, 0, 0));
        clock.advance_to(make_time(12, 0, 10, 0));
        clock.advance_to(make_time(12, 0, 5, 0));
        assert_eq!(clock.current_log_time(), make_time(12, 0, 10, 0));
    }

    #[test]
    fn test_modes() {
        let instant = VirtualClock::instant(make_time(12, 0, 0, 0));
        assert!(instant.is_instant_mode());
        assert_eq!(instant.speed(), 0.0);

        let realtime = VirtualClock::realtime(make_time(12, 0, 0, 0));
        assert!(!realtime.is_instant_mode());
        assert_eq!(realtime.speed(), 1.0);
    }
}
