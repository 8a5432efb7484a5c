use std::collections::VecDeque;

use chrono::NaiveDateTime;
use hashbrown::HashMap;
use raidwatch_types::Lang;

use super::{DeathReport, TrackedEvent, TrackedEventKind};
use crate::timers::log_time;

#[derive(Debug, Default)]
struct TargetBuffer {
    name: String,
    events: VecDeque<TrackedEvent>,
    /// Set by a death; cleared when a new event is tracked
    finalized: bool,
}

/// Per-target ring buffers of recent events.
#[derive(Debug)]
pub struct DeathTracker {
    retention_secs: f32,
    capacity: usize,
    buffers: HashMap<String, TargetBuffer>,
    ids_by_name: HashMap<String, String>,
    reports_built: u64,
}

impl DeathTracker {
    pub fn new(retention_secs: f32, capacity: usize) -> Self {
        Self {
            retention_secs,
            capacity: capacity.max(1),
            buffers: HashMap::new(),
            ids_by_name: HashMap::new(),
            reports_built: 0,
        }
    }

    pub fn track(&mut self, target_id: &str, target_name: &str, event: TrackedEvent) {
        if !target_name.is_empty() {
            self.ids_by_name
                .insert(target_name.to_string(), target_id.to_string());
        }
        let cutoff = log_time::before(event.timestamp, self.retention_secs);
        let buffer = self.buffers.entry(target_id.to_string()).or_default();
        if !target_name.is_empty() {
            buffer.name = target_name.to_string();
        }
        buffer.finalized = false;
        buffer.events.push_back(event);

        while buffer.events.len() > self.capacity {
            buffer.events.pop_front();
        }
        while buffer.events.front().is_some_and(|e| e.timestamp < cutoff) {
            buffer.events.pop_front();
        }
    }

    /// Track an event for a target known only by name (mistake blame).
    /// Returns false if the name has never been seen with an id.
    pub fn track_by_name(&mut self, target_name: &str, event: TrackedEvent) -> bool {
        let Some(id) = self.ids_by_name.get(target_name).cloned() else {
            return false;
        };
        self.track(&id, target_name, event);
        true
    }

    /// Freeze the target's buffer into a report.
    ///
    /// Returns None for a repeated death with nothing tracked since the
    /// previous one.
    pub fn finalize(
        &mut self,
        target_id: &str,
        target_name: &str,
        source: &str,
        at: NaiveDateTime,
        lang: Lang,
        base_timestamp: Option<NaiveDateTime>,
    ) -> Option<(String, DeathReport)> {
        let buffer = self.buffers.entry(target_id.to_string()).or_default();
        if buffer.finalized {
            tracing::debug!(target_id, "Ignoring repeated death with no new events");
            return None;
        }

        let cutoff = log_time::before(at, self.retention_secs);
        let mut events: Vec<TrackedEvent> = buffer
            .events
            .drain(..)
            .filter(|e| e.timestamp >= cutoff && e.timestamp <= at)
            .collect();
        events.push(TrackedEvent::new(
            at,
            TrackedEventKind::Death {
                source: source.to_string(),
            },
        ));
        buffer.finalized = true;

        let name = if target_name.is_empty() {
            buffer.name.clone()
        } else {
            target_name.to_string()
        };

        self.reports_built += 1;
        let report_id = format!("{}-{}", target_id, self.reports_built);
        Some((
            report_id,
            DeathReport {
                lang,
                base_timestamp,
                death_timestamp: at,
                target_id: target_id.to_string(),
                target_name: name,
                events,
            },
        ))
    }

    pub fn reset(&mut self) {
        self.buffers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(ms: i64) -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-01-01 20:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
            + chrono::Duration::milliseconds(ms)
    }

    fn hit(at: NaiveDateTime, ability: &str, amount: i64) -> TrackedEvent {
        TrackedEvent::new(
            at,
            TrackedEventKind::Damage {
                ability_id: "9CEA".into(),
                ability: ability.into(),
                source: "Fatebreaker".into(),
                amount,
            },
        )
    }

    #[test]
    fn report_covers_retention_window_in_order() {
        let mut tracker = DeathTracker::new(15.0, 64);
        tracker.track("10000001", "Tini Poutini", hit(t(0), "Early", 100));
        tracker.track("10000001", "Tini Poutini", hit(t(10_000), "Mid", 200));
        tracker.track("10000001", "Tini Poutini", hit(t(20_000), "Late", 300));

        let (report_id, report) = tracker
            .finalize("10000001", "Tini Poutini", "Fatebreaker", t(21_000), Lang::En, Some(t(0)))
            .unwrap();

        assert_eq!(report_id, "10000001-1");
        // Early (t=0) is older than 21s - 15s
        assert_eq!(report.events.len(), 3);
        assert!(report.events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(report.events.iter().all(|e| e.timestamp <= t(21_000)));
        assert!(matches!(report.events.last().unwrap().kind, TrackedEventKind::Death { .. }));
        assert_eq!(report.last_damage(), Some(("Late", 300)));
        assert_eq!(report.relative_secs(report.death_timestamp), 21.0);
    }

    #[test]
    fn capacity_bounds_buffer() {
        let mut tracker = DeathTracker::new(60.0, 2);
        for i in 0..5 {
            tracker.track("1", "A", hit(t(i * 100), "Tick", i));
        }
        let (_, report) = tracker.finalize("1", "A", "", t(1_000), Lang::En, None).unwrap();
        // two damage events plus the death
        assert_eq!(report.events.len(), 3);
        assert_eq!(report.last_damage(), Some(("Tick", 4)));
    }

    #[test]
    fn repeated_death_without_new_events_is_ignored() {
        let mut tracker = DeathTracker::new(15.0, 64);
        tracker.track("1", "A", hit(t(0), "Hit", 1));
        assert!(tracker.finalize("1", "A", "", t(100), Lang::En, None).is_some());
        assert!(tracker.finalize("1", "A", "", t(200), Lang::En, None).is_none());

        tracker.track("1", "A", hit(t(300), "Hit", 1));
        let (report_id, report) = tracker.finalize("1", "A", "", t(400), Lang::En, None).unwrap();
        assert_eq!(report_id, "1-2");
        assert_eq!(report.events.len(), 2);
    }

    #[test]
    fn mistakes_attach_by_name() {
        let mut tracker = DeathTracker::new(15.0, 64);
        assert!(!tracker.track_by_name(
            "Tini Poutini",
            TrackedEvent::new(t(0), TrackedEventKind::Death { source: String::new() })
        ));
        tracker.track("10000001", "Tini Poutini", hit(t(0), "Hit", 1));
        assert!(tracker.track_by_name(
            "Tini Poutini",
            TrackedEvent::new(
                t(10),
                TrackedEventKind::Mistake {
                    mistake_type: raidwatch_types::MistakeType::Warn,
                    text: "Tower".into(),
                }
            )
        ));
    }
}
