//! Log-time task queue
//!
//! Min-priority queue keyed by `(due time, insertion sequence)`, so tasks
//! due at the same instant run in the order they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::NaiveDateTime;

/// Identifies what a scheduled task belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimerKey {
    /// Trigger id or mistake id
    pub owner_id: String,
    /// Firing instance for delayed triggers (None for collection windows)
    pub instance: Option<u64>,
}

impl TimerKey {
    pub fn firing(trigger_id: &str, instance: u64) -> Self {
        Self {
            owner_id: trigger_id.to_string(),
            instance: Some(instance),
        }
    }

    pub fn window(mistake_id: &str) -> Self {
        Self {
            owner_id: mistake_id.to_string(),
            instance: None,
        }
    }
}

#[derive(Debug)]
struct Scheduled<T> {
    due: NaiveDateTime,
    seq: u64,
    key: TimerKey,
    task: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    // Reversed: BinaryHeap is a max-heap
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Scheduled<T>>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: NaiveDateTime, key: TimerKey, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled {
            due,
            seq,
            key,
            task,
        });
    }

    /// Earliest due time, if any task is pending
    pub fn next_due(&self) -> Option<NaiveDateTime> {
        self.heap.peek().map(|s| s.due)
    }

    /// Pop the earliest task if it is due at or before `now`
    pub fn pop_due(&mut self, now: NaiveDateTime) -> Option<(NaiveDateTime, TimerKey, T)> {
        if self.heap.peek()?.due > now {
            return None;
        }
        self.heap.pop().map(|s| (s.due, s.key, s.task))
    }

    /// Pop the earliest task regardless of time
    pub fn pop_next(&mut self) -> Option<(NaiveDateTime, TimerKey, T)> {
        self.heap.pop().map(|s| (s.due, s.key, s.task))
    }

    /// Drop every pending task whose key matches
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&TimerKey) -> bool) -> usize {
        let before = self.heap.len();
        self.heap.retain(|s| !predicate(&s.key));
        before - self.heap.len()
    }

    /// Drop every pending task
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(ms: i64) -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-01-01 20:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
            + chrono::Duration::milliseconds(ms)
    }

    #[test]
    fn pops_in_time_then_insertion_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(t(500), TimerKey::window("b"), "late");
        queue.schedule(t(100), TimerKey::window("a"), "first");
        queue.schedule(t(100), TimerKey::window("a"), "second");

        assert!(queue.pop_due(t(50)).is_none());
        assert_eq!(queue.pop_due(t(100)).map(|(_, _, task)| task), Some("first"));
        assert_eq!(queue.pop_due(t(100)).map(|(_, _, task)| task), Some("second"));
        assert!(queue.pop_due(t(499)).is_none());
        assert_eq!(queue.next_due(), Some(t(500)));
        assert_eq!(queue.pop_next().map(|(_, _, task)| task), Some("late"));
        assert!(queue.is_empty());
    }

    #[test]
    fn cancel_and_clear() {
        let mut queue = TimerQueue::new();
        queue.schedule(t(100), TimerKey::firing("t", 1), ());
        queue.schedule(t(100), TimerKey::firing("t", 2), ());
        queue.schedule(t(100), TimerKey::window("m"), ());

        assert_eq!(queue.cancel_where(|k| k.instance.is_some()), 2);
        assert_eq!(queue.len(), 1);
        queue.clear();
        assert!(queue.is_empty());
    }
}
