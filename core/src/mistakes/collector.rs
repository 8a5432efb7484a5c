//! Mistake collector
//!
//! Applies role filters, dedupes immediate mistakes, and aggregates collected
//! mistakes over a window into a single summary.

use chrono::NaiveDateTime;
use hashbrown::HashMap;
use raidwatch_types::{CollectMistakeDetails, Lang, MistakeDetails, RoleFilter};

use super::{Mistake, MistakeProposal};
use crate::party::Party;
use crate::timers::log_time;

// ═══════════════════════════════════════════════════════════════════════════
// Policy
// ═══════════════════════════════════════════════════════════════════════════

/// Collection window settings (already normalized)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectPolicy {
    pub collect_secs: f32,
    pub min_count: u32,
}

/// How proposals for one mistake id are filtered and reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MistakePolicy {
    pub only_for_role: Option<RoleFilter>,
    /// None = immediate mode
    pub collect: Option<CollectPolicy>,
    pub suppress_secs: f32,
}

impl MistakePolicy {
    pub fn immediate() -> Self {
        Self::default()
    }

    pub fn from_details(details: &MistakeDetails) -> Self {
        Self {
            only_for_role: details.only_for_role.clone(),
            collect: None,
            suppress_secs: 0.0,
        }
    }

    /// Build from a collect map entry, normalizing bad values:
    /// `min_count <= 0` becomes 1, a negative or NaN window means immediate,
    /// and negative suppression means none.
    pub fn from_collect(details: &CollectMistakeDetails) -> Self {
        let min_count = match details.min_count {
            Some(n) if n > 0 => n as u32,
            _ => 1,
        };
        let collect = details
            .collect_seconds
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(|collect_secs| CollectPolicy {
                collect_secs,
                min_count,
            });
        if details.collect_seconds.is_some() && collect.is_none() {
            tracing::warn!(
                id = %details.details.id,
                value = ?details.collect_seconds,
                "Invalid collect window, reporting immediately"
            );
        }
        Self {
            only_for_role: details.details.only_for_role.clone(),
            collect,
            suppress_secs: normalize_secs(details.suppress_seconds),
        }
    }
}

fn normalize_secs(value: Option<f32>) -> f32 {
    value
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .unwrap_or(0.0)
}

// ═══════════════════════════════════════════════════════════════════════════
// Collector
// ═══════════════════════════════════════════════════════════════════════════

/// Result of offering a proposal to the collector
#[derive(Debug, Clone, PartialEq)]
pub enum Proposed {
    Emitted(Mistake),
    /// A new collection window opened; the caller schedules its close.
    /// None when the window is too long to ever close
    WindowOpened { closes_at: Option<NaiveDateTime> },
    Collected,
    Suppressed,
    Filtered,
}

#[derive(Debug, Clone)]
struct CollectWindow {
    first: MistakeProposal,
    count: u32,
    /// Distinct blamed targets in first-seen order
    blames: Vec<String>,
    min_count: u32,
}

#[derive(Debug, Default)]
pub struct MistakeCollector {
    lang: Lang,
    policies: HashMap<String, MistakePolicy>,
    /// Immediate-mode dedupe, keyed by (mistake id, blame)
    last_emitted: HashMap<(String, Option<String>), NaiveDateTime>,
    windows: HashMap<String, CollectWindow>,
    /// Collected-mode gating, keyed by mistake id
    last_reported: HashMap<String, NaiveDateTime>,
}

impl MistakeCollector {
    pub fn new(lang: Lang) -> Self {
        Self {
            lang,
            ..Self::default()
        }
    }

    pub fn set_lang(&mut self, lang: Lang) {
        self.lang = lang;
    }

    pub fn register(&mut self, mistake_id: impl Into<String>, policy: MistakePolicy) {
        self.policies.insert(mistake_id.into(), policy);
    }

    pub fn policy(&self, mistake_id: &str) -> Option<&MistakePolicy> {
        self.policies.get(mistake_id)
    }

    /// Number of open collection windows
    pub fn open_windows(&self) -> usize {
        self.windows.len()
    }

    /// Offer a proposal. `mistake_id` is the proposal's id or its trigger's id.
    pub fn propose(
        &mut self,
        mistake_id: &str,
        proposal: MistakeProposal,
        party: &Party,
        now: NaiveDateTime,
    ) -> Proposed {
        let policy = self.policies.get(mistake_id).cloned().unwrap_or_default();

        if let Some(filter) = &policy.only_for_role {
            let role = proposal.blame.as_deref().and_then(|b| party.role_of(b));
            if !role.is_some_and(|r| filter.contains(r)) {
                tracing::debug!(mistake_id, blame = ?proposal.blame, "Mistake filtered by role");
                return Proposed::Filtered;
            }
        }

        match policy.collect {
            None => self.emit_immediate(mistake_id, proposal, policy.suppress_secs, now),
            Some(collect) => self.collect(mistake_id, proposal, &policy, collect, now),
        }
    }

    fn emit_immediate(
        &mut self,
        mistake_id: &str,
        proposal: MistakeProposal,
        suppress_secs: f32,
        now: NaiveDateTime,
    ) -> Proposed {
        let key = (mistake_id.to_string(), proposal.blame.clone());
        if suppress_secs > 0.0
            && let Some(last) = self.last_emitted.get(&key)
            && log_time::within(now, *last, suppress_secs)
        {
            return Proposed::Suppressed;
        }
        self.last_emitted.insert(key, now);
        Proposed::Emitted(Mistake::from_proposal(proposal, mistake_id, self.lang, now))
    }

    fn collect(
        &mut self,
        mistake_id: &str,
        proposal: MistakeProposal,
        policy: &MistakePolicy,
        collect: CollectPolicy,
        now: NaiveDateTime,
    ) -> Proposed {
        if let Some(window) = self.windows.get_mut(mistake_id) {
            window.count += 1;
            if let Some(blame) = &proposal.blame
                && !window.blames.contains(blame)
            {
                window.blames.push(blame.clone());
            }
            return Proposed::Collected;
        }

        if policy.suppress_secs > 0.0
            && let Some(last) = self.last_reported.get(mistake_id)
            && log_time::within(now, *last, policy.suppress_secs)
        {
            return Proposed::Suppressed;
        }

        let blames = proposal.blame.iter().cloned().collect();
        self.windows.insert(
            mistake_id.to_string(),
            CollectWindow {
                first: proposal,
                count: 1,
                blames,
                min_count: collect.min_count,
            },
        );
        Proposed::WindowOpened {
            closes_at: log_time::after(now, collect.collect_secs),
        }
    }

    /// Close the window for `mistake_id`. Emits a summary iff the count
    /// reached the minimum.
    pub fn close_window(&mut self, mistake_id: &str, now: NaiveDateTime) -> Option<Mistake> {
        let window = self.windows.remove(mistake_id)?;
        if window.count < window.min_count {
            tracing::debug!(
                mistake_id,
                count = window.count,
                min_count = window.min_count,
                "Collection window closed below minimum"
            );
            return None;
        }
        self.last_reported.insert(mistake_id.to_string(), now);

        let count = window.count;
        let single_blame = match window.blames.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        let mut mistake = Mistake::from_proposal(window.first, mistake_id, self.lang, now);
        mistake.text = format!("{} (x{})", mistake.text, count);
        mistake.blame = single_blame;
        mistake.count = count;
        Some(mistake)
    }

    /// Drop all windows and dedupe state (policies stay registered)
    pub fn reset(&mut self) {
        self.last_emitted.clear();
        self.windows.clear();
        self.last_reported.clear();
    }
}
