//! Tests for EncounterEngine event processing
//!
//! Drives whole trigger sets with synthetic log events and checks what the
//! engine emits.

use std::cell::Cell;
use std::rc::Rc;

use chrono::NaiveDateTime;
use proptest::prelude::*;
use raidwatch_types::{
    CollectMistakeDetails, CollectMistakeEntry, EngineConfig, Lang, MistakeDetails, MistakeEntry,
    MistakeMaps, MistakeType, PartyMemberConfig, Role, RoleFilter,
};

use super::{Emitted, EncounterEngine, Notification};
use crate::combat_log::{EventType, LogEvent, Matches};
use crate::death_report::TrackedEventKind;
use crate::encounters::futures_rewritten::{self, FruState};
use crate::mistakes::{DeathReason, Mistake, MistakeProposal};
use crate::output::Output;
use crate::triggers::{Data, Pattern, Severity, Trigger, TriggerSet};

// ═══════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn t(ms: i64) -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2025-01-01 20:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
        + chrono::Duration::milliseconds(ms)
}

fn event(ms: i64, event_type: EventType, fields: &[(&str, &str)]) -> LogEvent {
    let mut matches = Matches::new();
    for (key, value) in fields {
        matches.insert(*key, *value);
    }
    LogEvent::new(t(ms), event_type, matches)
}

const PARTY: [(&str, &str, Role); 8] = [
    ("10000001", "Tini Poutini", Role::Tank),
    ("10000002", "Potato Chippy", Role::Tank),
    ("10000003", "Mimi Lala", Role::Healer),
    ("10000004", "Juno Vale", Role::Healer),
    ("10000005", "Kai Ren", Role::Dps),
    ("10000006", "Aya Moss", Role::Dps),
    ("10000007", "Bram Stoke", Role::Dps),
    ("10000008", "Cid Nan", Role::Dps),
];

fn config_for(me: &str) -> EngineConfig {
    EngineConfig {
        player_name: me.to_string(),
        party: PARTY
            .iter()
            .map(|(id, name, role)| PartyMemberConfig {
                id: id.to_string(),
                name: name.to_string(),
                role: *role,
                nick: None,
            })
            .collect(),
        ..EngineConfig::default()
    }
}

fn id_of(name: &str) -> &'static str {
    PARTY
        .iter()
        .find(|(_, n, _)| *n == name)
        .map(|(id, _, _)| *id)
        .unwrap()
}

fn notifications(emitted: &[Emitted]) -> Vec<&Notification> {
    emitted.iter().filter_map(Emitted::as_notification).collect()
}

fn mistakes(emitted: &[Emitted]) -> Vec<&Mistake> {
    emitted.iter().filter_map(Emitted::as_mistake).collect()
}

/// Feed every event, then flush pending tasks
fn replay<S: 'static>(engine: &mut EncounterEngine<S>, events: &[LogEvent]) -> Vec<Emitted> {
    let mut out = Vec::new();
    for event in events {
        out.extend(engine.process_event(event));
    }
    out.extend(engine.finish());
    out
}

fn in_combat(ms: i64, value: &str) -> LogEvent {
    event(ms, EventType::InCombat, &[("inACTCombat", value), ("inGameCombat", value)])
}

fn head_marker(ms: i64, target: &str) -> LogEvent {
    event(ms, EventType::HeadMarker, &[("targetId", id_of(target)), ("target", target), ("id", "0177")])
}

#[derive(Debug, Default)]
struct Counter {
    seen: u32,
}

fn counting_set(build: impl FnOnce(Trigger<Counter>) -> Trigger<Counter>) -> TriggerSet<Counter> {
    TriggerSet::new("test").trigger(build(
        Trigger::new("marker", Pattern::head_marker().field("id", "0177")).info_text(
            |data: &mut Data<Counter>, _: &Matches, _: &Output<'_>| {
                data.seen += 1;
                Ok(Some(format!("marker {}", data.seen)))
            },
        ),
    ))
}

// ═══════════════════════════════════════════════════════════════════════════
// Ultimate Relativity
// ═══════════════════════════════════════════════════════════════════════════

/// Debuff assignments: supports get long/long/short/ice, dps short/short/medium/long
fn relativity_events() -> Vec<LogEvent> {
    let debuffs = [
        ("Tini Poutini", "997", "31.00"),
        ("Kai Ren", "997", "11.00"),
        ("Potato Chippy", "997", "31.00"),
        ("Aya Moss", "997", "11.50"),
        ("Mimi Lala", "997", "11.00"),
        ("Bram Stoke", "997", "21.00"),
        ("Juno Vale", "99E", "21.00"),
        ("Cid Nan", "997", "31.00"),
    ];
    debuffs
        .iter()
        .enumerate()
        .map(|(i, &(target, effect_id, duration))| {
            let effect = if effect_id == "99E" {
                "Spell-in-Waiting: Dark Blizzard III"
            } else {
                "Spell-in-Waiting: Dark Fire III"
            };
            event(
                10_000 + i as i64 * 10,
                EventType::GainsEffect,
                &[
                    ("effectId", effect_id),
                    ("effect", effect),
                    ("duration", duration),
                    ("sourceId", "40001234"),
                    ("source", "Oracle of Darkness"),
                    ("targetId", id_of(target)),
                    ("target", target),
                    ("count", "00"),
                ],
            )
        })
        .collect()
}

fn relativity_callout(me: &str) -> Vec<Notification> {
    let mut engine =
        EncounterEngine::new(futures_rewritten::trigger_set(), &config_for(me)).unwrap();
    let out = replay(&mut engine, &relativity_events());
    notifications(&out).into_iter().cloned().collect()
}

#[test]
fn relativity_calls_once_after_all_debuffs() {
    let mut engine =
        EncounterEngine::new(futures_rewritten::trigger_set(), &config_for("Kai Ren")).unwrap();
    let events = relativity_events();

    for event in &events[..7] {
        assert!(engine.process_event(event).is_empty());
    }
    assert_eq!(engine.data().relativity_count, 7);

    let out = engine.process_event(&events[7]);
    let calls = notifications(&out);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].trigger_id, "FRU P3 Ultimate Relativity Initial Debuff");
    assert_eq!(calls[0].severity, Severity::Info);
    assert_eq!(calls[0].duration_secs, Some(8.0));
    assert_eq!(calls[0].timestamp, t(10_070));
}

#[test]
fn relativity_names_the_partner() {
    let calls = relativity_callout("Kai Ren");
    assert_eq!(calls[0].text, "Short Fire on you (w/ Aya)");

    let calls = relativity_callout("Tini Poutini");
    assert_eq!(calls[0].text, "Long Fire on you (w/ Potato)");
}

#[test]
fn relativity_solo_debuffs() {
    assert_eq!(relativity_callout("Bram Stoke")[0].text, "Medium Fire on you");
    assert_eq!(relativity_callout("Cid Nan")[0].text, "Long Fire on you");
    assert_eq!(relativity_callout("Mimi Lala")[0].text, "Short Fire on you");
    assert_eq!(relativity_callout("Juno Vale")[0].text, "Ice on you");
}

#[test]
fn relativity_without_own_debuff_stays_quiet() {
    assert!(relativity_callout("Someone Else").is_empty());
}

fn stoplight(ms: i64, id: &str, x: &str, y: &str) -> LogEvent {
    event(
        ms,
        EventType::AddedCombatant,
        &[
            ("id", id),
            ("name", "Sorrow's Hourglass"),
            ("npcNameId", "13843"),
            ("npcBaseId", "17832"),
            ("currentHp", "1"),
            ("maxHp", "1"),
            ("x", x),
            ("y", y),
            ("z", "0.0"),
            ("heading", "0.0"),
        ],
    )
}

fn yellow_tether(ms: i64, stoplight_id: &str) -> LogEvent {
    event(
        ms,
        EventType::Tether,
        &[
            ("sourceId", stoplight_id),
            ("source", "Sorrow's Hourglass"),
            ("targetId", "40001234"),
            ("target", "Oracle of Darkness"),
            ("id", "0086"),
        ],
    )
}

fn relativity_effect(ms: i64, effect_id: &str, effect: &str, duration: &str, target: &str) -> LogEvent {
    event(
        ms,
        EventType::GainsEffect,
        &[
            ("effectId", effect_id),
            ("effect", effect),
            ("duration", duration),
            ("sourceId", "40001234"),
            ("source", "Oracle of Darkness"),
            ("targetId", id_of(target)),
            ("target", target),
            ("count", "00"),
        ],
    )
}

/// Step callouts for Kai Ren (dps, short fire) with yellows at NW, NE and S
fn relativity_steps(config: &EngineConfig) -> Vec<String> {
    let mut events = relativity_events();
    events.extend([
        stoplight(10_500, "40002001", "86.00", "86.00"),
        stoplight(10_500, "40002002", "114.00", "86.00"),
        stoplight(10_500, "40002003", "100.00", "120.00"),
        stoplight(10_500, "40002004", "120.00", "100.00"),
        stoplight(10_500, "40002005", "80.00", "100.00"),
        yellow_tether(11_000, "40002001"),
        yellow_tether(11_000, "40002002"),
        yellow_tether(11_000, "40002003"),
        relativity_effect(12_000, "9A0", "Spell-in-Waiting: Return", "38.00", "Kai Ren"),
    ]);
    let mut engine = EncounterEngine::new(futures_rewritten::trigger_set(), config).unwrap();
    let out = replay(&mut engine, &events);
    notifications(&out)
        .iter()
        .filter(|n| n.trigger_id.starts_with("FRU P3 Ultimate Rel "))
        .map(|n| n.text.clone())
        .collect()
}

#[test]
fn relativity_steps_call_y_north_positions() {
    assert_eq!(
        relativity_steps(&config_for("Kai Ren")),
        vec![
            "Fire - Spread (SE or SW)",
            "Drop Rewind (Out + SE or SW)",
            "Stack (Middle)",
            "Bait Stoplight (SE or SW)",
            "Stack (Middle)",
            "Avoid stoplights (Middle)",
        ]
    );
}

#[test]
fn relativity_option_drops_positions() {
    let mut config = config_for("Kai Ren");
    config.select_option(
        futures_rewritten::SET_ID,
        futures_rewritten::ULTIMATE_REL,
        futures_rewritten::UR_NO_POSITIONS,
    );
    assert_eq!(
        relativity_steps(&config),
        vec![
            "Fire - Spread",
            "Drop Rewind",
            "Stack",
            "Bait Stoplight",
            "Stack",
            "Avoid stoplights",
        ]
    );
}

#[test]
fn set_options_survive_a_pull_reset() {
    let mut config = config_for("Kai Ren");
    config.select_option(futures_rewritten::SET_ID, futures_rewritten::ULTIMATE_REL, "none");
    let mut engine = EncounterEngine::new(futures_rewritten::trigger_set(), &config).unwrap();
    assert_eq!(engine.data().set_option(futures_rewritten::ULTIMATE_REL), Some("none"));
    engine.reset();
    assert_eq!(engine.data().set_option(futures_rewritten::ULTIMATE_REL), Some("none"));
}

#[test]
fn rewind_look_away_counts_down_its_duration() {
    let mut engine =
        EncounterEngine::new(futures_rewritten::trigger_set(), &config_for("Kai Ren")).unwrap();
    let out = replay(
        &mut engine,
        &[
            relativity_effect(20_000, "99B", "Return", "10.00", "Aya Moss"),
            relativity_effect(20_000, "99B", "Return", "10.00", "Kai Ren"),
        ],
    );
    let calls = notifications(&out);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].trigger_id, "FRU P3 Ultimate Relativity Look Out");
    assert_eq!(calls[0].severity, Severity::Alarm);
    assert_eq!(calls[0].text, "Look Away");
    assert_eq!(calls[0].timestamp, t(26_000));
    assert_eq!(calls[0].countdown_secs, Some(10.0));
}

// ═══════════════════════════════════════════════════════════════════════════
// Matching, suppression, delays
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn non_matching_events_do_nothing() {
    let mut engine = EncounterEngine::new(counting_set(|t| t), &config_for("Kai Ren")).unwrap();
    let out = replay(
        &mut engine,
        &[event(0, EventType::HeadMarker, &[("target", "Kai Ren"), ("id", "0001")])],
    );
    assert!(out.is_empty());
    assert_eq!(engine.data().seen, 0);
}

#[test]
fn suppression_window_is_exclusive_at_the_deadline() {
    let mut engine =
        EncounterEngine::new(counting_set(|t| t.suppress(2.0)), &config_for("Kai Ren")).unwrap();
    let out = replay(
        &mut engine,
        &[
            head_marker(0, "Kai Ren"),
            head_marker(1_999, "Kai Ren"),
            head_marker(2_000, "Kai Ren"),
        ],
    );
    let texts: Vec<&str> = notifications(&out).iter().map(|n| n.text.as_str()).collect();
    assert_eq!(texts, vec!["marker 1", "marker 2"]);
    assert_eq!(notifications(&out)[1].timestamp, t(2_000));
}

#[test]
fn out_of_range_suppression_fires_once() {
    let mut engine =
        EncounterEngine::new(counting_set(|t| t.suppress(1.0e30)), &config_for("Kai Ren")).unwrap();
    let out = replay(
        &mut engine,
        &[head_marker(0, "Kai Ren"), head_marker(3_600_000, "Kai Ren")],
    );
    let texts: Vec<&str> = notifications(&out).iter().map(|n| n.text.as_str()).collect();
    assert_eq!(texts, vec!["marker 1"]);
}

#[test]
fn out_of_range_delay_drops_the_firing() {
    let set = counting_set(|t| t.delay(1.0e30)).trigger(
        Trigger::new("after", Pattern::head_marker().field("id", "0177"))
            .info_text(|_: &mut Data<Counter>, _: &Matches, _: &Output<'_>| Ok(Some("still running".into()))),
    );
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();
    let out = replay(&mut engine, &[head_marker(0, "Kai Ren"), head_marker(1_000, "Kai Ren")]);

    let texts: Vec<&str> = notifications(&out).iter().map(|n| n.text.as_str()).collect();
    assert_eq!(texts, vec!["still running", "still running"]);
    assert_eq!(engine.pending_tasks(), 0);
    assert_eq!(engine.data().seen, 0);
}

#[test]
fn suppression_by_field_tracks_each_target() {
    let mut engine = EncounterEngine::new(
        counting_set(|t| t.suppress(5.0).suppress_by("target")),
        &config_for("Kai Ren"),
    )
    .unwrap();
    let out = replay(
        &mut engine,
        &[
            head_marker(0, "Kai Ren"),
            head_marker(100, "Aya Moss"),
            head_marker(200, "Kai Ren"),
        ],
    );
    assert_eq!(notifications(&out).len(), 2);
}

#[test]
fn delayed_output_sees_state_at_fire_time() {
    let set = TriggerSet::<Counter>::new("delay")
        .trigger(
            Trigger::new("count", Pattern::ability().field("id", "9D07")).run(
                |data: &mut Data<Counter>, _: &Matches, _: &Output<'_>| {
                    data.seen += 1;
                    Ok(())
                },
            ),
        )
        .trigger(
            Trigger::new("report", Pattern::head_marker())
                .delay(2.0)
                .alert_text(|data: &mut Data<Counter>, _: &Matches, _: &Output<'_>| {
                    Ok(Some(format!("seen {}", data.seen)))
                }),
        );
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();

    assert!(engine.process_event(&head_marker(0, "Kai Ren")).is_empty());
    assert_eq!(engine.pending_tasks(), 1);
    engine.process_event(&event(1_000, EventType::Ability, &[("id", "9D07")]));
    engine.process_event(&event(1_500, EventType::Ability, &[("id", "9D07")]));

    let out = engine.advance_to(t(2_000));
    let calls = notifications(&out);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].text, "seen 2");
    assert_eq!(calls[0].timestamp, t(2_000));
    assert_eq!(engine.pending_tasks(), 0);
}

#[test]
fn due_tasks_run_before_the_next_event() {
    let set = TriggerSet::<Counter>::new("delay")
        .trigger(Trigger::new("later", Pattern::head_marker()).delay(1.0).text_key(Severity::Info, "spread"))
        .trigger(Trigger::new("now", Pattern::ability()).text_key(Severity::Info, "stacks"));
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();

    engine.process_event(&head_marker(0, "Kai Ren"));
    let out = engine.process_event(&event(1_500, EventType::Ability, &[("id", "1")]));
    let ids: Vec<&str> = notifications(&out).iter().map(|n| n.trigger_id.as_str()).collect();
    assert_eq!(ids, vec!["later", "now"]);
    assert_eq!(out[0].timestamp(), t(1_000));
}

#[test]
fn promise_false_drops_the_firing() {
    let set = TriggerSet::<Counter>::new("promise").trigger(
        Trigger::new("gate", Pattern::head_marker())
            .delay(1.0)
            .promise(|data: &mut Data<Counter>, _: &Matches| data.seen > 0)
            .text_key(Severity::Info, "spread"),
    );
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();
    assert!(replay(&mut engine, &[head_marker(0, "Kai Ren")]).is_empty());

    engine.data_mut().seen = 1;
    let out = replay(&mut engine, &[head_marker(5_000, "Kai Ren")]);
    assert_eq!(notifications(&out).len(), 1);
}

#[test]
fn disabled_and_conditioned_triggers_skip() {
    let set = TriggerSet::<Counter>::new("skip")
        .trigger(Trigger::new("off", Pattern::head_marker()).disabled(true).text_key(Severity::Info, "spread"))
        .trigger(
            Trigger::new("mine", Pattern::head_marker())
                .condition(crate::triggers::conditions::target_is_you())
                .text_key(Severity::Info, "stacks"),
        );
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();
    let out = replay(&mut engine, &[head_marker(0, "Aya Moss"), head_marker(10, "Kai Ren")]);
    let calls = notifications(&out);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].trigger_id, "mine");
    assert_eq!(calls[0].text, "Stacks");
}

#[test]
fn output_follows_language_switch() {
    let set = TriggerSet::<Counter>::new("lang")
        .trigger(Trigger::new("kb", Pattern::head_marker()).text_key(Severity::Alert, "knockback"));
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();

    let english = replay(&mut engine, &[head_marker(0, "Kai Ren")]);
    engine.set_language(Lang::De);
    assert_eq!(engine.language(), Lang::De);
    let german = replay(&mut engine, &[head_marker(10, "Kai Ren")]);

    assert_eq!(notifications(&english)[0].text, "Knockback");
    assert_eq!(notifications(&german)[0].text, "Rückstoß");
}

// ═══════════════════════════════════════════════════════════════════════════
// Fault isolation
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn panicking_callback_does_not_stop_later_triggers() {
    let set = TriggerSet::<Counter>::new("faults")
        .trigger(Trigger::new("boom", Pattern::head_marker()).run(
            |_: &mut Data<Counter>, _: &Matches, _: &Output<'_>| panic!("callback bug"),
        ))
        .trigger(Trigger::new("missing", Pattern::head_marker()).text_key(Severity::Info, "noSuchKey"))
        .trigger(Trigger::new("fine", Pattern::head_marker()).text_key(Severity::Info, "spread"));
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();

    let out = replay(&mut engine, &[head_marker(0, "Kai Ren"), head_marker(10, "Kai Ren")]);
    let ids: Vec<&str> = notifications(&out).iter().map(|n| n.trigger_id.as_str()).collect();
    assert_eq!(ids, vec!["fine", "fine"]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Pulls & wipes
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn new_pull_resets_state_and_cancels_delays() {
    let set = counting_set(|t| t.delay(5.0));
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();

    let mut out = engine.process_event(&in_combat(0, "1"));
    out.extend(engine.process_event(&head_marker(1_000, "Kai Ren")));
    engine.data_mut().seen = 41;
    out.extend(engine.process_event(&in_combat(2_000, "0")));
    out.extend(engine.process_event(&in_combat(3_000, "1")));
    out.extend(engine.finish());

    assert!(notifications(&out).is_empty());
    assert_eq!(engine.data().seen, 0);
    assert_eq!(engine.pulls(), 2);
    assert!(engine.in_combat());
    let pulls: Vec<&Mistake> = mistakes(&out)
        .into_iter()
        .filter(|m| m.mistake_type == MistakeType::Pull)
        .collect();
    assert_eq!(pulls.len(), 2);
    assert_eq!(pulls[1].timestamp, t(3_000));
}

#[test]
fn wipe_only_counts_during_a_pull() {
    let mut engine = EncounterEngine::new(counting_set(|t| t.delay(5.0)), &config_for("Kai Ren")).unwrap();
    let wipe = |ms| event(ms, EventType::ActorControl, &[("instance", "80030072"), ("command", "40000010")]);

    let out = replay(&mut engine, &[wipe(0)]);
    assert!(out.is_empty());

    let out = replay(
        &mut engine,
        &[in_combat(1_000, "1"), head_marker(2_000, "Kai Ren"), wipe(3_000)],
    );
    let types: Vec<MistakeType> = mistakes(&out).iter().map(|m| m.mistake_type).collect();
    assert_eq!(types, vec![MistakeType::Pull, MistakeType::Wipe]);
    assert_eq!(mistakes(&out)[1].text, "Party Wipe");
    assert!(notifications(&out).is_empty());
    assert!(!engine.in_combat());
}

// ═══════════════════════════════════════════════════════════════════════════
// Mistakes
// ═══════════════════════════════════════════════════════════════════════════

fn tower_miss(ms: i64, target: &str) -> LogEvent {
    event(
        ms,
        EventType::Ability,
        &[
            ("sourceId", "40001000"),
            ("source", "Usurper of Frost"),
            ("id", "9D1B"),
            ("ability", "Holy Light"),
            ("targetId", id_of(target)),
            ("target", target),
            ("damage", "0"),
            ("targetCount", "1"),
        ],
    )
}

fn tower_set(min_count: i32) -> TriggerSet<()> {
    tower_set_collecting(10.0, min_count)
}

fn tower_set_collecting(collect_seconds: f32, min_count: i32) -> TriggerSet<()> {
    let mut maps = MistakeMaps::default();
    maps.missed_fail.insert(
        "FRU Missed Tower".into(),
        CollectMistakeEntry::Details(CollectMistakeDetails {
            details: MistakeDetails {
                id: "9D1B".into(),
                only_for_role: None,
                text: None,
            },
            collect_seconds: Some(collect_seconds),
            suppress_seconds: None,
            min_count: Some(min_count),
        }),
    );
    TriggerSet::new("towers").mistakes(maps)
}

#[test]
fn collected_mistake_reports_once_at_window_close() {
    let mut engine = EncounterEngine::new(tower_set(2), &config_for("Kai Ren")).unwrap();

    assert!(engine.process_event(&tower_miss(0, "Kai Ren")).is_empty());
    assert!(engine.process_event(&tower_miss(5_000, "Kai Ren")).is_empty());
    assert!(engine.advance_to(t(9_999)).is_empty());

    let out = engine.advance_to(t(10_000));
    let reported = mistakes(&out);
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].mistake_type, MistakeType::Fail);
    assert_eq!(reported[0].count, 2);
    assert_eq!(reported[0].blame.as_deref(), Some("Kai Ren"));
    assert_eq!(reported[0].text, "Holy Light (x2)");
    assert_eq!(reported[0].timestamp, t(10_000));
}

#[test]
fn collected_mistake_below_minimum_is_dropped() {
    let mut engine = EncounterEngine::new(tower_set(2), &config_for("Kai Ren")).unwrap();
    let out = replay(&mut engine, &[tower_miss(0, "Kai Ren"), tower_miss(10_500, "Kai Ren")]);
    assert!(mistakes(&out).is_empty());
}

#[test]
fn out_of_range_collection_window_never_reports() {
    let mut engine = EncounterEngine::new(tower_set_collecting(1.0e30, 1), &config_for("Kai Ren")).unwrap();
    assert!(engine.process_event(&tower_miss(0, "Kai Ren")).is_empty());
    assert!(engine.process_event(&tower_miss(5_000, "Kai Ren")).is_empty());
    assert_eq!(engine.pending_tasks(), 0);
    assert!(engine.advance_to(t(100_000_000)).is_empty());
    assert!(engine.finish().is_empty());
}

#[test]
fn role_filtered_mistake() {
    let mut maps = MistakeMaps::default();
    maps.damage_warn.insert(
        "FRU Healer Soak".into(),
        MistakeEntry::Details(MistakeDetails {
            id: "9D1B".into(),
            only_for_role: Some(RoleFilter::One(Role::Healer)),
            text: None,
        }),
    );
    let set: TriggerSet<()> = TriggerSet::new("roles").mistakes(maps);
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();

    let out = replay(&mut engine, &[tower_miss(0, "Kai Ren"), tower_miss(100, "Mimi Lala")]);
    let reported = mistakes(&out);
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].blame.as_deref(), Some("Mimi Lala"));
    assert_eq!(reported[0].mistake_type, MistakeType::Warn);
}

#[test]
fn share_and_solo_split_on_target_count() {
    let mut maps = MistakeMaps::default();
    maps.share_warn.insert("FRU Shared Buster".into(), MistakeEntry::Id("9CE8".into()));
    maps.solo_fail.insert("FRU Solo Stack".into(), MistakeEntry::Id("9CE8".into()));
    let set: TriggerSet<()> = TriggerSet::new("counts").mistakes(maps);
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();

    let hit = |ms, count| {
        event(
            ms,
            EventType::Ability,
            &[("id", "9CE8"), ("ability", "Powder Mark Trail"), ("target", "Kai Ren"), ("targetCount", count)],
        )
    };
    let out = replay(&mut engine, &[hit(0, "2"), hit(1_000, "1")]);
    let ids: Vec<&str> = mistakes(&out).iter().map(|m| m.mistake_id.as_str()).collect();
    assert_eq!(ids, vec!["FRU Shared Buster", "FRU Solo Stack"]);
}

#[test]
fn custom_mistake_trigger() {
    let set = TriggerSet::<()>::new("custom").trigger(
        Trigger::new("FRU Bad Tether", Pattern::tether().field("id", "0110")).mistake(
            |_: &mut Data<()>, matches: &Matches, _: &Output<'_>| {
                Ok(vec![MistakeProposal::fail("tether swap").blame(matches.target())])
            },
        ),
    );
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();
    let out = replay(
        &mut engine,
        &[event(0, EventType::Tether, &[("id", "0110"), ("target", "Aya Moss")])],
    );
    let reported = mistakes(&out);
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].mistake_id, "FRU Bad Tether");
    assert_eq!(reported[0].text, "tether swap");
}

// ═══════════════════════════════════════════════════════════════════════════
// Death reports
// ═══════════════════════════════════════════════════════════════════════════

fn damage(ms: i64, target: &str, ability: &str, amount: &str) -> LogEvent {
    event(
        ms,
        EventType::Ability,
        &[
            ("sourceId", "40001000"),
            ("source", "Oracle of Darkness"),
            ("id", "9D4A"),
            ("ability", ability),
            ("targetId", id_of(target)),
            ("target", target),
            ("damage", amount),
            ("targetCount", "1"),
        ],
    )
}

fn death(ms: i64, target: &str) -> LogEvent {
    event(
        ms,
        EventType::WasDefeated,
        &[("targetId", id_of(target)), ("target", target), ("sourceId", "40001000"), ("source", "Oracle of Darkness")],
    )
}

#[test]
fn death_report_uses_last_damage() {
    let set: TriggerSet<()> = TriggerSet::new("deaths");
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();

    let out = replay(
        &mut engine,
        &[
            in_combat(0, "1"),
            damage(1_000, "Aya Moss", "Shadoweye", "80000"),
            damage(2_000, "Aya Moss", "Dark Water III", "120000"),
            death(2_100, "Aya Moss"),
            death(2_200, "Aya Moss"),
        ],
    );
    let deaths: Vec<&Mistake> = mistakes(&out)
        .into_iter()
        .filter(|m| m.mistake_type == MistakeType::Death)
        .collect();
    assert_eq!(deaths.len(), 1);
    assert_eq!(deaths[0].text, "Dark Water III (120000)");
    assert_eq!(deaths[0].blame.as_deref(), Some("Aya Moss"));
    assert_eq!(deaths[0].report_id.as_deref(), Some("10000006-1"));

    let report = deaths[0].report.as_ref().unwrap();
    assert_eq!(report.target_name, "Aya Moss");
    assert_eq!(report.base_timestamp, Some(t(0)));
    assert_eq!(report.events.len(), 3);
    assert!(matches!(report.events[2].kind, TrackedEventKind::Death { .. }));
}

#[test]
fn death_reason_overrides_report_text() {
    let set = TriggerSet::<()>::new("reasons").trigger(
        Trigger::new("FRU Doom", Pattern::gains_effect().field("effectId", "9D4")).death_reason(
            |_: &mut Data<()>, matches: &Matches| {
                Some(DeathReason::new(matches.target_id(), matches.target(), "Doom"))
            },
        ),
    );
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();
    let doom = event(
        500,
        EventType::GainsEffect,
        &[("effectId", "9D4"), ("effect", "Doom"), ("targetId", id_of("Cid Nan")), ("target", "Cid Nan"), ("duration", "10.00")],
    );
    let out = replay(
        &mut engine,
        &[doom, damage(1_000, "Cid Nan", "Shadoweye", "80000"), death(1_100, "Cid Nan")],
    );
    let death = mistakes(&out)
        .into_iter()
        .find(|m| m.mistake_type == MistakeType::Death)
        .unwrap();
    assert_eq!(death.text, "Doom");
}

#[test]
fn death_without_damage_uses_generic_text() {
    let set: TriggerSet<()> = TriggerSet::new("deaths");
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();
    let out = replay(&mut engine, &[death(0, "Bram Stoke")]);
    assert_eq!(mistakes(&out)[0].text, "died");
}

#[test]
fn enemy_deaths_are_ignored() {
    let set: TriggerSet<()> = TriggerSet::new("deaths");
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();
    let out = replay(
        &mut engine,
        &[event(0, EventType::WasDefeated, &[("targetId", "40005555"), ("target", "Ice Veil")])],
    );
    assert!(out.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// Determinism
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn replay_is_deterministic() {
    let mut events = vec![in_combat(0, "1")];
    events.extend(relativity_events());
    events.push(event(
        12_000,
        EventType::StartsUsing,
        &[("id", "9D4A"), ("source", "Oracle of Darkness"), ("ability", "Ultimate Relativity")],
    ));
    events.push(damage(13_000, "Kai Ren", "Ultimate Relativity", "95000"));
    events.push(death(13_500, "Kai Ren"));

    let run = || {
        let mut engine =
            EncounterEngine::new(futures_rewritten::trigger_set(), &config_for("Kai Ren")).unwrap();
        replay(&mut engine, &events)
    };
    let first = run();
    assert_eq!(first, run());
    assert_eq!(notifications(&first).len(), 2);
    assert!(first.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
}

#[test]
fn reset_rebuilds_state_from_init() {
    let builds = Rc::new(Cell::new(0));
    let counter = builds.clone();
    let set = TriggerSet::with_init("init", move || {
        counter.set(counter.get() + 1);
        FruState::default()
    });
    let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();
    assert_eq!(builds.get(), 1);
    engine.data_mut().relativity_count = 3;
    engine.reset();
    assert_eq!(builds.get(), 2);
    assert_eq!(engine.data().relativity_count, 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// Properties
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn suppression_matches_reference(gaps in prop::collection::vec(0i64..3_000, 1..40), window_ms in 1i64..5_000) {
        let set = counting_set(|t| t.suppress(window_ms as f32 / 1000.0));
        let mut engine = EncounterEngine::new(set, &config_for("Kai Ren")).unwrap();

        let mut at = 0;
        let mut expected = 0;
        let mut next_allowed = i64::MIN;
        let mut events = Vec::new();
        for gap in gaps {
            at += gap;
            if at >= next_allowed {
                expected += 1;
                next_allowed = at + window_ms;
            }
            events.push(head_marker(at, "Kai Ren"));
        }

        let out = replay(&mut engine, &events);
        prop_assert_eq!(notifications(&out).len(), expected);
    }

    #[test]
    fn collected_count_respects_minimum(hits in 1usize..8, min_count in 1i32..6) {
        let mut engine = EncounterEngine::new(tower_set(min_count), &config_for("Kai Ren")).unwrap();
        let events: Vec<LogEvent> = (0..hits)
            .map(|i| tower_miss(i as i64 * 1_000, "Kai Ren"))
            .collect();

        let out = replay(&mut engine, &events);
        let reported = mistakes(&out);
        if hits as i32 >= min_count {
            prop_assert_eq!(reported.len(), 1);
            prop_assert_eq!(reported[0].count as usize, hits);
        } else {
            prop_assert!(reported.is_empty());
        }
    }
}
