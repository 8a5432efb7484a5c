//! Built-in mistake triggers generated from a set's mistake maps

use raidwatch_types::{
    CollectMistakeMap, LocaleText, MistakeDetails, MistakeMap, MistakeMaps, MistakeType,
};

use super::{MistakePolicy, MistakeProposal, MistakeText, TriggerFamily};
use crate::combat_log::{EventType, Matches};
use crate::output::Output;
use crate::triggers::{Data, Pattern, Trigger, TriggerError};

/// Triggers plus the collector policy for each generated mistake id
pub struct GeneratedMistakes<S> {
    pub triggers: Vec<Trigger<S>>,
    pub policies: Vec<(String, MistakePolicy)>,
}

#[derive(Debug, Clone, Copy)]
enum TargetCount {
    Any,
    Shared,
    Solo,
}

pub fn generate<S: 'static>(maps: &MistakeMaps) -> Result<GeneratedMistakes<S>, TriggerError> {
    let mut generated = GeneratedMistakes {
        triggers: Vec::new(),
        policies: Vec::new(),
    };

    let immediate: [(&'static str, &MistakeMap, MistakeType, TriggerFamily, EventType, TargetCount); 8] = [
        ("damage_warn", &maps.damage_warn, MistakeType::Warn, TriggerFamily::Damage, EventType::Ability, TargetCount::Any),
        ("damage_fail", &maps.damage_fail, MistakeType::Fail, TriggerFamily::Damage, EventType::Ability, TargetCount::Any),
        ("gains_effect_warn", &maps.gains_effect_warn, MistakeType::Warn, TriggerFamily::GainsEffect, EventType::GainsEffect, TargetCount::Any),
        ("gains_effect_fail", &maps.gains_effect_fail, MistakeType::Fail, TriggerFamily::GainsEffect, EventType::GainsEffect, TargetCount::Any),
        ("share_warn", &maps.share_warn, MistakeType::Warn, TriggerFamily::Share, EventType::Ability, TargetCount::Shared),
        ("share_fail", &maps.share_fail, MistakeType::Fail, TriggerFamily::Share, EventType::Ability, TargetCount::Shared),
        ("solo_warn", &maps.solo_warn, MistakeType::Warn, TriggerFamily::Solo, EventType::Ability, TargetCount::Solo),
        ("solo_fail", &maps.solo_fail, MistakeType::Fail, TriggerFamily::Solo, EventType::Ability, TargetCount::Solo),
    ];
    for (map_name, map, mistake_type, family, event_type, count) in immediate {
        for (key, entry) in map {
            let details = entry.clone().into_details();
            check_id(map_name, key, &details)?;
            generated
                .policies
                .push((key.clone(), MistakePolicy::from_details(&details)));
            generated.triggers.push(mistake_trigger(
                key, &details, mistake_type, family, event_type, count,
            ));
        }
    }

    let collected: [(&'static str, &CollectMistakeMap, MistakeType, TriggerFamily); 4] = [
        ("missed_warn", &maps.missed_warn, MistakeType::Warn, TriggerFamily::Missed),
        ("missed_fail", &maps.missed_fail, MistakeType::Fail, TriggerFamily::Missed),
        ("multiple_warn", &maps.multiple_warn, MistakeType::Warn, TriggerFamily::Multiple),
        ("multiple_fail", &maps.multiple_fail, MistakeType::Fail, TriggerFamily::Multiple),
    ];
    for (map_name, map, mistake_type, family) in collected {
        for (key, entry) in map {
            let collect = entry.clone().into_details();
            check_id(map_name, key, &collect.details)?;
            generated
                .policies
                .push((key.clone(), MistakePolicy::from_collect(&collect)));
            generated.triggers.push(mistake_trigger(
                key,
                &collect.details,
                mistake_type,
                family,
                EventType::Ability,
                TargetCount::Any,
            ));
        }
    }

    Ok(generated)
}

fn check_id(map: &'static str, key: &str, details: &MistakeDetails) -> Result<(), TriggerError> {
    if details.id.trim().is_empty() {
        return Err(TriggerError::EmptyMistakeId {
            map,
            key: key.to_string(),
        });
    }
    Ok(())
}

fn mistake_trigger<S: 'static>(
    key: &str,
    details: &MistakeDetails,
    mistake_type: MistakeType,
    family: TriggerFamily,
    event_type: EventType,
    count: TargetCount,
) -> Trigger<S> {
    let (id_field, name_field) = match event_type {
        EventType::GainsEffect => ("effectId", "effect"),
        _ => ("id", "ability"),
    };
    let pattern = Pattern::new(event_type).field(id_field, details.id.as_str());
    let mistake_id = key.to_string();
    let text: Option<LocaleText> = details.text.clone();

    let trigger = Trigger::new(key, pattern).mistake(
        move |_: &mut Data<S>, matches: &Matches, _: &Output<'_>| {
            let text = match &text {
                Some(text) => MistakeText::Localized(text.clone()),
                None => MistakeText::Plain(matches.field(name_field).to_string()),
            };
            Ok(vec![
                MistakeProposal::new(mistake_type, text)
                    .with_id(mistake_id.clone())
                    .blame(matches.target())
                    .family(family),
            ])
        },
    );

    match count {
        TargetCount::Any => trigger,
        TargetCount::Shared => trigger
            .condition(|_: &Data<S>, matches: &Matches| target_count(matches) > 1),
        TargetCount::Solo => trigger
            .condition(|_: &Data<S>, matches: &Matches| target_count(matches) == 1),
    }
}

fn target_count(matches: &Matches) -> i64 {
    matches.get_i64("targetCount").unwrap_or(0)
}
