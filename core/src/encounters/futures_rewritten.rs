//! Futures Rewritten (Ultimate)

use std::f32::consts::PI;

use hashbrown::HashMap;
use raidwatch_types::{Lang, LocaleText, Role, SetOption};

use crate::combat_log::Matches;
use crate::output::library::DIRECTION_KEYS;
use crate::output::{Output, OutputError};
use crate::triggers::{Data, Pattern, Severity, Trigger, TriggerSet, conditions, responses};

pub const ZONE_ID: u32 = 1238;
pub const SET_ID: &str = "FuturesRewrittenUltimate";

/// Set option: how Ultimate Relativity is called
pub const ULTIMATE_REL: &str = "ultimateRel";
/// Yellow stoplights mark north; dps east to southwest, supports west to northeast
pub const UR_Y_NORTH: &str = "yNorthDPSEast";
/// Debuff actions only
pub const UR_NO_POSITIONS: &str = "none";

const ARENA_CENTER: (f32, f32) = (100.0, 100.0);

/// Spell-in-Waiting: Dark Fire III (11s, 21s or 31s)
const DARK_FIRE: &str = "997";
/// Spell-in-Waiting: Dark Blizzard III (21s)
const DARK_BLIZZARD: &str = "99E";
/// Spell-in-Waiting: Return, on everyone as Relativity starts
const RETURN: &str = "9A0";
/// Rewind triggered
const REWIND: &str = "99B";
const STOPLIGHT_BASE_ID: &str = "17832";
/// Boss to stoplight; 0085 is purple
const YELLOW_TETHER: &str = "0086";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativityDebuff {
    ShortFire,
    MediumFire,
    LongFire,
    Ice,
}

impl RelativityDebuff {
    pub fn classify(effect_id: &str, duration_secs: f32) -> Self {
        if effect_id == DARK_BLIZZARD {
            RelativityDebuff::Ice
        } else if duration_secs < 12.0 {
            RelativityDebuff::ShortFire
        } else if duration_secs < 22.0 {
            RelativityDebuff::MediumFire
        } else {
            RelativityDebuff::LongFire
        }
    }

    fn output_key(&self) -> &'static str {
        match self {
            RelativityDebuff::ShortFire => "shortFire",
            RelativityDebuff::MediumFire => "mediumFire",
            RelativityDebuff::LongFire => "longFire",
            RelativityDebuff::Ice => "ice",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FruState {
    pub lightsteeped_count: u32,
    pub relativity_count: u32,
    pub relativity_debuff: Option<RelativityDebuff>,
    /// Supports holding long fire (always two)
    pub relativity_support_long: Vec<String>,
    /// Dps holding short fire (always two)
    pub relativity_dps_short: Vec<String>,
    /// Stoplight actor id → position
    pub relativity_stoplights: HashMap<String, (f32, f32)>,
    /// 8-way directions of the yellow-tethered stoplights
    pub relativity_yellow_dirs: Vec<usize>,
    /// Local player's spot, already localized
    pub relativity_my_dir: Option<String>,
}

fn debuff_collect(data: &mut Data<FruState>, matches: &Matches, _: &Output<'_>) -> Result<(), OutputError> {
    data.relativity_count += 1;

    let duration = matches.get_f32("duration").unwrap_or(0.0);
    let debuff = RelativityDebuff::classify(matches.field("effectId"), duration);
    let target = matches.target();

    match (data.party.role_of(target), debuff) {
        (Some(Role::Dps), RelativityDebuff::ShortFire) => {
            data.relativity_dps_short.push(target.to_string())
        }
        (Some(role), RelativityDebuff::LongFire) if role.is_support() => {
            data.relativity_support_long.push(target.to_string())
        }
        _ => {}
    }

    if data.is_me(target) {
        data.relativity_debuff = Some(debuff);
    }
    Ok(())
}

fn initial_debuff(
    data: &mut Data<FruState>,
    _: &Matches,
    output: &Output<'_>,
) -> Result<Option<String>, OutputError> {
    let Some(debuff) = data.relativity_debuff else {
        return Ok(None);
    };
    let debuff_text = output.text(debuff.output_key())?;

    let partners = match (debuff, data.role) {
        (RelativityDebuff::LongFire, role) if role.is_support() => &data.relativity_support_long,
        (RelativityDebuff::ShortFire, Role::Dps) => &data.relativity_dps_short,
        _ => return output.format("debuffSolo", &[("debuff", &debuff_text)]).map(Some),
    };

    let other = partners
        .iter()
        .find(|name| !data.is_me(name))
        .map(|name| data.short_name(name))
        .unwrap_or("???");
    output
        .format("debuffShared", &[("debuff", &debuff_text), ("other", other)])
        .map(Some)
}

// ───────────────────────────────────────────────────────────────────────────
// Ultimate Relativity positions
// ───────────────────────────────────────────────────────────────────────────

/// 8-way direction around the arena center; 0 is north, clockwise
fn dir_num_8(x: f32, y: f32) -> usize {
    let angle = (x - ARENA_CENTER.0).atan2(y - ARENA_CENTER.1);
    ((4.0 - 4.0 * angle / PI).round() as i32).rem_euclid(8) as usize
}

/// Two of the three yellow stoplights sit either side of relative north
fn find_north(dirs: &[usize]) -> Option<usize> {
    for (i, &a) in dirs.iter().enumerate() {
        for &b in &dirs[i + 1..] {
            match a.abs_diff(b) {
                2 => return Some(a.min(b) + 1),
                6 => return Some((a.max(b) + 1) % 8),
                _ => {}
            }
        }
    }
    None
}

/// Spot offsets from relative north
fn relativity_spots(debuff: RelativityDebuff, dps: bool) -> &'static [usize] {
    use RelativityDebuff::*;
    match (dps, debuff) {
        (true, LongFire | Ice) => &[4],
        (true, MediumFire) => &[2],
        (true, ShortFire) => &[3, 5],
        (false, ShortFire | Ice) => &[0],
        (false, MediumFire) => &[6],
        (false, LongFire) => &[1, 7],
    }
}

fn stoplight_collect(data: &mut Data<FruState>, matches: &Matches, _: &Output<'_>) -> Result<(), OutputError> {
    if let (Some(x), Some(y)) = (matches.get_f32("x"), matches.get_f32("y")) {
        data.relativity_stoplights.insert(matches.id().to_string(), (x, y));
    }
    Ok(())
}

fn yellow_tether(data: &mut Data<FruState>, matches: &Matches, output: &Output<'_>) -> Result<(), OutputError> {
    let Some(&(x, y)) = data.relativity_stoplights.get(matches.field("sourceId")) else {
        return Ok(());
    };
    data.relativity_yellow_dirs.push(dir_num_8(x, y));
    if data.relativity_yellow_dirs.len() != 3 {
        return Ok(());
    }

    let spot = match (find_north(&data.relativity_yellow_dirs), data.relativity_debuff) {
        (Some(north), Some(debuff)) => relativity_spots(debuff, data.role == Role::Dps)
            .iter()
            .map(|offset| output.text(DIRECTION_KEYS[(north + offset) % 8]))
            .collect::<Result<Vec<_>, _>>()?
            .join(&output.text("or")?),
        _ => output.text("unknown")?,
    };
    data.relativity_my_dir = Some(spot);
    Ok(())
}

/// The six timed steps after Spell-in-Waiting: Return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelativityStep {
    FireStack1,
    BaitRewind1,
    FireStack2,
    BaitRewind2,
    FireStack3,
    BaitRewind3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Spot {
    Middle,
    Assigned,
    /// In/out plus the assigned spot
    Combo(&'static str),
}

impl RelativityStep {
    /// Action output key and where to do it
    fn call(self, debuff: RelativityDebuff, dps: bool) -> (&'static str, Spot) {
        use RelativityDebuff::*;
        match self {
            RelativityStep::FireStack1 => fire_or_stack(debuff == ShortFire),
            RelativityStep::FireStack2 => fire_or_stack(debuff == MediumFire),
            RelativityStep::FireStack3 => fire_or_stack(debuff == LongFire),
            RelativityStep::BaitRewind1 => match (debuff, dps) {
                (LongFire, _) | (Ice, true) => ("baitStoplight", Spot::Assigned),
                (MediumFire, true) => ("dropRewind", Spot::Combo("middle")),
                (Ice, false) | (MediumFire, false) | (ShortFire, _) => ("dropRewind", Spot::Combo("out")),
            },
            RelativityStep::BaitRewind2 => match (debuff, dps) {
                (ShortFire, _) | (Ice, false) => ("baitStoplight", Spot::Assigned),
                (Ice, true) | (LongFire, _) => ("dropRewind", Spot::Combo("middle")),
                (MediumFire, _) => ("avoidStoplights", Spot::Middle),
            },
            RelativityStep::BaitRewind3 => match debuff {
                MediumFire => ("baitStoplight", Spot::Assigned),
                _ => ("avoidStoplights", Spot::Middle),
            },
        }
    }
}

fn fire_or_stack(mine: bool) -> (&'static str, Spot) {
    if mine {
        ("fireSpread", Spot::Assigned)
    } else {
        ("stackMarker", Spot::Middle)
    }
}

fn relativity_step(
    step: RelativityStep,
) -> impl Fn(&mut Data<FruState>, &Matches, &Output<'_>) -> Result<Option<String>, OutputError> + 'static {
    move |data: &mut Data<FruState>, _: &Matches, output: &Output<'_>| {
        let Some(debuff) = data.relativity_debuff else {
            return Ok(None);
        };
        let (action, spot) = step.call(debuff, data.role == Role::Dps);
        let action = output.text(action)?;
        if data.set_option(ULTIMATE_REL) != Some(UR_Y_NORTH) {
            return Ok(Some(action));
        }

        let assigned = match &data.relativity_my_dir {
            Some(dir) => dir.clone(),
            None => output.text("unknown")?,
        };
        let dir = match spot {
            Spot::Middle => output.text("middle")?,
            Spot::Assigned => assigned,
            Spot::Combo(in_out) => {
                output.format("dirCombo", &[("inOut", &output.text(in_out)?), ("dir", &assigned)])?
            }
        };
        output
            .format("yNorthStrat", &[("debuff", &action), ("dir", &dir)])
            .map(Some)
    }
}

fn relativity_step_trigger(id: &str, delay: f32, step: RelativityStep) -> Trigger<FruState> {
    Trigger::new(id, Pattern::gains_effect().field("effectId", RETURN))
        .condition(conditions::target_is_you())
        .delay(delay)
        .alert_text(relativity_step(step))
        .output_string("yNorthStrat", "${debuff} (${dir})")
        .output_string("dirCombo", "${inOut} + ${dir}")
        .output_string("fireSpread", "Fire - Spread")
        .output_string("dropRewind", "Drop Rewind")
        .output_string("baitStoplight", "Bait Stoplight")
        .output_string("avoidStoplights", "Avoid stoplights")
}

fn banish(_: &mut Data<FruState>, matches: &Matches, output: &Output<'_>) -> Result<Option<String>, OutputError> {
    let key = if matches.id() == "9D1C" { "stackPartner" } else { "spread" };
    output.text(key).map(Some)
}

pub fn trigger_set() -> TriggerSet<FruState> {
    TriggerSet::new(SET_ID)
        .zone(ZONE_ID)
        .zone_label(
            LocaleText::new("Futures Rewritten (Ultimate)")
                .with(Lang::De, "Futures Rewritten (fatal)")
                .with(Lang::Fr, "Futures Rewritten (fatal)"),
        )
        .with_option(
            SetOption::new(ULTIMATE_REL, UR_Y_NORTH)
                .name("P3 Ultimate Relativity")
                .comment("Y North, DPS E-SW, Supp W-NE (LesBin)")
                .choice("Y North, DPS E-SW, Supp W-NE", UR_Y_NORTH)
                .choice("Call Debuffs w/ No Positions", UR_NO_POSITIONS),
        )
        // ───────────────────────────────────────────────────────────────────
        // P1: Fatebreaker
        // ───────────────────────────────────────────────────────────────────
        .trigger(
            Trigger::new(
                "FRU P1 Cyclonic Break Fire",
                Pattern::starts_using()
                    .field("id", ["9CD0", "9D89"])
                    .field("source", ["Fatebreaker", "Fatebreaker's Image"]),
            )
            .duration(8.0)
            .text_key(Severity::Alert, "clockPairs")
            .output_string(
                "clockPairs",
                LocaleText::new("Clock spots => Pairs")
                    .with(Lang::De, "Himmelsrichtungen => Paare")
                    .with(Lang::Ja, "八方向 => ペア")
                    .with(Lang::Cn, "八方 => 两人分摊")
                    .with(Lang::Ko, "8방향 => 쉐어"),
            ),
        )
        .trigger(
            Trigger::new(
                "FRU P1 Cyclonic Break Lightning",
                Pattern::starts_using()
                    .field("id", ["9CD4", "9D8A"])
                    .field("source", ["Fatebreaker", "Fatebreaker's Image"]),
            )
            .duration(8.0)
            .text_key(Severity::Alert, "clockSpread")
            .output_string(
                "clockSpread",
                LocaleText::new("Clock spots => Spread")
                    .with(Lang::De, "Himmelsrichtungen => Verteilen")
                    .with(Lang::Ja, "八方向 => 散開")
                    .with(Lang::Cn, "八方 => 分散")
                    .with(Lang::Ko, "8방향 => 산개"),
            ),
        )
        .trigger(
            Trigger::new(
                "FRU P1 Powder Mark Trail",
                Pattern::starts_using()
                    .field("id", "9CE8")
                    .field("source", "Fatebreaker"),
            )
            .response(responses::tank_buster_swap()),
        )
        .trigger(
            Trigger::new(
                "FRU P1 Burnished Glory",
                Pattern::starts_using()
                    .field("id", "9CEA")
                    .field("source", "Fatebreaker"),
            )
            .response(responses::bleed_aoe()),
        )
        // ───────────────────────────────────────────────────────────────────
        // P2: Usurper of Frost
        // ───────────────────────────────────────────────────────────────────
        .trigger(
            Trigger::new(
                "FRU P2 Quadruple Slap First",
                Pattern::starts_using()
                    .field("id", "9CFF")
                    .field("source", "Usurper of Frost"),
            )
            .response(responses::tank_buster()),
        )
        .trigger(
            Trigger::new(
                "FRU P2 Diamond Dust",
                Pattern::starts_using()
                    .field("id", "9D05")
                    .field("source", "Usurper of Frost"),
            )
            .response(responses::big_aoe()),
        )
        .trigger(
            // Source name varies with actor reuse
            Trigger::new("FRU P2 Heavenly Strike", Pattern::ability().field("id", "9D07"))
                .duration(3.5)
                .suppress(1.0)
                .text_key(Severity::Alert, "knockback"),
        )
        .trigger(
            Trigger::new("FRU P2 Shining Armor", Pattern::gains_effect().field("effectId", "8E1"))
                .suppress(1.0)
                .countdown(4.9)
                .text_key(Severity::Alarm, "lookAway"),
        )
        .trigger(
            // Reflected Scythe Kick from the frozen mirrors, 9.7s cast
            Trigger::new("FRU P2 Mirror Mirror Reflected", Pattern::starts_using().field("id", "9D0D"))
                .delay(5.0)
                .suppress(1.0)
                .text_key(Severity::Alert, "baitCleave")
                .output_string("baitCleave", "Bait cleave"),
        )
        .trigger(
            Trigger::new(
                "FRU P2 Mirror Mirror Banish III",
                Pattern::starts_using().field("id", ["9D1C", "9D1D"]),
            )
            .info_text(banish),
        )
        .trigger(
            // One puddle player gets two stacks on application, so take the count
            Trigger::new("FRU P2 Lightsteeped Counter", Pattern::gains_effect().field("effectId", "8D1"))
                .condition(conditions::target_is_you())
                .run(|data: &mut Data<FruState>, matches: &Matches, _: &Output<'_>| {
                    data.lightsteeped_count = matches
                        .get_i64("count")
                        .and_then(|c| u32::try_from(c).ok())
                        .unwrap_or(0);
                    Ok(())
                }),
        )
        .trigger(
            Trigger::new(
                "FRU P2 Absolute Zero",
                Pattern::starts_using()
                    .field("id", "9D20")
                    .field("source", "Usurper of Frost"),
            )
            .delay(4.0)
            .response(responses::big_aoe()),
        )
        .trigger(
            Trigger::new(
                "FRU Intermission Junction",
                Pattern::was_defeated().field("target", "Ice Veil"),
            )
            .delay(5.0)
            .response(responses::big_aoe()),
        )
        // ───────────────────────────────────────────────────────────────────
        // P3: Oracle of Darkness
        // ───────────────────────────────────────────────────────────────────
        .trigger(
            Trigger::new(
                "FRU P3 Ultimate Relativity AoE",
                Pattern::starts_using()
                    .field("id", "9D4A")
                    .field("source", "Oracle of Darkness"),
            )
            .delay(4.0)
            .response(responses::big_aoe()),
        )
        .trigger(
            Trigger::new(
                "FRU P3 Ultimate Relativity Debuff Collect",
                Pattern::gains_effect().field("effectId", [DARK_FIRE, DARK_BLIZZARD]),
            )
            .run(debuff_collect),
        )
        .trigger(
            Trigger::new(
                "FRU P3 Ultimate Relativity Initial Debuff",
                Pattern::gains_effect().field("effectId", [DARK_FIRE, DARK_BLIZZARD]),
            )
            .condition(|data: &Data<FruState>, _: &Matches| data.relativity_count == 8)
            .duration(8.0)
            .info_text(initial_debuff)
            .output_string("debuffSolo", "${debuff} on you")
            .output_string("debuffShared", "${debuff} on you (w/ ${other})")
            .output_string("shortFire", "Short Fire")
            .output_string("mediumFire", "Medium Fire")
            .output_string("longFire", "Long Fire")
            .output_string("ice", "Ice"),
        )
        .trigger(
            Trigger::new(
                "FRU P3 Ultimate Relativity Stoplight Collect",
                Pattern::added_combatant().field("npcBaseId", STOPLIGHT_BASE_ID),
            )
            .run(stoplight_collect),
        )
        .trigger(
            Trigger::new(
                "FRU P3 Ultimate Relativity Y North Spot",
                Pattern::tether().field("id", YELLOW_TETHER),
            )
            .condition(conditions::option_is(ULTIMATE_REL, UR_Y_NORTH))
            .run(yellow_tether),
        )
        .trigger(
            relativity_step_trigger("FRU P3 Ultimate Rel 1st Fire/Stack", 4.0, RelativityStep::FireStack1)
                .duration(7.0),
        )
        .trigger(relativity_step_trigger(
            "FRU P3 Ultimate Rel 1st Bait/Rewind",
            11.0,
            RelativityStep::BaitRewind1,
        ))
        .trigger(relativity_step_trigger(
            "FRU P3 Ultimate Rel 2nd Fire/Stack + Ice",
            16.0,
            RelativityStep::FireStack2,
        ))
        .trigger(relativity_step_trigger(
            "FRU P3 Ultimate Rel 2nd Bait/Rewind",
            21.0,
            RelativityStep::BaitRewind2,
        ))
        .trigger(relativity_step_trigger(
            "FRU P3 Ultimate Rel 3rd Fire/Stack",
            26.0,
            RelativityStep::FireStack3,
        ))
        .trigger(relativity_step_trigger(
            "FRU P3 Ultimate Rel 3rd Bait/Rewind",
            31.0,
            RelativityStep::BaitRewind3,
        ))
        .trigger(
            Trigger::new(
                "FRU P3 Ultimate Relativity Look Out",
                Pattern::gains_effect().field("effectId", REWIND),
            )
            .condition(conditions::target_is_you())
            .delay_with(|_: &Data<FruState>, matches: &Matches| {
                matches.get_f32("duration").map(|duration| duration - 4.0)
            })
            .countdown_with(|_: &Data<FruState>, matches: &Matches| matches.get_f32("duration"))
            .text_key(Severity::Alarm, "lookAway"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_effect_and_duration() {
        assert_eq!(RelativityDebuff::classify("99E", 21.0), RelativityDebuff::Ice);
        assert_eq!(RelativityDebuff::classify("997", 11.0), RelativityDebuff::ShortFire);
        assert_eq!(RelativityDebuff::classify("997", 11.99), RelativityDebuff::ShortFire);
        assert_eq!(RelativityDebuff::classify("997", 12.0), RelativityDebuff::MediumFire);
        assert_eq!(RelativityDebuff::classify("997", 21.0), RelativityDebuff::MediumFire);
        assert_eq!(RelativityDebuff::classify("997", 22.0), RelativityDebuff::LongFire);
        assert_eq!(RelativityDebuff::classify("997", 31.0), RelativityDebuff::LongFire);
    }

    #[test]
    fn stoplight_directions_around_center() {
        assert_eq!(dir_num_8(100.0, 80.0), 0);
        assert_eq!(dir_num_8(114.0, 86.0), 1);
        assert_eq!(dir_num_8(120.0, 100.0), 2);
        assert_eq!(dir_num_8(100.0, 120.0), 4);
        assert_eq!(dir_num_8(86.0, 86.0), 7);
    }

    #[test]
    fn north_sits_between_two_yellows() {
        assert_eq!(find_north(&[7, 1, 4]), Some(0));
        assert_eq!(find_north(&[2, 5, 0]), Some(1));
        assert_eq!(find_north(&[3, 5, 0]), Some(4));
        assert_eq!(find_north(&[0, 3, 5]), Some(4));
        assert_eq!(find_north(&[0, 4, 7]), None);
    }

    #[test]
    fn positions_by_role_and_debuff() {
        assert_eq!(relativity_spots(RelativityDebuff::ShortFire, true), &[3, 5]);
        assert_eq!(relativity_spots(RelativityDebuff::Ice, false), &[0]);
        assert_eq!(
            RelativityStep::BaitRewind1.call(RelativityDebuff::MediumFire, true),
            ("dropRewind", Spot::Combo("middle"))
        );
        assert_eq!(
            RelativityStep::BaitRewind2.call(RelativityDebuff::Ice, false),
            ("baitStoplight", Spot::Assigned)
        );
    }

    #[test]
    fn declares_relativity_option() {
        let compiled = trigger_set().compile().unwrap();
        let option = compiled.options.iter().find(|o| o.id == ULTIMATE_REL).unwrap();
        assert_eq!(option.default, UR_Y_NORTH);
        assert!(option.accepts(UR_NO_POSITIONS));
    }

    #[test]
    fn set_compiles() {
        let compiled = trigger_set().compile().unwrap();
        assert_eq!(compiled.id, SET_ID);
        assert_eq!(compiled.zone_ids, vec![ZONE_ID]);
        assert!(compiled.triggers.len() > 10);
    }
}
