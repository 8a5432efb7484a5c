//! Common trigger conditions

use raidwatch_types::Role;

use super::Data;
use crate::combat_log::Matches;

pub fn target_is_you<S: 'static>() -> impl Fn(&Data<S>, &Matches) -> bool + 'static {
    |data: &Data<S>, matches: &Matches| data.is_me(matches.target())
}

pub fn target_is_not_you<S: 'static>() -> impl Fn(&Data<S>, &Matches) -> bool + 'static {
    |data: &Data<S>, matches: &Matches| !data.is_me(matches.target())
}

pub fn caster_is_you<S: 'static>() -> impl Fn(&Data<S>, &Matches) -> bool + 'static {
    |data: &Data<S>, matches: &Matches| data.is_me(matches.source())
}

pub fn caster_is_not_you<S: 'static>() -> impl Fn(&Data<S>, &Matches) -> bool + 'static {
    |data: &Data<S>, matches: &Matches| !data.is_me(matches.source())
}

pub fn role_is<S: 'static>(role: Role) -> impl Fn(&Data<S>, &Matches) -> bool + 'static {
    move |data: &Data<S>, _: &Matches| data.role == role
}

/// Tanks and healers
pub fn is_support<S: 'static>() -> impl Fn(&Data<S>, &Matches) -> bool + 'static {
    |data: &Data<S>, _: &Matches| data.role.is_support()
}

/// The set option `id` is selected as `value`
pub fn option_is<S: 'static>(
    id: &'static str,
    value: &'static str,
) -> impl Fn(&Data<S>, &Matches) -> bool + 'static {
    move |data: &Data<S>, _: &Matches| data.set_option(id) == Some(value)
}

/// Look up a condition by name (used by trigger set files)
pub fn by_name<S: 'static>(name: &str) -> Option<super::ConditionFn<S>> {
    let condition: super::ConditionFn<S> = match name {
        "target_is_you" => Box::new(target_is_you()),
        "target_is_not_you" => Box::new(target_is_not_you()),
        "caster_is_you" => Box::new(caster_is_you()),
        "caster_is_not_you" => Box::new(caster_is_not_you()),
        "is_support" => Box::new(is_support()),
        "is_tank" => Box::new(role_is(Role::Tank)),
        "is_healer" => Box::new(role_is(Role::Healer)),
        "is_dps" => Box::new(role_is(Role::Dps)),
        _ => return None,
    };
    Some(condition)
}
