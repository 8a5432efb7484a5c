//! Reusable responses
//!
//! A response picks its own severity per player, e.g. a tank buster is an
//! alert for its target but only info for the healers.

use raidwatch_types::Role;

use super::{Alert, Data, Severity};
use crate::combat_log::Matches;
use crate::output::{Output, OutputError};

fn fixed<S: 'static>(
    severity: Severity,
    key: &'static str,
) -> impl Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<Alert>, OutputError> + 'static {
    move |_: &mut Data<S>, _: &Matches, output: &Output<'_>| {
        Ok(Some(Alert::new(severity, output.text(key)?)))
    }
}

fn buster_on_player(player: &str, output: &Output<'_>) -> Result<String, OutputError> {
    output.format("tankBusterOnPlayer", &[("player", player)])
}

/// Alert for the target, info for supports, nothing for dps
pub fn tank_buster<S: 'static>()
-> impl Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<Alert>, OutputError> + 'static {
    |data: &mut Data<S>, matches: &Matches, output: &Output<'_>| {
        let target = matches.target();
        if target.is_empty() {
            return Ok(Some(Alert::new(Severity::Info, output.text("tankBuster")?)));
        }
        if data.is_me(target) {
            return Ok(Some(Alert::new(Severity::Alert, output.text("tankBusterOnYou")?)));
        }
        if data.role.is_support() {
            let text = buster_on_player(data.short_name(target), output)?;
            return Ok(Some(Alert::new(Severity::Info, text)));
        }
        Ok(None)
    }
}

/// Buster that forces a tank swap: alarm for both tanks
pub fn tank_buster_swap<S: 'static>()
-> impl Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<Alert>, OutputError> + 'static {
    |data: &mut Data<S>, matches: &Matches, output: &Output<'_>| {
        let target = matches.target();
        if data.is_me(target) {
            return Ok(Some(Alert::new(Severity::Alarm, output.text("tankBusterOnYou")?)));
        }
        match data.role {
            Role::Tank => Ok(Some(Alert::new(Severity::Alarm, output.text("tankSwap")?))),
            Role::Healer if !target.is_empty() => {
                let text = buster_on_player(data.short_name(target), output)?;
                Ok(Some(Alert::new(Severity::Alert, text)))
            }
            _ => Ok(None),
        }
    }
}

pub fn aoe<S: 'static>()
-> impl Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<Alert>, OutputError> + 'static {
    fixed(Severity::Info, "aoe")
}

pub fn big_aoe<S: 'static>()
-> impl Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<Alert>, OutputError> + 'static {
    fixed(Severity::Alert, "bigAoe")
}

pub fn bleed_aoe<S: 'static>()
-> impl Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<Alert>, OutputError> + 'static {
    fixed(Severity::Info, "bleedAoe")
}

pub fn protean<S: 'static>()
-> impl Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<Alert>, OutputError> + 'static {
    fixed(Severity::Alert, "protean")
}

pub fn look_away<S: 'static>()
-> impl Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<Alert>, OutputError> + 'static {
    fixed(Severity::Alert, "lookAway")
}

pub fn spread<S: 'static>()
-> impl Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<Alert>, OutputError> + 'static {
    fixed(Severity::Alert, "spread")
}

pub fn stack_marker<S: 'static>()
-> impl Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<Alert>, OutputError> + 'static {
    fixed(Severity::Alert, "stackMarker")
}

pub fn knockback<S: 'static>()
-> impl Fn(&mut Data<S>, &Matches, &Output<'_>) -> Result<Option<Alert>, OutputError> + 'static {
    fixed(Severity::Info, "knockback")
}

/// Look up a response by name (used by trigger set files)
pub fn by_name<S: 'static>(name: &str) -> Option<super::ResponseFn<S>> {
    let response: super::ResponseFn<S> = match name {
        "tank_buster" => Box::new(tank_buster()),
        "tank_buster_swap" => Box::new(tank_buster_swap()),
        "aoe" => Box::new(aoe()),
        "big_aoe" => Box::new(big_aoe()),
        "bleed_aoe" => Box::new(bleed_aoe()),
        "protean" => Box::new(protean()),
        "look_away" => Box::new(look_away()),
        "spread" => Box::new(spread()),
        "stack_marker" => Box::new(stack_marker()),
        "knockback" => Box::new(knockback()),
        _ => return None,
    };
    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputStrings;
    use raidwatch_types::{EngineConfig, Lang, PartyMemberConfig};

    fn data(role: Role) -> Data<()> {
        let config = EngineConfig {
            player_name: "Tini Poutini".into(),
            party: vec![
                PartyMemberConfig {
                    id: "10000001".into(),
                    name: "Tini Poutini".into(),
                    role,
                    nick: None,
                },
                PartyMemberConfig {
                    id: "10000002".into(),
                    name: "Potato Chippy".into(),
                    role: Role::Tank,
                    nick: Some("Tater".into()),
                },
            ],
            ..EngineConfig::default()
        };
        Data::new(&config, ())
    }

    #[test]
    fn tank_buster_severity_depends_on_player() {
        let strings = OutputStrings::new();
        let output = Output::new(Lang::En, &strings);
        let response = tank_buster::<()>();

        let on_me = Matches::new().with("target", "Tini Poutini");
        let alert = response(&mut data(Role::Tank), &on_me, &output).unwrap().unwrap();
        assert_eq!(alert, Alert::new(Severity::Alert, "Tank Buster on YOU"));

        let on_tater = Matches::new().with("target", "Potato Chippy");
        let alert = response(&mut data(Role::Healer), &on_tater, &output).unwrap().unwrap();
        assert_eq!(alert, Alert::new(Severity::Info, "Tank Buster on Tater"));

        assert!(response(&mut data(Role::Dps), &on_tater, &output).unwrap().is_none());
    }

    #[test]
    fn tank_swap_alarms_off_tank() {
        let strings = OutputStrings::new();
        let output = Output::new(Lang::De, &strings);
        let on_tater = Matches::new().with("target", "Potato Chippy");
        let alert = tank_buster_swap::<()>()(&mut data(Role::Tank), &on_tater, &output)
            .unwrap()
            .unwrap();
        assert_eq!(alert, Alert::new(Severity::Alarm, "Tankwechsel!"));
    }

    #[test]
    fn responses_resolve_by_name() {
        assert!(by_name::<()>("big_aoe").is_some());
        assert!(by_name::<()>("dance").is_none());
    }
}
