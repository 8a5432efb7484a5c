use std::ops::{Deref, DerefMut};

use hashbrown::HashMap;
use raidwatch_types::{EngineConfig, Lang, Role};

use crate::party::Party;

/// Per-encounter state handed to trigger callbacks.
///
/// Wraps the trigger set's own state `S` together with player context.
/// Derefs to `S` so callbacks can read `data.field` directly.
#[derive(Debug, Clone)]
pub struct Data<S> {
    /// Local player name
    pub me: String,
    pub role: Role,
    pub lang: Lang,
    pub party: Party,
    /// Selected value of each option the set declares
    pub trigger_set_config: HashMap<String, String>,
    pub state: S,
}

impl<S> Data<S> {
    pub fn new(config: &EngineConfig, state: S) -> Self {
        Self {
            me: config.player_name.clone(),
            role: config.player_role(),
            lang: config.language,
            party: Party::from_config(&config.party),
            trigger_set_config: HashMap::new(),
            state,
        }
    }

    pub fn is_me(&self, name: &str) -> bool {
        !self.me.is_empty() && self.me == name
    }

    /// Selected value of a set option (None if the set declares no such option)
    pub fn set_option(&self, id: &str) -> Option<&str> {
        self.trigger_set_config.get(id).map(String::as_str)
    }

    /// Display name for a player (party nick if known)
    pub fn short_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.party.display_name(name)
    }
}

impl<S> Deref for Data<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.state
    }
}

impl<S> DerefMut for Data<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.state
    }
}
