//! Party roster
//!
//! Built from the configured party list. Used for role lookups (mistake role
//! filters, responses) and to decide whose deaths get a report.

use raidwatch_types::{PartyMemberConfig, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyMember {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub nick: Option<String>,
}

impl PartyMember {
    /// Nickname if configured, otherwise the first name
    pub fn display_name(&self) -> &str {
        match &self.nick {
            Some(nick) if !nick.is_empty() => nick,
            _ => self.name.split(' ').next().unwrap_or(&self.name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Party {
    members: Vec<PartyMember>,
}

impl Party {
    pub fn new(members: Vec<PartyMember>) -> Self {
        Self { members }
    }

    pub fn from_config(members: &[PartyMemberConfig]) -> Self {
        Self::new(
            members
                .iter()
                .map(|m| PartyMember {
                    id: m.id.clone(),
                    name: m.name.clone(),
                    role: m.role,
                    nick: m.nick.clone(),
                })
                .collect(),
        )
    }

    pub fn member(&self, name: &str) -> Option<&PartyMember> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn member_by_id(&self, id: &str) -> Option<&PartyMember> {
        if id.is_empty() {
            return None;
        }
        self.members.iter().find(|m| m.id.eq_ignore_ascii_case(id))
    }

    /// Role of a named member. None when the name is not in the party.
    pub fn role_of(&self, name: &str) -> Option<Role> {
        self.member(name).map(|m| m.role)
    }

    /// Display name for any actor name (unknown names are returned as-is)
    pub fn display_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.member(name).map(PartyMember::display_name).unwrap_or(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.member(name).is_some()
    }

    pub fn members(&self) -> &[PartyMember] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party() -> Party {
        Party::new(vec![
            PartyMember {
                id: "10000001".into(),
                name: "Tini Poutini".into(),
                role: Role::Healer,
                nick: None,
            },
            PartyMember {
                id: "1000000A".into(),
                name: "Potato Chippy".into(),
                role: Role::Tank,
                nick: Some("Tater".into()),
            },
        ])
    }

    #[test]
    fn looks_up_roles_by_name() {
        let party = party();
        assert_eq!(party.role_of("Tini Poutini"), Some(Role::Healer));
        assert_eq!(party.role_of("Nobody"), None);
    }

    #[test]
    fn display_name_prefers_nick() {
        let party = party();
        assert_eq!(party.display_name("Potato Chippy"), "Tater");
        assert_eq!(party.display_name("Tini Poutini"), "Tini");
        assert_eq!(party.display_name("Fatebreaker"), "Fatebreaker");
    }

    #[test]
    fn member_by_id_ignores_hex_case() {
        let party = party();
        assert_eq!(party.member_by_id("1000000a").map(|m| m.role), Some(Role::Tank));
        assert!(party.member_by_id("").is_none());
    }
}
