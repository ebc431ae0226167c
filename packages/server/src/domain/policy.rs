//! Authorization and visibility policies.
//!
//! Everything here is pure: callers load the rows, these functions decide.

use super::{
    entity::{ChatTab, Participant},
    value_object::{Role, TabId, UserId},
};

/// Outcome of looking up a user's participant row in a session.
///
/// Not being a member is a normal answer, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Membership {
    Member(Participant),
    NonMember,
}

impl Membership {
    pub fn is_member(&self) -> bool {
        matches!(self, Membership::Member(_))
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Membership::Member(participant) => Some(participant.role),
            Membership::NonMember => None,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role() == Some(Role::Owner)
    }
}

impl From<Option<Participant>> for Membership {
    fn from(row: Option<Participant>) -> Self {
        match row {
            Some(participant) => Membership::Member(participant),
            None => Membership::NonMember,
        }
    }
}

/// Which tab a chat request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabSelector {
    Explicit(TabId),
    Default,
}

impl TabSelector {
    /// Blank or missing ids select the session's default tab.
    pub fn from_optional(tab_id: Option<&str>) -> Self {
        match tab_id.and_then(|raw| TabId::new(raw.to_string()).ok()) {
            Some(id) => TabSelector::Explicit(id),
            None => TabSelector::Default,
        }
    }
}

/// Whether a participant may see a tab's messages.
///
/// Unrestricted tabs are visible to everyone; otherwise the user must be in
/// the user allow-list or hold a role in the role allow-list.
pub fn can_view_tab(tab: &ChatTab, role: Option<Role>, user_id: &UserId) -> bool {
    if tab.is_unrestricted() {
        return true;
    }
    if tab.allowed_users.contains(user_id) {
        return true;
    }
    matches!(role, Some(role) if tab.allowed_roles.contains(&role))
}

/// Trim entries, drop blanks and duplicates, keep first-seen order.
pub fn normalize_user_ids(raw: &[String]) -> Vec<UserId> {
    let mut users: Vec<UserId> = Vec::with_capacity(raw.len());
    for value in raw {
        if let Ok(user_id) = UserId::new(value.clone()) {
            if !users.contains(&user_id) {
                users.push(user_id);
            }
        }
    }
    users
}

/// Unknown role names are dropped.
pub fn normalize_roles(raw: &[String]) -> Vec<Role> {
    let mut roles: Vec<Role> = Vec::with_capacity(raw.len());
    for role in raw.iter().filter_map(|value| value.parse::<Role>().ok()) {
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
    roles
}

/// Final audience of a restricted message: the requested users that are
/// actually participants, plus the author (always).
pub fn restricted_audience(participants_among_requested: Vec<UserId>, author: &UserId) -> Vec<UserId> {
    let mut audience = participants_among_requested;
    if !audience.contains(author) {
        audience.push(author.clone());
    }
    audience
}
