//! Membership resolution and role gates.
//!
//! Every call re-reads the participant row; nothing is cached across
//! operations.

use std::sync::Arc;

use crate::domain::{
    ChatTab, Membership, Participant, Role, SessionId, SessionRepository, UserId, can_view_tab,
};

use super::error::ServiceError;

pub struct MembershipResolver {
    sessions: Arc<dyn SessionRepository>,
}

impl MembershipResolver {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    /// Not being a member is `Ok(Membership::NonMember)`; only storage
    /// failures are errors.
    pub async fn resolve(&self, session_id: &SessionId, user_id: &UserId) -> Result<Membership, ServiceError> {
        let row = self.sessions.find_participant(session_id, user_id).await?;
        Ok(Membership::from(row))
    }

    pub async fn require_member(&self, session_id: &SessionId, user_id: &UserId) -> Result<Participant, ServiceError> {
        match self.resolve(session_id, user_id).await? {
            Membership::Member(participant) => Ok(participant),
            Membership::NonMember => {
                tracing::debug!("User '{}' is not a member of session '{}'", user_id, session_id);
                Err(ServiceError::Forbidden)
            }
        }
    }

    pub async fn require_owner(&self, session_id: &SessionId, user_id: &UserId) -> Result<Participant, ServiceError> {
        let participant = self.require_member(session_id, user_id).await?;
        if participant.role != Role::Owner {
            tracing::debug!("User '{}' is not an owner of session '{}'", user_id, session_id);
            return Err(ServiceError::Forbidden);
        }
        Ok(participant)
    }

    /// Participants allowed to see `tab`, or `None` when the tab is
    /// unrestricted and the whole session may see it.
    pub async fn tab_viewers(&self, tab: &ChatTab) -> Result<Option<Vec<UserId>>, ServiceError> {
        if tab.is_unrestricted() {
            return Ok(None);
        }
        let viewers = self
            .sessions
            .list_participants(&tab.session_id)
            .await?
            .into_iter()
            .filter(|participant| can_view_tab(tab, Some(participant.role), &participant.user_id))
            .map(|participant| participant.user_id)
            .collect();
        Ok(Some(viewers))
    }
}
