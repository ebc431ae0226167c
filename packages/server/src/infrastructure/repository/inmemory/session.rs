//! `SessionRepository` for the in-memory store.

use async_trait::async_trait;

use crate::domain::{
    Participant, RepositoryError, Session, SessionId, SessionRepository, SessionVisibility, UserId,
};

use super::InMemoryRecordStore;

#[async_trait]
impl SessionRepository for InMemoryRecordStore {
    async fn insert_session(&self, session: Session) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.sessions.iter().any(|s| s.id() == session.id()) {
            return Err(RepositoryError::Conflict(format!(
                "session '{}' already exists",
                session.id()
            )));
        }
        tables.sessions.push(session);
        Ok(())
    }

    async fn find_session(&self, session_id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.sessions.iter().find(|s| s.id() == session_id).cloned())
    }

    async fn list_member_sessions(&self, user_id: &UserId) -> Result<Vec<Session>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .iter()
            .filter(|session| {
                tables
                    .participants
                    .iter()
                    .any(|p| &p.session_id == session.id() && &p.user_id == user_id)
            })
            .cloned()
            .collect())
    }

    async fn list_public_sessions(&self) -> Result<Vec<Session>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .iter()
            .filter(|s| s.visibility() == SessionVisibility::Public)
            .cloned()
            .collect())
    }

    async fn insert_participant(&self, participant: Participant) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables
            .participants
            .iter()
            .any(|p| p.session_id == participant.session_id && p.user_id == participant.user_id)
        {
            return Err(RepositoryError::Conflict(format!(
                "user '{}' is already a participant of session '{}'",
                participant.user_id, participant.session_id
            )));
        }
        tables.participants.push(participant);
        Ok(())
    }

    async fn find_participant(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> Result<Option<Participant>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .participants
            .iter()
            .find(|p| &p.session_id == session_id && &p.user_id == user_id)
            .cloned())
    }

    async fn list_participants(&self, session_id: &SessionId) -> Result<Vec<Participant>, RepositoryError> {
        let tables = self.tables.lock().await;
        let mut participants: Vec<Participant> = tables
            .participants
            .iter()
            .filter(|p| &p.session_id == session_id)
            .cloned()
            .collect();
        participants.sort_by_key(|p| p.created_at);
        Ok(participants)
    }

    async fn filter_participants(
        &self,
        session_id: &SessionId,
        user_ids: &[UserId],
    ) -> Result<Vec<UserId>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(user_ids
            .iter()
            .filter(|user_id| {
                tables
                    .participants
                    .iter()
                    .any(|p| &p.session_id == session_id && &p.user_id == *user_id)
            })
            .cloned()
            .collect())
    }
}
