//! Participant check backed by the record store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ParticipantCheck, SessionId, SessionRepository, UserId};

/// Answers the handshake's membership question from the participant table.
///
/// The bearer token is not needed here since the store is in-process; a
/// remote store would forward it for row-level access control.
pub struct StoreParticipantCheck {
    repository: Arc<dyn SessionRepository>,
}

impl StoreParticipantCheck {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl ParticipantCheck for StoreParticipantCheck {
    async fn is_participant(&self, _token: &str, session_id: &SessionId, user_id: &UserId) -> bool {
        match self.repository.find_participant(session_id, user_id).await {
            Ok(row) => row.is_some(),
            Err(e) => {
                tracing::error!(
                    "Participant check for session '{}' failed: {}",
                    session_id,
                    e
                );
                false
            }
        }
    }
}
