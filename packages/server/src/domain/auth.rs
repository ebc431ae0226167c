//! Identity collaborators used by the realtime handshake and HTTP handlers.

use async_trait::async_trait;

use super::value_object::{SessionId, UserId};

/// Identity extracted from a verified bearer credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Verifies bearer credentials. Invalid tokens yield `None`, never an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Option<AuthenticatedUser>;
}

/// Membership check performed on behalf of the token holder
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParticipantCheck: Send + Sync {
    async fn is_participant(&self, token: &str, session_id: &SessionId, user_id: &UserId) -> bool;
}
