//! MessagePusher trait: the realtime connection registry seen from the domain.
//!
//! A connection starts unscoped, becomes scoped to exactly one session after a
//! successful subscribe, and is removed on disconnect. Only scoped connections
//! receive session broadcasts.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    error::MessagePushError,
    value_object::{ConnectionId, SessionId, UserId},
};

/// Outbound frame channel of one connection
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Add a new unscoped connection
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// Remove a connection (idempotent)
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// Scope a connection to a session. A scoped connection is never re-scoped.
    async fn bind_session(
        &self,
        connection_id: &ConnectionId,
        session_id: SessionId,
        user_id: UserId,
    ) -> Result<(), MessagePushError>;

    /// Send a frame to one connection
    async fn push_to(&self, connection_id: &ConnectionId, content: &str) -> Result<(), MessagePushError>;

    /// Best-effort delivery to every connection scoped to `session_id`.
    ///
    /// Returns the number of connections the frame was handed to.
    async fn broadcast_to_session(&self, session_id: &SessionId, content: &str) -> usize;

    /// Like `broadcast_to_session`, limited to connections of `users`.
    async fn broadcast_to_users(&self, session_id: &SessionId, users: &[UserId], content: &str) -> usize;
}
