//! Domain-level error types.

use thiserror::Error;

/// Rejected value object construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    EmptyIdentifier(&'static str),

    #[error("name must not be empty")]
    EmptyName,

    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

/// Failure reported by the record store.
///
/// "No row" is never an error: lookups return `Ok(None)` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The store itself failed (connection, query, constraint we did not expect)
    #[error("storage error: {0}")]
    Storage(String),

    /// A uniqueness constraint rejected the write
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Failure while pushing a frame to a realtime connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("push failed: {0}")]
    PushFailed(String),

    #[error("connection '{0}' is already subscribed")]
    AlreadySubscribed(String),
}
