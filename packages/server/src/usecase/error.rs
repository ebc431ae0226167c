//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{RepositoryError, ValueObjectError};

/// Failure of a session operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The named entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Authenticated, but not a member, not an owner, or the tab is hidden
    #[error("forbidden")]
    Forbidden,

    /// Missing or invalid credential
    #[error("unauthorized")]
    Unauthorized,

    /// Business-rule violation
    #[error("{0}")]
    InvalidState(String),

    /// Malformed request input
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl From<ValueObjectError> for ServiceError {
    fn from(e: ValueObjectError) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

/// Failure of the realtime subscribe handshake.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscribeError {
    #[error("invalid payload")]
    InvalidPayload,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("already subscribed")]
    AlreadySubscribed,
}
