//! Record store interfaces.
//!
//! The domain declares what it needs from durable storage; the infrastructure
//! layer provides the implementation. Every lookup returns `Ok(None)` for a
//! missing row so callers can tell "not found" from a storage failure.

use async_trait::async_trait;

use super::{
    entity::{
        Board, BoardToken, ChatTab, Participant, Pattern, Place, Scene, SceneState, SceneStep,
        Session, SessionLog,
    },
    error::RepositoryError,
    value_object::{
        BoardId, PatternId, PlaceId, SceneId, SessionId, TabId, Timestamp, UserId,
    },
};

/// Sessions and their participant rows
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert_session(&self, session: Session) -> Result<(), RepositoryError>;

    async fn find_session(&self, session_id: &SessionId) -> Result<Option<Session>, RepositoryError>;

    /// Sessions where `user_id` is a participant
    async fn list_member_sessions(&self, user_id: &UserId) -> Result<Vec<Session>, RepositoryError>;

    async fn list_public_sessions(&self) -> Result<Vec<Session>, RepositoryError>;

    /// Fails with `RepositoryError::Conflict` when the (session, user) pair exists
    async fn insert_participant(&self, participant: Participant) -> Result<(), RepositoryError>;

    async fn find_participant(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> Result<Option<Participant>, RepositoryError>;

    /// Participants ordered by creation time
    async fn list_participants(&self, session_id: &SessionId) -> Result<Vec<Participant>, RepositoryError>;

    /// The subset of `user_ids` that are participants of the session
    async fn filter_participants(
        &self,
        session_id: &SessionId,
        user_ids: &[UserId],
    ) -> Result<Vec<UserId>, RepositoryError>;
}

/// Chat tabs and session logs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn insert_tab(&self, tab: ChatTab) -> Result<(), RepositoryError>;

    async fn find_tab(&self, tab_id: &TabId) -> Result<Option<ChatTab>, RepositoryError>;

    /// `is_default` first, then the earliest-created tab
    async fn find_default_tab(&self, session_id: &SessionId) -> Result<Option<ChatTab>, RepositoryError>;

    /// Same ordering as `find_default_tab`
    async fn list_tabs(&self, session_id: &SessionId) -> Result<Vec<ChatTab>, RepositoryError>;

    async fn update_tab(&self, tab: ChatTab) -> Result<(), RepositoryError>;

    /// Returns whether a row was deleted
    async fn delete_tab(&self, tab_id: &TabId) -> Result<bool, RepositoryError>;

    async fn insert_log(&self, log: SessionLog) -> Result<(), RepositoryError>;

    /// Logs of one tab as seen by `viewer`, oldest first.
    ///
    /// Entries with an explicit audience are only returned to that audience;
    /// a ghost entry is hidden from viewers who can read its real message.
    async fn list_logs(
        &self,
        session_id: &SessionId,
        tab_id: &TabId,
        viewer: &UserId,
    ) -> Result<Vec<SessionLog>, RepositoryError>;
}

/// Places, patterns, scenes, steps and the per-session scene state
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SceneRepository: Send + Sync {
    async fn insert_place(&self, place: Place) -> Result<(), RepositoryError>;

    async fn find_place(&self, place_id: &PlaceId) -> Result<Option<Place>, RepositoryError>;

    async fn list_places(&self, session_id: &SessionId) -> Result<Vec<Place>, RepositoryError>;

    async fn insert_pattern(&self, pattern: Pattern) -> Result<(), RepositoryError>;

    async fn find_pattern(&self, pattern_id: &PatternId) -> Result<Option<Pattern>, RepositoryError>;

    async fn list_patterns(&self, place_id: &PlaceId) -> Result<Vec<Pattern>, RepositoryError>;

    async fn insert_scene(&self, scene: Scene) -> Result<(), RepositoryError>;

    async fn find_scene(&self, scene_id: &SceneId) -> Result<Option<Scene>, RepositoryError>;

    async fn list_scenes(&self, session_id: &SessionId) -> Result<Vec<Scene>, RepositoryError>;

    async fn insert_step(&self, step: SceneStep) -> Result<(), RepositoryError>;

    async fn last_step_position(&self, scene_id: &SceneId) -> Result<Option<u32>, RepositoryError>;

    /// Steps ordered by `position` ascending
    async fn list_steps(&self, scene_id: &SceneId) -> Result<Vec<SceneStep>, RepositoryError>;

    async fn find_scene_state(&self, session_id: &SessionId) -> Result<Option<SceneState>, RepositoryError>;

    /// Insert or replace the session's scene state
    async fn upsert_scene_state(&self, state: SceneState) -> Result<(), RepositoryError>;

    /// Single-statement index update; `Ok(None)` when no state exists
    async fn update_step_index(
        &self,
        session_id: &SessionId,
        step_index: usize,
        updated_at: Timestamp,
    ) -> Result<Option<SceneState>, RepositoryError>;
}

/// Outcome of `BoardRepository::upsert_board_background`
#[derive(Debug, Clone, PartialEq)]
pub enum BoardUpsert {
    Inserted(Board),
    Updated(Board),
    /// The background was already in place; nothing was written.
    Unchanged(Board),
}

impl BoardUpsert {
    pub fn into_board(self) -> Board {
        match self {
            BoardUpsert::Inserted(board) | BoardUpsert::Updated(board) | BoardUpsert::Unchanged(board) => board,
        }
    }
}

/// Board and board tokens
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardRepository: Send + Sync {
    async fn find_board(&self, session_id: &SessionId) -> Result<Option<Board>, RepositoryError>;

    /// Select-or-insert of the session's single board in one step: creates it
    /// with `new_id` when missing, otherwise updates the background if it
    /// differs.
    async fn upsert_board_background(
        &self,
        session_id: &SessionId,
        new_id: BoardId,
        background_url: Option<String>,
        updated_at: Timestamp,
    ) -> Result<BoardUpsert, RepositoryError>;

    async fn insert_token(&self, token: BoardToken) -> Result<(), RepositoryError>;
}
