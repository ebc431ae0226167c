//! Domain entities persisted in the record store.
//!
//! Field names follow the wire/record format so an entity can be pushed to
//! realtime subscribers as-is.

use serde::{Serialize, Serializer};

use super::value_object::{
    BoardId, JoinToken, LogId, MessageKind, Name, ParticipantId, PatternId, PlaceId, Role,
    SceneId, SessionId, SessionVisibility, SpeakerType, StepId, TabId, Timestamp, TokenId, UserId,
};

/// Shared play space.
///
/// `join_token` is present iff `visibility` is `Link`; the constructor is the
/// only way to build one, so the invariant holds for every value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    id: SessionId,
    name: Name,
    visibility: SessionVisibility,
    join_token: Option<JoinToken>,
    created_at: Timestamp,
}

impl Session {
    pub fn new(id: SessionId, name: Name, visibility: SessionVisibility, created_at: Timestamp) -> Self {
        let join_token = match visibility {
            SessionVisibility::Link => Some(JoinToken::generate()),
            _ => None,
        };
        Self {
            id,
            name,
            visibility,
            join_token,
            created_at,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn visibility(&self) -> SessionVisibility {
        self.visibility
    }

    pub fn join_token(&self) -> Option<&JoinToken> {
        self.join_token.as_ref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Session metadata with the join token stripped.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            visibility: self.visibility,
            created_at: self.created_at,
        }
    }
}

/// Session metadata safe to show to anyone allowed to see the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub name: Name,
    pub visibility: SessionVisibility,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub role: Role,
    pub created_at: Timestamp,
}

/// Visibility-restricted chat channel. Empty allow-lists mean "unrestricted".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTab {
    pub id: TabId,
    pub session_id: SessionId,
    pub name: Name,
    #[serde(serialize_with = "empty_as_null")]
    pub allowed_roles: Vec<Role>,
    #[serde(serialize_with = "empty_as_null")]
    pub allowed_users: Vec<UserId>,
    pub toast_enabled: bool,
    pub is_default: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ChatTab {
    pub fn is_unrestricted(&self) -> bool {
        self.allowed_roles.is_empty() && self.allowed_users.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Speaker {
    pub speaker_type: SpeakerType,
    pub speaker_name: Option<String>,
    pub speaker_color: Option<String>,
    pub speaker_image_url: Option<String>,
}

/// Chat log entry.
///
/// When `visible_user_ids` is set it always contains `user_id` (the author).
/// A ghost entry has kind `Redacted` and points at the real message through
/// `redacted_for_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionLog {
    pub id: LogId,
    pub session_id: SessionId,
    pub tab_id: TabId,
    pub user_id: UserId,
    pub message: String,
    pub message_type: MessageKind,
    #[serde(flatten)]
    pub speaker: Speaker,
    pub message_font: Option<String>,
    pub dice_result: Option<serde_json::Value>,
    pub visible_user_ids: Option<Vec<UserId>>,
    pub redacted_for_id: Option<LogId>,
    pub created_at: Timestamp,
}

impl SessionLog {
    /// Whether `viewer` is in the explicit audience (or there is none).
    pub fn is_visible_to(&self, viewer: &UserId) -> bool {
        match &self.visible_user_ids {
            Some(users) => users.contains(viewer),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub id: PlaceId,
    pub session_id: SessionId,
    pub name: Name,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub id: PatternId,
    pub place_id: PlaceId,
    pub name: Name,
    pub background_url: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub id: SceneId,
    pub session_id: SessionId,
    pub name: Name,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneStep {
    pub id: StepId,
    pub scene_id: SceneId,
    pub place_id: PlaceId,
    pub pattern_id: PatternId,
    pub position: u32,
    pub created_at: Timestamp,
}

/// Pointer into the active scene's ordered steps. At most one per session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneState {
    pub session_id: SessionId,
    pub scene_id: SceneId,
    pub step_index: usize,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub id: BoardId,
    pub session_id: SessionId,
    pub background_url: Option<String>,
    pub updated_at: Timestamp,
}

/// Piece placed on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardToken {
    pub id: TokenId,
    pub session_id: SessionId,
    pub name: Name,
    pub x: f64,
    pub y: f64,
    pub image_url: Option<String>,
    pub updated_at: Timestamp,
}

#[allow(clippy::ptr_arg)]
fn empty_as_null<T: Serialize, S: Serializer>(values: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error> {
    if values.is_empty() {
        serializer.serialize_none()
    } else {
        serializer.collect_seq(values)
    }
}
