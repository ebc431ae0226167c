//! Domain layer: entities, value objects, policies and the interfaces the
//! domain needs from the outside world.

pub mod auth;
pub mod entity;
pub mod error;
pub mod event;
pub mod message_pusher;
pub mod policy;
pub mod redaction;
pub mod repository;
pub mod scene;
pub mod value_object;

pub use auth::{AuthenticatedUser, ParticipantCheck, TokenVerifier};
pub use entity::{
    Board, BoardToken, ChatTab, Participant, Pattern, Place, Scene, SceneState, SceneStep, Session,
    SessionLog, SessionSummary, Speaker,
};
pub use error::{MessagePushError, RepositoryError, ValueObjectError};
pub use event::{ChangeAction, ChangeEvent, ChangeRecord, Table};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use policy::{Membership, TabSelector, can_view_tab};
pub use redaction::{DEFAULT_MASK_RANGE, MASK_CHAR, MaskRange};
pub use repository::{
    BoardRepository, BoardUpsert, ChatRepository, SceneRepository, SessionRepository,
};
pub use value_object::{
    BoardId, ConnectionId, JoinToken, LogId, MessageKind, Name, ParticipantId, PatternId, PlaceId,
    Role, SceneId, SessionId, SessionVisibility, SpeakerType, StepId, TabId, Timestamp, TokenId,
    UserId,
};
