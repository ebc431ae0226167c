//! HTTP API request and response bodies.
//!
//! Request fields are lenient (`#[serde(default)]`) so that a missing field
//! reaches the use case and is reported with the same message as an empty one.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{JoinToken, Pattern, Place, Role, Scene, SceneState, SceneStep, SessionSummary},
    usecase::{
        ChatTabPatch, NewBoardToken, NewChatTab, PlaceWithPatterns, PostMessage, SceneProgress,
        SceneView, SceneWithSteps, SessionDetail, StepView,
    },
};

// ========================================
// Requests
// ========================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub name: String,
    pub visibility: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinSessionRequest {
    pub join_token: Option<String>,
}

/// `?token=` is accepted as an alternative to the body field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinSessionQuery {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddParticipantRequest {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateChatTabRequest {
    #[serde(default)]
    pub name: String,
    pub allowed_roles: Option<Vec<String>>,
    pub allowed_users: Option<Vec<String>>,
    pub toast_enabled: Option<bool>,
}

impl From<CreateChatTabRequest> for NewChatTab {
    fn from(req: CreateChatTabRequest) -> Self {
        NewChatTab {
            name: req.name,
            allowed_roles: req.allowed_roles.unwrap_or_default(),
            allowed_users: req.allowed_users.unwrap_or_default(),
            toast_enabled: req.toast_enabled,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateChatTabRequest {
    pub name: Option<String>,
    pub allowed_roles: Option<Vec<String>>,
    pub allowed_users: Option<Vec<String>>,
    pub toast_enabled: Option<bool>,
}

impl From<UpdateChatTabRequest> for ChatTabPatch {
    fn from(req: UpdateChatTabRequest) -> Self {
        ChatTabPatch {
            name: req.name,
            allowed_roles: req.allowed_roles,
            allowed_users: req.allowed_users,
            toast_enabled: req.toast_enabled,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsQuery {
    pub tab_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostMessageRequest {
    #[serde(default)]
    pub message: String,
    pub message_type: Option<String>,
    pub speaker_type: Option<String>,
    pub speaker_name: Option<String>,
    pub speaker_color: Option<String>,
    pub speaker_image_url: Option<String>,
    pub message_font: Option<String>,
    pub dice_result: Option<serde_json::Value>,
    pub tab_id: Option<String>,
    pub visible_user_ids: Option<Vec<String>>,
    #[serde(default)]
    pub redact_for_others: bool,
}

impl From<PostMessageRequest> for PostMessage {
    fn from(req: PostMessageRequest) -> Self {
        PostMessage {
            tab: req.tab_id,
            message: req.message,
            message_type: req.message_type,
            speaker_type: req.speaker_type,
            speaker_name: req.speaker_name,
            speaker_color: req.speaker_color,
            speaker_image_url: req.speaker_image_url,
            message_font: req.message_font,
            dice_result: req.dice_result,
            visible_user_ids: req.visible_user_ids.unwrap_or_default(),
            redact_for_others: req.redact_for_others,
        }
    }
}

/// Body of place and scene creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePatternRequest {
    #[serde(default)]
    pub name: String,
    pub background_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppendStepRequest {
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub pattern_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivateSceneRequest {
    #[serde(default)]
    pub scene_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBoardRequest {
    pub background_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceTokenRequest {
    #[serde(default)]
    pub name: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub image_url: Option<String>,
}

impl PlaceTokenRequest {
    /// `None` when a coordinate is missing.
    pub fn into_new_token(self) -> Option<NewBoardToken> {
        Some(NewBoardToken {
            name: self.name,
            x: self.x?,
            y: self.y?,
            image_url: self.image_url,
        })
    }
}

// ========================================
// Responses
// ========================================

/// Session metadata plus the caller's view of it.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetailDto {
    #[serde(flatten)]
    pub session: SessionSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_token: Option<JoinToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_role: Option<Role>,
}

impl From<SessionDetail> for SessionDetailDto {
    fn from(detail: SessionDetail) -> Self {
        SessionDetailDto {
            session: detail.session,
            join_token: detail.join_token,
            participant_role: detail.participant_role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddParticipantResponse {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceDto {
    #[serde(flatten)]
    pub place: Place,
    pub place_patterns: Vec<Pattern>,
}

impl From<PlaceWithPatterns> for PlaceDto {
    fn from(value: PlaceWithPatterns) -> Self {
        PlaceDto {
            place: value.place,
            place_patterns: value.patterns,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneDto {
    #[serde(flatten)]
    pub scene: Scene,
    pub scene_steps: Vec<SceneStep>,
}

impl From<SceneWithSteps> for SceneDto {
    fn from(value: SceneWithSteps) -> Self {
        SceneDto {
            scene: value.scene,
            scene_steps: value.steps,
        }
    }
}

/// A step with the background of its pattern.
#[derive(Debug, Clone, Serialize)]
pub struct StepDto {
    #[serde(flatten)]
    pub step: SceneStep,
    pub background_url: Option<String>,
}

impl From<StepView> for StepDto {
    fn from(view: StepView) -> Self {
        StepDto {
            step: view.step,
            background_url: view.background_url,
        }
    }
}

/// `{state, step}`; either may be null on read.
#[derive(Debug, Clone, Serialize)]
pub struct SceneStateDto {
    pub state: Option<SceneState>,
    pub step: Option<StepDto>,
}

impl From<SceneView> for SceneStateDto {
    fn from(view: SceneView) -> Self {
        SceneStateDto {
            state: view.state,
            step: view.step.map(StepDto::from),
        }
    }
}

impl From<SceneProgress> for SceneStateDto {
    fn from(progress: SceneProgress) -> Self {
        SceneStateDto {
            state: Some(progress.state),
            step: Some(progress.step.into()),
        }
    }
}
