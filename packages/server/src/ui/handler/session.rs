//! Session and participant endpoints.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    domain::{Participant, Session, SessionSummary},
    infrastructure::dto::http::{
        AddParticipantRequest, AddParticipantResponse, CreateSessionRequest, JoinSessionQuery,
        JoinSessionRequest, SessionDetailDto,
    },
    ui::{
        extract::{AuthUser, session_id},
        state::AppState,
    },
    usecase::{JoinOutcome, ServiceError},
};

pub async fn create_session(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<Session>), ServiceError> {
    let session = state
        .session_usecase
        .create_session(&user_id, req.name, req.visibility.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn list_sessions(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SessionSummary>>, ServiceError> {
    Ok(Json(state.session_usecase.list_sessions(&user_id).await?))
}

pub async fn get_session(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
) -> Result<Json<SessionDetailDto>, ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let detail = state
        .session_usecase
        .session_detail(&user_id, &session_id)
        .await?;
    Ok(Json(detail.into()))
}

/// The token may come from the JSON body or from `?token=`. An empty or
/// missing body is accepted.
pub async fn join_session(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
    Query(query): Query<JoinSessionQuery>,
    body: Bytes,
) -> Result<StatusCode, ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let req: JoinSessionRequest = serde_json::from_slice(&body).unwrap_or_default();
    let token = req.join_token.or(query.token);
    state
        .session_usecase
        .join_with_token(&user_id, &session_id, token.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_participants(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
) -> Result<Json<Vec<Participant>>, ServiceError> {
    let session_id = session_id(raw_session_id)?;
    Ok(Json(
        state
            .session_usecase
            .list_participants(&user_id, &session_id)
            .await?,
    ))
}

/// 201 with the added user, or 204 when already a member.
pub async fn add_participant(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
    Json(req): Json<AddParticipantRequest>,
) -> Result<Response, ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let outcome = state
        .session_usecase
        .add_participant(&user_id, &session_id, req.user_id)
        .await?;
    Ok(match outcome {
        JoinOutcome::Joined(participant) => (
            StatusCode::CREATED,
            Json(AddParticipantResponse {
                user_id: participant.user_id.into_string(),
            }),
        )
            .into_response(),
        JoinOutcome::AlreadyMember => StatusCode::NO_CONTENT.into_response(),
    })
}
