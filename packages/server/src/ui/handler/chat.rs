//! Chat tab and chat log endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    domain::{ChatTab, SessionLog, TabId},
    infrastructure::dto::http::{
        CreateChatTabRequest, LogsQuery, PostMessageRequest, UpdateChatTabRequest,
    },
    ui::{
        extract::{AuthUser, session_id},
        state::AppState,
    },
    usecase::ServiceError,
};

pub async fn list_tabs(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
) -> Result<Json<Vec<ChatTab>>, ServiceError> {
    let session_id = session_id(raw_session_id)?;
    Ok(Json(
        state.chat_tab_usecase.list_tabs(&user_id, &session_id).await?,
    ))
}

pub async fn create_tab(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
    Json(req): Json<CreateChatTabRequest>,
) -> Result<(StatusCode, Json<ChatTab>), ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let tab = state
        .chat_tab_usecase
        .create_tab(&user_id, &session_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(tab)))
}

pub async fn update_tab(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_tab_id): Path<String>,
    Json(req): Json<UpdateChatTabRequest>,
) -> Result<Json<ChatTab>, ServiceError> {
    let tab_id = TabId::new(raw_tab_id)?;
    let tab = state
        .chat_tab_usecase
        .update_tab(&user_id, &tab_id, req.into())
        .await?;
    Ok(Json(tab))
}

pub async fn delete_tab(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_tab_id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    let tab_id = TabId::new(raw_tab_id)?;
    state.chat_tab_usecase.delete_tab(&user_id, &tab_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Logs of one tab; without `tab_id` the default tab is used.
pub async fn list_logs(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<SessionLog>>, ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let logs = state
        .chat_usecase
        .list_logs(&user_id, &session_id, query.tab_id.as_deref())
        .await?;
    Ok(Json(logs))
}

pub async fn post_message(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
    Json(req): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<SessionLog>), ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let log = state
        .chat_usecase
        .post_message(&user_id, &session_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(log)))
}
