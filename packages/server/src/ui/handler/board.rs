//! Board endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    domain::{Board, BoardToken},
    infrastructure::dto::http::{PlaceTokenRequest, UpdateBoardRequest},
    ui::{
        extract::{AuthUser, session_id},
        state::AppState,
    },
    usecase::ServiceError,
};

/// 204 when the session has no board yet.
pub async fn get_board(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
) -> Result<Response, ServiceError> {
    let session_id = session_id(raw_session_id)?;
    Ok(match state.board_usecase.get_board(&user_id, &session_id).await? {
        Some(board) => Json(board).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

pub async fn update_board(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
    Json(req): Json<UpdateBoardRequest>,
) -> Result<Json<Board>, ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let board = state
        .board_usecase
        .update_board(&user_id, &session_id, req.background_url)
        .await?;
    Ok(Json(board))
}

pub async fn place_token(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
    Json(req): Json<PlaceTokenRequest>,
) -> Result<(StatusCode, Json<BoardToken>), ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let input = req
        .into_new_token()
        .ok_or_else(|| ServiceError::Validation("name, x, y are required".to_string()))?;
    let token = state
        .board_usecase
        .place_token(&user_id, &session_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(token)))
}
