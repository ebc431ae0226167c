//! Place, pattern, scene and scene progression endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{Pattern, Place, PlaceId, Scene, SceneId, SceneStep},
    infrastructure::dto::http::{
        ActivateSceneRequest, AppendStepRequest, CreatePatternRequest, NameRequest, PlaceDto,
        SceneDto, SceneStateDto,
    },
    ui::{
        extract::{AuthUser, session_id},
        state::AppState,
    },
    usecase::ServiceError,
};

pub async fn list_places(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
) -> Result<Json<Vec<PlaceDto>>, ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let places = state.scene_usecase.list_places(&user_id, &session_id).await?;
    Ok(Json(places.into_iter().map(PlaceDto::from).collect()))
}

pub async fn create_place(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<Place>), ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let place = state
        .scene_usecase
        .create_place(&user_id, &session_id, req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(place)))
}

pub async fn create_pattern(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_place_id): Path<String>,
    Json(req): Json<CreatePatternRequest>,
) -> Result<(StatusCode, Json<Pattern>), ServiceError> {
    let place_id = PlaceId::new(raw_place_id)?;
    let pattern = state
        .scene_usecase
        .create_pattern(&user_id, &place_id, req.name, req.background_url)
        .await?;
    Ok((StatusCode::CREATED, Json(pattern)))
}

pub async fn list_scenes(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
) -> Result<Json<Vec<SceneDto>>, ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let scenes = state.scene_usecase.list_scenes(&user_id, &session_id).await?;
    Ok(Json(scenes.into_iter().map(SceneDto::from).collect()))
}

pub async fn create_scene(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<Scene>), ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let scene = state
        .scene_usecase
        .create_scene(&user_id, &session_id, req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(scene)))
}

pub async fn append_step(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_scene_id): Path<String>,
    Json(req): Json<AppendStepRequest>,
) -> Result<(StatusCode, Json<SceneStep>), ServiceError> {
    let scene_id = SceneId::new(raw_scene_id)?;
    let step = state
        .scene_usecase
        .append_step(&user_id, &scene_id, &req.place_id, &req.pattern_id)
        .await?;
    Ok((StatusCode::CREATED, Json(step)))
}

pub async fn get_scene_state(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
) -> Result<Json<SceneStateDto>, ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let view = state.scene_usecase.read(&user_id, &session_id).await?;
    Ok(Json(view.into()))
}

pub async fn activate_scene(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
    Json(req): Json<ActivateSceneRequest>,
) -> Result<Json<SceneStateDto>, ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let scene_id = SceneId::new(req.scene_id)
        .map_err(|_| ServiceError::Validation("scene_id is required".to_string()))?;
    let progress = state
        .scene_usecase
        .activate(&user_id, &session_id, &scene_id)
        .await?;
    Ok(Json(progress.into()))
}

pub async fn advance_scene(
    AuthUser(user_id): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(raw_session_id): Path<String>,
) -> Result<Json<SceneStateDto>, ServiceError> {
    let session_id = session_id(raw_session_id)?;
    let progress = state.scene_usecase.advance(&user_id, &session_id).await?;
    Ok(Json(progress.into()))
}
