/*
 * Responsibility
 * - /user CRUD handlers
 * - extract Path and a JSON or form body, validate the DTO, call the repo
 * - user ids are plain UUIDs
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::users::{CreateUserRequest, UpdateUserRequest, UserResponse},
        extractors::JsonOrForm,
    },
    error::AppError,
    repos::user_repo,
    state::AppState,
};

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, AppError> {
    let rows = user_repo::list(&state.db).await?;
    Ok(Json(rows.into_iter().map(UserResponse::from).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    JsonOrForm(req): JsonOrForm<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    let row = user_repo::create(&state.db, &req.user_name, req.image_url.as_deref()).await?;
    tracing::info!(user_id = %row.id, "user created");

    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let row = user_repo::find(&state.db, user_id)
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    JsonOrForm(req): JsonOrForm<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    let image_url = req.image_url.as_ref().map(|inner| inner.as_deref());

    let row = user_repo::update(&state.db, user_id, req.user_name.as_deref(), image_url)
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if user_repo::delete(&state.db, user_id).await? {
        tracing::info!(user_id = %user_id, "user deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("user"))
    }
}
