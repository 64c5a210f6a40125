//! Handlers for user registration and profile lookup.

use crate::{errors::AppError, state::AppState, types::StatusResponse};
use axum::{
    extract::{Path, State},
    Json,
};
use quizd::{users, users::Profile, QuizError};
use tracing::info;

/// Handler for `POST /user`: creates or updates a profile.
pub async fn upsert_user_handler(
    State(app_state): State<AppState>,
    Json(profile): Json<Profile>,
) -> Result<Json<StatusResponse>, AppError> {
    info!(telegram_id = %profile.telegram_id, "Received profile upsert.");
    users::upsert_profile(&app_state.store, &profile).await?;
    Ok(Json(StatusResponse::success()))
}

/// Handler for `GET /user/{telegram_id}`.
pub async fn get_user_handler(
    State(app_state): State<AppState>,
    Path(telegram_id): Path<String>,
) -> Result<Json<Profile>, AppError> {
    let profile = users::get_profile(&app_state.store, &telegram_id)
        .await?
        .ok_or_else(|| QuizError::NotFound(format!("user {telegram_id}")))?;
    Ok(Json(profile))
}
