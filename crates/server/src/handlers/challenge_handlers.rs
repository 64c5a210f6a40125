//! Handlers for challenge campaigns: listing, activation, deactivation.

use crate::{auth::middleware::AdminUser, errors::AppError, state::AppState};
use axum::{extract::State, Json};
use quizd::challenge::{self, ActivationOutcome, Challenge, DeactivationOutcome};
use serde::Deserialize;

/// Handler for `GET /admin/challenges`: full history, newest first.
pub async fn list_challenges_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Challenge>>, AppError> {
    let challenges = challenge::list(&app_state.store).await?;
    Ok(Json(challenges))
}

/// The request body for `POST /admin/challenge/activate`.
#[derive(Debug, Deserialize)]
pub struct ActivateChallengeRequest {
    pub tipo: String,
    pub valor: String,
}

/// Handler for `POST /admin/challenge/activate`: opens a new campaign and
/// announces it. Conflicts if another challenge is already active.
pub async fn activate_challenge_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<ActivateChallengeRequest>,
) -> Result<Json<ActivationOutcome>, AppError> {
    let outcome = challenge::activate(
        &app_state.store,
        app_state.notifier.as_ref(),
        &request.tipo,
        &request.valor,
    )
    .await?;
    Ok(Json(outcome))
}

/// Handler for `POST /admin/challenge/deactivate`: closes the active campaign
/// and broadcasts its summary. A no-op when nothing is active.
pub async fn deactivate_challenge_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<DeactivationOutcome>, AppError> {
    let outcome = challenge::deactivate(&app_state.store, app_state.notifier.as_ref()).await?;
    Ok(Json(outcome))
}
