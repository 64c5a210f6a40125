//! Handlers for knowledge pills: CRUD, bulk import, and the manual trigger
//! that reuses the scheduler's send path.

use crate::{
    auth::middleware::AdminUser,
    errors::AppError,
    state::AppState,
    types::{CreatedResponse, StatusResponse},
};
use axum::{
    extract::{Path, State},
    Json,
};
use quizd::pills::{self, Pill, PillImportReport, PillOutcome};
use tracing::info;

/// Handler for `GET /admin/pills`.
pub async fn list_pills_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Pill>>, AppError> {
    let all = pills::list_pills(&app_state.store).await?;
    Ok(Json(all))
}

/// Handler for `POST /admin/pills`.
pub async fn create_pill_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Json(pill): Json<Pill>,
) -> Result<Json<CreatedResponse>, AppError> {
    let id = pills::insert_pill(&app_state.store, &pill).await?;
    Ok(Json(CreatedResponse::new(id)))
}

/// Handler for `PUT /admin/pills/{id}`.
pub async fn update_pill_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(pill): Json<Pill>,
) -> Result<Json<StatusResponse>, AppError> {
    pills::update_pill(&app_state.store, id, &pill).await?;
    Ok(Json(StatusResponse::success()))
}

/// Handler for `DELETE /admin/pills/{id}`.
pub async fn delete_pill_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>, AppError> {
    pills::delete_pill(&app_state.store, id).await?;
    Ok(Json(StatusResponse::success()))
}

/// Handler for `POST /admin/pills/import`: accepts the raw semicolon-delimited
/// file in the request body.
pub async fn import_pills_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    body: String,
) -> Result<Json<PillImportReport>, AppError> {
    let report = pills::import_pills(&app_state.store, &body).await?;
    Ok(Json(report))
}

/// Handler for `POST /admin/pills/send-now`: sends the next pill in the
/// rotation immediately, through the same path the scheduler uses.
pub async fn send_pill_now_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<PillOutcome>, AppError> {
    let outcome = pills::send_next_pill(&app_state.store, app_state.notifier.as_ref()).await?;
    info!(?outcome, requested_by = %admin.identity, "Manual pill send finished.");
    Ok(Json(outcome))
}
