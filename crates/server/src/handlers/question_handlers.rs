//! Handlers for the admin question bank: CRUD, bulk import, bulk delete.
//! Every mutation invalidates the question cache.

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
use quizd::questions::{self, import, ImportReport, Question};
use serde::Serialize;
use tracing::info;

/// Handler for `GET /admin/questions`.
pub async fn list_questions_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Question>>, AppError> {
    let all = questions::list_questions(&app_state.store).await?;
    Ok(Json(all))
}

/// Handler for `POST /admin/questions`.
pub async fn create_question_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Json(question): Json<Question>,
) -> Result<Json<CreatedResponse>, AppError> {
    let id = questions::insert_question(&app_state.store, &app_state.questions, &question).await?;
    Ok(Json(CreatedResponse::new(id)))
}

/// Handler for `PUT /admin/questions/{id}`.
pub async fn update_question_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(question): Json<Question>,
) -> Result<Json<StatusResponse>, AppError> {
    questions::update_question(&app_state.store, &app_state.questions, id, &question).await?;
    Ok(Json(StatusResponse::success()))
}

/// Handler for `DELETE /admin/questions/{id}`.
pub async fn delete_question_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>, AppError> {
    questions::delete_question(&app_state.store, &app_state.questions, id).await?;
    Ok(Json(StatusResponse::success()))
}

/// The response body for the bulk delete.
#[derive(Serialize)]
pub struct BulkDeleteResponse {
    pub status: &'static str,
    pub removed: u64,
}

/// Handler for `DELETE /admin/questions`: clears the whole question bank.
pub async fn delete_all_questions_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<BulkDeleteResponse>, AppError> {
    let removed = questions::delete_all_questions(&app_state.store, &app_state.questions).await?;
    info!(removed, requested_by = %admin.identity, "Bulk-deleted question bank.");
    Ok(Json(BulkDeleteResponse {
        status: "success",
        removed,
    }))
}

/// Handler for `POST /admin/questions/import`: accepts the raw
/// semicolon-delimited file in the request body and reports partial success.
pub async fn import_questions_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    body: String,
) -> Result<Json<ImportReport>, AppError> {
    let report = import::import_questions(&app_state.store, &app_state.questions, &body).await?;
    Ok(Json(report))
}
