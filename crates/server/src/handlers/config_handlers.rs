//! Handlers for the runtime configuration stored in the `settings` table.
//! Changing the pill interval restarts the scheduler so the new value takes
//! effect immediately.

use crate::{auth::middleware::AdminUser, errors::AppError, state::AppState, types::StatusResponse};
use axum::{extract::State, Json};
use quizd::{
    settings::{self, SettingKey},
    QuizError,
};
use std::collections::BTreeMap;
use tracing::info;

/// Handler for `GET /admin/config`: every stored key/value pair.
pub async fn get_config_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<BTreeMap<String, String>>, AppError> {
    let entries = settings::all(&app_state.store).await?;
    Ok(Json(entries.into_iter().collect()))
}

/// Handler for `PUT /admin/config`: applies a map of typed setting writes.
/// Unknown keys and ill-typed values are rejected before anything is written.
pub async fn update_config_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Json(updates): Json<BTreeMap<String, String>>,
) -> Result<Json<StatusResponse>, AppError> {
    let mut writes = Vec::with_capacity(updates.len());
    for (name, value) in &updates {
        let key = SettingKey::from_name(name)
            .ok_or_else(|| QuizError::Validation(format!("unknown setting '{name}'")))?;
        writes.push((key, value.as_str()));
    }

    let mut interval_changed = false;
    for (key, value) in writes {
        settings::set(&app_state.store, key, value).await?;
        if key == SettingKey::PillIntervalMinutes {
            interval_changed = true;
        }
    }

    if interval_changed {
        app_state.scheduler.restart().await?;
    }

    info!(
        updated = updates.len(),
        interval_changed,
        updated_by = %admin.identity,
        "Applied configuration update."
    );
    Ok(Json(StatusResponse::success()))
}
