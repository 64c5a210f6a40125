//! Handlers for admin authentication and account management.

use crate::{
    auth::middleware::{AdminUser, Claims},
    errors::AppError,
    state::AppState,
    types::{StatusResponse, TokenResponse},
};
use axum::{
    extract::{Path, State},
    Json,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use quizd::{users, QuizError};
use rand::{distributions::Alphanumeric, Rng};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use turso::params;

/// How long an admin JWT stays valid.
const TOKEN_LIFETIME_SECS: i64 = 8 * 60 * 60;

/// Hashes a password with its per-account salt.
pub(crate) fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// The request body for `POST /admin/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Handler for `POST /admin/login`: verifies the credential and issues a JWT.
pub async fn login_handler(
    State(app_state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let conn = app_state.store.connect().map_err(QuizError::from)?;
    let mut rows = conn
        .query(
            "SELECT password_hash, salt FROM admins WHERE username = ?",
            params![request.username.clone()],
        )
        .await
        .map_err(QuizError::from)?;

    let Some(row) = rows.next().await.map_err(QuizError::from)? else {
        warn!(username = %request.username, "Login attempt for unknown admin.");
        return Err(AppError::Unauthorized("Invalid credentials.".to_string()));
    };
    let stored_hash: String = row.get(0).map_err(QuizError::from)?;
    let salt: String = row.get(1).map_err(QuizError::from)?;

    if hash_password(&salt, &request.password) != stored_hash {
        warn!(username = %request.username, "Login attempt with wrong password.");
        return Err(AppError::Unauthorized("Invalid credentials.".to_string()));
    }

    let claims = Claims {
        sub: request.username.clone(),
        exp: (chrono::Utc::now().timestamp() + TOKEN_LIFETIME_SECS) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(app_state.config.jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(e.into()))?;

    info!(username = %request.username, "Admin logged in.");
    Ok(Json(TokenResponse { token }))
}

/// The request body for `POST /admin/admins`.
#[derive(Debug, Deserialize)]
pub struct AddAdminRequest {
    pub username: String,
    pub password: String,
    pub telegram_id: String,
}

/// Handler for `POST /admin/admins`: flags the user as an admin and stores
/// their dashboard credential, both inside one transaction.
pub async fn add_admin_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Json(request): Json<AddAdminRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    if request.username.trim().is_empty() || request.password.trim().is_empty() {
        return Err(QuizError::Validation("username and password are required".to_string()).into());
    }
    if request.telegram_id.trim().is_empty() {
        return Err(QuizError::Validation("telegram_id is required".to_string()).into());
    }

    let salt = generate_salt();
    let password_hash = hash_password(&salt, &request.password);

    let conn = app_state.store.connect().map_err(QuizError::from)?;
    conn.execute("BEGIN", ()).await.map_err(QuizError::from)?;
    let steps = async {
        let mut rows = conn
            .query(
                "SELECT 1 FROM admins WHERE username = ?",
                params![request.username.clone()],
            )
            .await?;
        if rows.next().await?.is_some() {
            return Err(QuizError::Conflict(format!(
                "admin '{}' already exists",
                request.username
            )));
        }

        let changed = conn
            .execute(
                "UPDATE users SET is_admin = 1 WHERE telegram_id = ?",
                params![request.telegram_id.clone()],
            )
            .await?;
        if changed == 0 {
            conn.execute(
                "INSERT INTO users (telegram_id, nome, is_admin, data_registro) \
                 VALUES (?, ?, 1, datetime('now'))",
                params![request.telegram_id.clone(), request.username.clone()],
            )
            .await?;
        }

        conn.execute(
            "INSERT INTO admins (username, password_hash, salt, telegram_id) \
             VALUES (?, ?, ?, ?)",
            params![
                request.username.clone(),
                password_hash.clone(),
                salt.clone(),
                request.telegram_id.clone()
            ],
        )
        .await?;
        Ok::<(), QuizError>(())
    };
    match steps.await {
        Ok(()) => conn.execute("COMMIT", ()).await.map_err(QuizError::from)?,
        Err(e) => {
            let _ = conn.execute("ROLLBACK", ()).await;
            return Err(e.into());
        }
    };

    info!(
        username = %request.username,
        granted_by = %admin.identity,
        "Created admin account."
    );
    Ok(Json(StatusResponse::success()))
}

/// Handler for `DELETE /admin/users/{telegram_id}`: removes the user and all
/// their session history.
pub async fn delete_user_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Path(telegram_id): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    users::delete_user(&app_state.store, &telegram_id).await?;
    info!(telegram_id = %telegram_id, deleted_by = %admin.identity, "Deleted user.");
    Ok(Json(StatusResponse::success()))
}
