//! # Authentication Extractors
//!
//! Two request guards: `AdminUser` for the admin dashboard routes and
//! `BiAccess` for the read-only BI export routes.
//!
//! An admin identifies either with a bearer JWT obtained from `/admin/login`,
//! or with an `x-telegram-id` header naming the configured bootstrap admin or
//! a user whose profile carries the admin flag. BI consumers present the
//! shared secret in `x-bi-secret`.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use crate::state::AppState;

/// The claims carried by an admin JWT.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The admin's username.
    pub sub: String,
    /// The expiration timestamp.
    pub exp: usize,
}

/// A custom rejection type for authentication failures.
pub struct AuthError(StatusCode, String);

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

/// An extractor that admits only administrators.
#[derive(Debug, Clone)]
pub struct AdminUser {
    /// The username (JWT path) or Telegram id (header path) that authenticated.
    pub identity: String,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer_header =
            Option::<TypedHeader<Authorization<Bearer>>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    warn!("Unexpected error during header extraction: {}", e);
                    AuthError(
                        StatusCode::BAD_REQUEST,
                        "Invalid Authorization header format.".to_string(),
                    )
                })?;

        if let Some(TypedHeader(Authorization(bearer))) = bearer_header {
            let token_data = decode::<Claims>(
                bearer.token(),
                &DecodingKey::from_secret(state.config.jwt_secret.as_ref()),
                &Validation::default(),
            )
            .map_err(|e| {
                warn!("JWT validation failed: {}", e);
                AuthError(
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token.".to_string(),
                )
            })?;

            return Ok(AdminUser {
                identity: token_data.claims.sub,
            });
        }

        // No token: fall back to the Telegram-identity header.
        let Some(telegram_id) = parts
            .headers
            .get("x-telegram-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
        else {
            return Err(AuthError(
                StatusCode::UNAUTHORIZED,
                "Missing credentials.".to_string(),
            ));
        };

        if state.config.admin_telegram_id.as_deref() == Some(telegram_id.as_str()) {
            return Ok(AdminUser {
                identity: telegram_id,
            });
        }

        let flagged = quizd::users::is_admin(&state.store, &telegram_id)
            .await
            .map_err(|e| {
                error!("Failed to check admin flag: {}", e);
                AuthError(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not verify credentials.".to_string(),
                )
            })?;
        if !flagged {
            return Err(AuthError(
                StatusCode::FORBIDDEN,
                "You do not have permission to access this resource.".to_string(),
            ));
        }

        Ok(AdminUser {
            identity: telegram_id,
        })
    }
}

/// An extractor that admits only requests carrying the BI export secret.
#[derive(Debug, Clone, Copy)]
pub struct BiAccess;

impl FromRequestParts<AppState> for BiAccess {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.bi_secret.as_deref() else {
            return Err(AuthError(
                StatusCode::FORBIDDEN,
                "BI export is not configured.".to_string(),
            ));
        };

        let presented = parts
            .headers
            .get("x-bi-secret")
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected) {
            return Err(AuthError(
                StatusCode::UNAUTHORIZED,
                "Invalid BI secret.".to_string(),
            ));
        }

        Ok(BiAccess)
    }
}
