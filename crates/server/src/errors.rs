use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quizd::QuizError;
use serde_json::json;
use tracing::error;

/// A custom error type for the server application.
///
/// This enum encapsulates different kinds of errors that can occur within the
/// server, allowing them to be converted into appropriate HTTP responses.
pub enum AppError {
    /// Errors originating from the `quizd` library.
    Quiz(QuizError),
    /// Missing or invalid credentials.
    Unauthorized(String),
    /// Valid credentials without the required permission.
    Forbidden(String),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        AppError::Quiz(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::Quiz(err) => match err {
                QuizError::Validation(_) | QuizError::Csv(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                QuizError::NotFound(_) | QuizError::NoContent => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                QuizError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
                other => {
                    // Storage and messaging details stay in the logs.
                    error!("QuizError: {:?}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal server error occurred.".to_string(),
                    )
                }
            },
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
