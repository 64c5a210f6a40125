use thiserror::Error;

/// Custom error types for the application.
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Storage connection error: {0}")]
    StorageConnection(String),
    #[error("Storage operation failed: {0}")]
    Storage(String),
    #[error("No questions available for this profile")]
    NoContent,
    #[error("{0} not found")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Messaging error: {0}")]
    Notify(String),
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<turso::Error> for QuizError {
    fn from(err: turso::Error) -> Self {
        QuizError::Storage(err.to_string())
    }
}

impl From<crate::notify::NotifyError> for QuizError {
    fn from(err: crate::notify::NotifyError) -> Self {
        QuizError::Notify(err.to_string())
    }
}
