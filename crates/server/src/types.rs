//! Shared response shapes used by multiple handler modules.

use serde::Serialize;

/// The plain acknowledgement body most mutation endpoints return.
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self { status: "success" }
    }
}

/// The body returned by a successful admin login.
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// The body returned when a row was created.
#[derive(Serialize)]
pub struct CreatedResponse {
    pub status: &'static str,
    pub id: i64,
}

impl CreatedResponse {
    pub fn new(id: i64) -> Self {
        Self {
            status: "success",
            id,
        }
    }
}
