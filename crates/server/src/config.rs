//! # Application Configuration
//!
//! Loads the server configuration from environment variables (and an optional
//! `.env` file loaded in `main`). Every field has a default suitable for local
//! development except the secrets, which tests construct directly.

use config::{Config as ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

/// The server configuration, resolved once at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT`.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The path to the SQLite database file. Loaded from `DB_URL`.
    #[serde(default = "default_db_url")]
    pub db_url: String,
    /// The HMAC secret for admin JWTs. Loaded from `JWT_SECRET`.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// The Telegram Bot API token. Loaded from `TELEGRAM_BOT_TOKEN`.
    #[serde(default)]
    pub telegram_bot_token: String,
    /// The Telegram Bot API base URL, overridable so tests can point at a
    /// mock server. Loaded from `TELEGRAM_API_URL`.
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,
    /// A Telegram id that is always treated as an admin, so the first admin
    /// can bootstrap the rest. Loaded from `ADMIN_TELEGRAM_ID`.
    #[serde(default)]
    pub admin_telegram_id: Option<String>,
    /// The shared secret for the read-only BI export routes. Loaded from
    /// `BI_SECRET`; the routes reject everything when it is unset.
    #[serde(default)]
    pub bi_secret: Option<String>,
}

fn default_port() -> u16 {
    9090
}

fn default_db_url() -> String {
    "db/quizd.db".to_string()
}

fn default_jwt_secret() -> String {
    "a-secure-secret-key".to_string()
}

fn default_telegram_api_url() -> String {
    quizd::notify::telegram::TELEGRAM_API_BASE.to_string()
}

/// Loads the configuration from the environment.
pub fn get_config() -> Result<AppConfig, ConfigError> {
    let settings = ConfigBuilder::builder()
        .add_source(Environment::default())
        .build()?;
    settings.try_deserialize()
}
