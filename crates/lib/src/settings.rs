//! # Application Settings
//!
//! A typed schema over the `settings` key/value table. Every key is enumerated
//! with a declared type and default, so readers never have to sniff whether a
//! stored value is a boolean, a number, or a string.

use crate::{errors::QuizError, store::Store};
use turso::params;

/// The value type a setting key is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Bool,
    Int,
}

/// Every configuration key the application reads, with its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Master switch for the knowledge-pill broadcaster.
    PillsEnabled,
    /// Interval between automatic pill sends, in minutes.
    PillIntervalMinutes,
    /// How many questions a quiz session samples.
    QuestionsPerSession,
    /// Whether challenge activation/deactivation broadcasts notifications.
    ChallengeNotificationsEnabled,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::PillsEnabled,
        SettingKey::PillIntervalMinutes,
        SettingKey::QuestionsPerSession,
        SettingKey::ChallengeNotificationsEnabled,
    ];

    /// The key string stored in the `settings` table.
    pub fn name(&self) -> &'static str {
        match self {
            SettingKey::PillsEnabled => "pills_enabled",
            SettingKey::PillIntervalMinutes => "pill_interval_minutes",
            SettingKey::QuestionsPerSession => "questions_per_session",
            SettingKey::ChallengeNotificationsEnabled => "challenge_notifications_enabled",
        }
    }

    pub fn kind(&self) -> SettingKind {
        match self {
            SettingKey::PillsEnabled | SettingKey::ChallengeNotificationsEnabled => {
                SettingKind::Bool
            }
            SettingKey::PillIntervalMinutes | SettingKey::QuestionsPerSession => SettingKind::Int,
        }
    }

    /// The value seeded on first boot.
    pub fn default_value(&self) -> &'static str {
        match self {
            SettingKey::PillsEnabled => "true",
            SettingKey::PillIntervalMinutes => "60",
            SettingKey::QuestionsPerSession => "20",
            SettingKey::ChallengeNotificationsEnabled => "true",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

/// Validates a raw value against the key's declared type.
fn validate(key: SettingKey, raw: &str) -> Result<(), QuizError> {
    match key.kind() {
        SettingKind::Bool => match raw {
            "true" | "false" => Ok(()),
            _ => Err(QuizError::Validation(format!(
                "setting '{}' expects 'true' or 'false', got '{raw}'",
                key.name()
            ))),
        },
        SettingKind::Int => raw
            .parse::<i64>()
            .map(|_| ())
            .map_err(|_| {
                QuizError::Validation(format!(
                    "setting '{}' expects an integer, got '{raw}'",
                    key.name()
                ))
            }),
    }
}

/// Inserts the default value for every missing key. Existing values are never
/// overwritten, so this is safe to call on every startup.
pub async fn seed_defaults(store: &Store) -> Result<(), QuizError> {
    let conn = store.connect()?;
    for key in SettingKey::ALL {
        let mut rows = conn
            .query(
                "SELECT 1 FROM settings WHERE key = ?",
                params![key.name()],
            )
            .await?;
        if rows.next().await?.is_none() {
            conn.execute(
                "INSERT INTO settings (key, value) VALUES (?, ?)",
                params![key.name(), key.default_value()],
            )
            .await?;
        }
    }
    Ok(())
}

/// Reads the raw stored value, falling back to the key's default.
async fn get_raw(store: &Store, key: SettingKey) -> Result<String, QuizError> {
    let conn = store.connect()?;
    let mut rows = conn
        .query(
            "SELECT value FROM settings WHERE key = ?",
            params![key.name()],
        )
        .await?;
    match rows.next().await? {
        Some(row) => crate::store::text_at(&row, 0),
        None => Ok(key.default_value().to_string()),
    }
}

pub async fn get_bool(store: &Store, key: SettingKey) -> Result<bool, QuizError> {
    debug_assert_eq!(key.kind(), SettingKind::Bool);
    let raw = get_raw(store, key).await?;
    match raw.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(QuizError::Storage(format!(
            "setting '{}' holds non-boolean value '{other}'",
            key.name()
        ))),
    }
}

pub async fn get_int(store: &Store, key: SettingKey) -> Result<i64, QuizError> {
    debug_assert_eq!(key.kind(), SettingKind::Int);
    let raw = get_raw(store, key).await?;
    raw.parse::<i64>().map_err(|_| {
        QuizError::Storage(format!(
            "setting '{}' holds non-integer value '{raw}'",
            key.name()
        ))
    })
}

/// Writes a value after validating it against the key's declared type.
pub async fn set(store: &Store, key: SettingKey, raw: &str) -> Result<(), QuizError> {
    validate(key, raw)?;
    let conn = store.connect()?;
    let changed = conn
        .execute(
            "UPDATE settings SET value = ? WHERE key = ?",
            params![raw, key.name()],
        )
        .await?;
    if changed == 0 {
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?, ?)",
            params![key.name(), raw],
        )
        .await?;
    }
    Ok(())
}

/// Lists every stored key/value pair for the admin dashboard.
pub async fn all(store: &Store) -> Result<Vec<(String, String)>, QuizError> {
    let conn = store.connect()?;
    let mut rows = conn
        .query("SELECT key, value FROM settings ORDER BY key", ())
        .await?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next().await? {
        entries.push((
            crate::store::text_at(&row, 0)?,
            crate::store::text_at(&row, 1)?,
        ));
    }
    Ok(entries)
}
