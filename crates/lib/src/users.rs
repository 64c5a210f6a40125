//! # User/Profile Registry
//!
//! Upsert of user profile records keyed by the external Telegram numeric id.
//! Deleting a user cascades to their sessions, answers and results inside an
//! explicit transaction.

use crate::{
    errors::QuizError,
    store::{int_at, now_timestamp, opt_text_at, text_at, Store},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use turso::params;

/// A user profile as submitted by the Mini-App registration form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub telegram_id: String,
    pub nome: String,
    #[serde(default)]
    pub ddd: Option<String>,
    #[serde(default)]
    pub canal_principal: Option<String>,
    #[serde(default)]
    pub tipo_parceiro: Option<String>,
    #[serde(default)]
    pub rede_parceiro: Option<String>,
    #[serde(default)]
    pub loja: Option<String>,
    #[serde(default)]
    pub cargo: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub data_registro: Option<String>,
}

fn row_to_profile(row: &turso::Row) -> Result<Profile, QuizError> {
    Ok(Profile {
        telegram_id: text_at(row, 0)?,
        nome: text_at(row, 1)?,
        ddd: opt_text_at(row, 2)?,
        canal_principal: opt_text_at(row, 3)?,
        tipo_parceiro: opt_text_at(row, 4)?,
        rede_parceiro: opt_text_at(row, 5)?,
        loja: opt_text_at(row, 6)?,
        cargo: opt_text_at(row, 7)?,
        is_admin: int_at(row, 8)? != 0,
        data_registro: opt_text_at(row, 9)?,
    })
}

const PROFILE_COLUMNS: &str = "telegram_id, nome, ddd, canal_principal, tipo_parceiro, \
     rede_parceiro, loja, cargo, is_admin, data_registro";

/// Creates the profile on first submission and updates it on later ones.
/// `data_registro` is stamped on insert only; the admin flag is preserved on update.
pub async fn upsert_profile(store: &Store, profile: &Profile) -> Result<(), QuizError> {
    if profile.telegram_id.trim().is_empty() {
        return Err(QuizError::Validation("telegram_id is required".to_string()));
    }
    if profile.nome.trim().is_empty() {
        return Err(QuizError::Validation("nome is required".to_string()));
    }

    let conn = store.connect()?;
    let mut rows = conn
        .query(
            "SELECT 1 FROM users WHERE telegram_id = ?",
            params![profile.telegram_id.clone()],
        )
        .await?;

    if rows.next().await?.is_some() {
        conn.execute(
            "UPDATE users SET nome = ?, ddd = ?, canal_principal = ?, tipo_parceiro = ?, \
             rede_parceiro = ?, loja = ?, cargo = ? WHERE telegram_id = ?",
            params![
                profile.nome.clone(),
                profile.ddd.clone(),
                profile.canal_principal.clone(),
                profile.tipo_parceiro.clone(),
                profile.rede_parceiro.clone(),
                profile.loja.clone(),
                profile.cargo.clone(),
                profile.telegram_id.clone()
            ],
        )
        .await?;
        info!(telegram_id = %profile.telegram_id, "Updated existing profile.");
    } else {
        conn.execute(
            "INSERT INTO users (telegram_id, nome, ddd, canal_principal, tipo_parceiro, \
             rede_parceiro, loja, cargo, is_admin, data_registro) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                profile.telegram_id.clone(),
                profile.nome.clone(),
                profile.ddd.clone(),
                profile.canal_principal.clone(),
                profile.tipo_parceiro.clone(),
                profile.rede_parceiro.clone(),
                profile.loja.clone(),
                profile.cargo.clone(),
                profile.is_admin as i64,
                now_timestamp()
            ],
        )
        .await?;
        info!(telegram_id = %profile.telegram_id, "Registered new profile.");
    }
    Ok(())
}

pub async fn get_profile(store: &Store, telegram_id: &str) -> Result<Option<Profile>, QuizError> {
    let conn = store.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {PROFILE_COLUMNS} FROM users WHERE telegram_id = ?"),
            params![telegram_id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_profile(&row)?)),
        None => Ok(None),
    }
}

/// Marks a user as an administrator, creating a minimal profile if necessary.
pub async fn set_admin_flag(store: &Store, telegram_id: &str) -> Result<(), QuizError> {
    let conn = store.connect()?;
    let changed = conn
        .execute(
            "UPDATE users SET is_admin = 1 WHERE telegram_id = ?",
            params![telegram_id],
        )
        .await?;
    if changed == 0 {
        conn.execute(
            "INSERT INTO users (telegram_id, nome, is_admin, data_registro) VALUES (?, ?, 1, ?)",
            params![telegram_id, telegram_id, now_timestamp()],
        )
        .await?;
    }
    Ok(())
}

pub async fn is_admin(store: &Store, telegram_id: &str) -> Result<bool, QuizError> {
    let conn = store.connect()?;
    let mut rows = conn
        .query(
            "SELECT is_admin FROM users WHERE telegram_id = ?",
            params![telegram_id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(int_at(&row, 0)? != 0),
        None => Ok(false),
    }
}

/// Deletes a user and everything that hangs off them (answers, results,
/// sessions) in one transaction. Rolls back if any step fails.
pub async fn delete_user(store: &Store, telegram_id: &str) -> Result<(), QuizError> {
    if get_profile(store, telegram_id).await?.is_none() {
        return Err(QuizError::NotFound(format!("user {telegram_id}")));
    }

    let conn = store.connect()?;
    conn.execute("BEGIN", ()).await?;
    let steps = async {
        conn.execute(
            "DELETE FROM answers WHERE user_id = ?",
            params![telegram_id],
        )
        .await?;
        conn.execute(
            "DELETE FROM results WHERE user_id = ?",
            params![telegram_id],
        )
        .await?;
        conn.execute(
            "DELETE FROM sessions WHERE user_id = ?",
            params![telegram_id],
        )
        .await?;
        conn.execute(
            "DELETE FROM users WHERE telegram_id = ?",
            params![telegram_id],
        )
        .await?;
        Ok::<(), QuizError>(())
    };
    match steps.await {
        Ok(()) => {
            conn.execute("COMMIT", ()).await?;
            info!(telegram_id = %telegram_id, "Deleted user and dependent rows.");
            Ok(())
        }
        Err(e) => {
            let _ = conn.execute("ROLLBACK", ()).await;
            Err(e)
        }
    }
}

/// Lists all user profiles, most recent registration first.
pub async fn list_profiles(store: &Store) -> Result<Vec<Profile>, QuizError> {
    let conn = store.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {PROFILE_COLUMNS} FROM users ORDER BY data_registro DESC"),
            (),
        )
        .await?;
    let mut profiles = Vec::new();
    while let Some(row) = rows.next().await? {
        profiles.push(row_to_profile(&row)?);
    }
    Ok(profiles)
}

/// Resolves the Telegram ids targeted by the given role/channel lists.
/// An empty list means unrestricted on that axis.
pub async fn list_recipient_ids(
    store: &Store,
    roles: &[String],
    channels: &[String],
) -> Result<Vec<String>, QuizError> {
    let conn = store.connect()?;
    let mut rows = conn
        .query(
            "SELECT telegram_id, cargo, canal_principal FROM users ORDER BY telegram_id",
            (),
        )
        .await?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next().await? {
        let id = text_at(&row, 0)?;
        let cargo = opt_text_at(&row, 1)?.unwrap_or_default();
        let canal = opt_text_at(&row, 2)?.unwrap_or_default();
        let role_ok = roles.is_empty() || roles.iter().any(|r| r == &cargo);
        let channel_ok = channels.is_empty() || channels.iter().any(|c| c == &canal);
        if role_ok && channel_ok {
            ids.push(id);
        }
    }
    Ok(ids)
}
