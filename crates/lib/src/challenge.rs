//! # Challenge Context
//!
//! A challenge is a time-boxed, topic-scoped campaign. It is a first-class
//! row with its own identity and status; sessions link to it through
//! `sessions.challenge_id`. At most one challenge is active at a time.

use crate::{
    errors::QuizError,
    leaderboard::RankEntry,
    notify::{self, BroadcastTally, Notifier},
    settings::{self, SettingKey},
    store::{int_at, now_timestamp, opt_text_at, text_at, Store},
    users,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use turso::params;

/// What a challenge scopes on: a topic or a subtopic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    Tema,
    Subtema,
}

impl ChallengeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeKind::Tema => "tema",
            ChallengeKind::Subtema => "subtema",
        }
    }

    pub fn parse(value: &str) -> Result<Self, QuizError> {
        match value {
            "tema" => Ok(ChallengeKind::Tema),
            "subtema" => Ok(ChallengeKind::Subtema),
            other => Err(QuizError::Validation(format!(
                "tipo must be 'tema' or 'subtema', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Draft,
    Active,
    Closed,
    Archived,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Draft => "draft",
            ChallengeStatus::Active => "active",
            ChallengeStatus::Closed => "closed",
            ChallengeStatus::Archived => "archived",
        }
    }

    fn parse(value: &str) -> Result<Self, QuizError> {
        match value {
            "draft" => Ok(ChallengeStatus::Draft),
            "active" => Ok(ChallengeStatus::Active),
            "closed" => Ok(ChallengeStatus::Closed),
            "archived" => Ok(ChallengeStatus::Archived),
            other => Err(QuizError::Storage(format!(
                "unknown challenge status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Challenge {
    pub id: i64,
    pub kind: ChallengeKind,
    pub value: String,
    pub status: ChallengeStatus,
    pub created_at: String,
    pub activated_at: Option<String>,
    pub closed_at: Option<String>,
}

fn row_to_challenge(row: &turso::Row) -> Result<Challenge, QuizError> {
    Ok(Challenge {
        id: int_at(row, 0)?,
        kind: ChallengeKind::parse(&text_at(row, 1)?)?,
        value: text_at(row, 2)?,
        status: ChallengeStatus::parse(&text_at(row, 3)?)?,
        created_at: text_at(row, 4)?,
        activated_at: opt_text_at(row, 5)?,
        closed_at: opt_text_at(row, 6)?,
    })
}

const CHALLENGE_COLUMNS: &str = "id, kind, value, status, created_at, activated_at, closed_at";

pub async fn get(store: &Store, id: i64) -> Result<Option<Challenge>, QuizError> {
    let conn = store.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE id = ?"),
            params![id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_challenge(&row)?)),
        None => Ok(None),
    }
}

/// The single active challenge, if any.
pub async fn active_challenge(store: &Store) -> Result<Option<Challenge>, QuizError> {
    let conn = store.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE status = 'active' LIMIT 1"),
            (),
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_challenge(&row)?)),
        None => Ok(None),
    }
}

/// All challenges, newest first, for the admin dashboard.
pub async fn list(store: &Store) -> Result<Vec<Challenge>, QuizError> {
    let conn = store.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {CHALLENGE_COLUMNS} FROM challenges ORDER BY id DESC"),
            (),
        )
        .await?;
    let mut challenges = Vec::new();
    while let Some(row) = rows.next().await? {
        challenges.push(row_to_challenge(&row)?);
    }
    Ok(challenges)
}

#[derive(Debug, Serialize)]
pub struct ActivationOutcome {
    pub challenge: Challenge,
    pub notified: BroadcastTally,
}

/// Activates a new challenge and announces it to all known users.
///
/// Fails with a conflict if another challenge is already active.
pub async fn activate(
    store: &Store,
    notifier: &dyn Notifier,
    tipo: &str,
    valor: &str,
) -> Result<ActivationOutcome, QuizError> {
    let kind = ChallengeKind::parse(tipo)?;
    let valor = valor.trim();
    if valor.is_empty() {
        return Err(QuizError::Validation("valor is required".to_string()));
    }
    if let Some(active) = active_challenge(store).await? {
        return Err(QuizError::Conflict(format!(
            "challenge {} ({}:{}) is already active",
            active.id, active.kind, active.value
        )));
    }

    let conn = store.connect()?;
    conn.execute(
        "INSERT INTO challenges (kind, value, status, created_at, activated_at) \
         VALUES (?, ?, 'active', ?, ?)",
        params![kind.as_str(), valor, now_timestamp(), now_timestamp()],
    )
    .await?;
    let id = crate::store::last_insert_rowid(&conn).await?;

    let challenge = get(store, id)
        .await?
        .ok_or_else(|| QuizError::Storage("activated challenge vanished".to_string()))?;
    info!(id, tipo = %kind, valor, "Activated challenge.");

    let notified = if settings::get_bool(store, SettingKey::ChallengeNotificationsEnabled).await? {
        let recipients = users::list_recipient_ids(store, &[], &[]).await?;
        let text = format!(
            "🏆 Novo desafio no ar! Tema da vez: {valor}. Abra o app e jogue o simulado do desafio!"
        );
        notify::broadcast_text(notifier, &recipients, &text).await
    } else {
        BroadcastTally::default()
    };

    Ok(ActivationOutcome {
        challenge,
        notified,
    })
}

/// Aggregate participation for one challenge.
#[derive(Debug, Serialize)]
pub struct ChallengeSummary {
    pub challenge: Challenge,
    pub participantes: i64,
    pub total_respostas: i64,
    pub acertos: i64,
    pub top10: Vec<RankEntry>,
}

/// The result of a deactivation request.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeactivationOutcome {
    /// Nothing was active; informational, not an error.
    NoActiveChallenge,
    Closed {
        summary: ChallengeSummary,
        notified: BroadcastTally,
    },
}

/// Closes the active challenge: computes its participation summary and top-10,
/// marks the row closed, then broadcasts a closing message. The reads and the
/// row update run inside one transaction.
pub async fn deactivate(
    store: &Store,
    notifier: &dyn Notifier,
) -> Result<DeactivationOutcome, QuizError> {
    let Some(active) = active_challenge(store).await? else {
        info!("Deactivation requested with no active challenge.");
        return Ok(DeactivationOutcome::NoActiveChallenge);
    };

    let conn = store.connect()?;
    conn.execute("BEGIN", ()).await?;
    let steps = async {
        let mut rows = conn
            .query(
                "SELECT COUNT(DISTINCT user_id) FROM sessions WHERE challenge_id = ?",
                params![active.id],
            )
            .await?;
        let participantes = match rows.next().await? {
            Some(row) => int_at(&row, 0)?,
            None => 0,
        };

        let mut rows = conn
            .query(
                "SELECT COUNT(*), COALESCE(SUM(a.acertou), 0) FROM answers a \
                 JOIN sessions s ON s.id = a.session_id WHERE s.challenge_id = ?",
                params![active.id],
            )
            .await?;
        let (total_respostas, acertos) = match rows.next().await? {
            Some(row) => (int_at(&row, 0)?, int_at(&row, 1)?),
            None => (0, 0),
        };

        let mut rows = conn
            .query(
                "SELECT u.nome, SUM(r.pontos) AS pontos FROM results r \
                 JOIN sessions s ON s.id = r.session_id \
                 JOIN users u ON u.telegram_id = r.user_id \
                 WHERE s.challenge_id = ? \
                 GROUP BY u.telegram_id, u.nome \
                 ORDER BY pontos DESC, u.telegram_id ASC LIMIT 10",
                params![active.id],
            )
            .await?;
        let mut top10 = Vec::new();
        while let Some(row) = rows.next().await? {
            top10.push(RankEntry {
                nome: text_at(&row, 0)?,
                pontos: int_at(&row, 1)?,
            });
        }

        conn.execute(
            "UPDATE challenges SET status = 'closed', closed_at = ? WHERE id = ?",
            params![now_timestamp(), active.id],
        )
        .await?;

        Ok::<(i64, i64, i64, Vec<RankEntry>), QuizError>((
            participantes,
            total_respostas,
            acertos,
            top10,
        ))
    };
    let (participantes, total_respostas, acertos, top10) = match steps.await {
        Ok(stats) => {
            conn.execute("COMMIT", ()).await?;
            stats
        }
        Err(e) => {
            let _ = conn.execute("ROLLBACK", ()).await;
            return Err(e);
        }
    };

    info!(
        id = active.id,
        participantes, total_respostas, acertos, "Closed challenge."
    );

    let notified = if settings::get_bool(store, SettingKey::ChallengeNotificationsEnabled).await? {
        let recipients = users::list_recipient_ids(store, &[], &[]).await?;
        let champion = top10
            .first()
            .map(|entry| format!(" Campeão: {} com {} pontos!", entry.nome, entry.pontos))
            .unwrap_or_default();
        let text = format!(
            "🏁 Desafio '{}' encerrado! {} participantes.{}",
            active.value, participantes, champion
        );
        notify::broadcast_text(notifier, &recipients, &text).await
    } else {
        BroadcastTally::default()
    };

    let summary = ChallengeSummary {
        challenge: get(store, active.id)
            .await?
            .ok_or_else(|| QuizError::Storage("closed challenge vanished".to_string()))?,
        participantes,
        total_respostas,
        acertos,
        top10,
    };

    Ok(DeactivationOutcome::Closed { summary, notified })
}
