//! Read-only export handlers for the BI pipeline, gated by the shared
//! `x-bi-secret` header.

use crate::{auth::middleware::BiAccess, errors::AppError, state::AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use quizd::{
    leaderboard::{self, UserStats},
    users,
    users::Profile,
    QuizError,
};
use serde::Serialize;
use turso::Value;

/// Handler for `GET /bi/users`: every profile on record.
pub async fn bi_users_handler(
    State(app_state): State<AppState>,
    _access: BiAccess,
) -> Result<Json<Vec<Profile>>, AppError> {
    let profiles = users::list_profiles(&app_state.store).await?;
    Ok(Json(profiles))
}

/// Handler for `GET /bi/stats/{telegram_id}`: one user's aggregates.
pub async fn bi_user_stats_handler(
    State(app_state): State<AppState>,
    _access: BiAccess,
    Path(telegram_id): Path<String>,
) -> Result<Json<UserStats>, AppError> {
    let stats = leaderboard::user_stats(&app_state.store, &telegram_id).await?;
    Ok(Json(stats))
}

/// One exported result row, with its session's challenge linkage.
#[derive(Serialize)]
pub struct BiResult {
    pub id: i64,
    pub user_id: String,
    pub session_id: i64,
    pub pontos: i64,
    pub total_perguntas: i64,
    pub created_at: String,
    pub challenge_id: Option<i64>,
}

/// Handler for `GET /bi/results`.
pub async fn bi_results_handler(
    State(app_state): State<AppState>,
    _access: BiAccess,
) -> Result<Json<Vec<BiResult>>, AppError> {
    let conn = app_state.store.connect().map_err(QuizError::from)?;
    let mut rows = conn
        .query(
            "SELECT r.id, r.user_id, r.session_id, r.pontos, r.total_perguntas, \
             r.created_at, s.challenge_id \
             FROM results r JOIN sessions s ON s.id = r.session_id ORDER BY r.id",
            (),
        )
        .await
        .map_err(QuizError::from)?;

    let mut results = Vec::new();
    while let Some(row) = rows.next().await.map_err(QuizError::from)? {
        let challenge_id = match row.get_value(6).map_err(QuizError::from)? {
            Value::Integer(id) => Some(id),
            _ => None,
        };
        results.push(BiResult {
            id: row.get(0).map_err(QuizError::from)?,
            user_id: row.get(1).map_err(QuizError::from)?,
            session_id: row.get(2).map_err(QuizError::from)?,
            pontos: row.get(3).map_err(QuizError::from)?,
            total_perguntas: row.get(4).map_err(QuizError::from)?,
            created_at: row.get(5).map_err(QuizError::from)?,
            challenge_id,
        });
    }
    Ok(Json(results))
}

/// One exported answer row.
#[derive(Serialize)]
pub struct BiAnswer {
    pub id: i64,
    pub session_id: i64,
    pub user_id: String,
    pub pergunta: String,
    pub resposta_usuario: String,
    pub resposta_correta: String,
    pub acertou: bool,
    pub tema: String,
    pub subtema: String,
    pub answered_at: String,
}

/// Handler for `GET /bi/answers`.
pub async fn bi_answers_handler(
    State(app_state): State<AppState>,
    _access: BiAccess,
) -> Result<Json<Vec<BiAnswer>>, AppError> {
    let conn = app_state.store.connect().map_err(QuizError::from)?;
    let mut rows = conn
        .query(
            "SELECT id, session_id, user_id, pergunta, resposta_usuario, resposta_correta, \
             acertou, tema, subtema, answered_at FROM answers ORDER BY id",
            (),
        )
        .await
        .map_err(QuizError::from)?;

    let mut answers = Vec::new();
    while let Some(row) = rows.next().await.map_err(QuizError::from)? {
        let acertou: i64 = row.get(6).map_err(QuizError::from)?;
        let tema = match row.get_value(7).map_err(QuizError::from)? {
            Value::Text(s) => s,
            _ => String::new(),
        };
        let subtema = match row.get_value(8).map_err(QuizError::from)? {
            Value::Text(s) => s,
            _ => String::new(),
        };
        answers.push(BiAnswer {
            id: row.get(0).map_err(QuizError::from)?,
            session_id: row.get(1).map_err(QuizError::from)?,
            user_id: row.get(2).map_err(QuizError::from)?,
            pergunta: row.get(3).map_err(QuizError::from)?,
            resposta_usuario: row.get(4).map_err(QuizError::from)?,
            resposta_correta: row.get(5).map_err(QuizError::from)?,
            acertou: acertou != 0,
            tema,
            subtema,
            answered_at: row.get(9).map_err(QuizError::from)?,
        });
    }
    Ok(Json(answers))
}
