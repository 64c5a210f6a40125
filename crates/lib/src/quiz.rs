//! # Quiz Session Lifecycle
//!
//! A session moves through `not started → in progress → finished`. "In
//! progress" is nothing more than the open session row plus the answer rows
//! recorded so far; an abandoned session simply never reaches `finish` and is
//! never finalized.

use crate::{
    challenge,
    errors::QuizError,
    questions::{Question, QuestionCache},
    settings::{self, SettingKey},
    store::{now_timestamp, Store},
    users,
};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;
use turso::params;

/// The response to a successful `start`: the sampled questions are returned in
/// full, correct answers included, matching the Mini-App's contract.
#[derive(Debug, Serialize)]
pub struct StartedSession {
    pub simulado_id: i64,
    pub total_perguntas_no_simulado: usize,
    pub questions: Vec<Question>,
}

/// Creates a session for a user, sampling questions for their profile.
///
/// When `desafio_id` is given it must reference the active challenge; when it
/// is absent, the currently active challenge (if any) is stamped on the
/// session. Sessions started with no active challenge stay untagged and score
/// into the normal point pool.
pub async fn start_session(
    store: &Store,
    cache: &QuestionCache,
    telegram_id: &str,
    cargo: &str,
    canal_principal: &str,
    desafio_id: Option<i64>,
) -> Result<StartedSession, QuizError> {
    if users::get_profile(store, telegram_id).await?.is_none() {
        return Err(QuizError::NotFound(format!("user {telegram_id}")));
    }

    let all = cache.load(store).await?;
    let mut pool: Vec<Question> = all
        .iter()
        .filter(|q| q.matches_profile(cargo, canal_principal))
        .cloned()
        .collect();
    if pool.is_empty() {
        return Err(QuizError::NoContent);
    }

    pool.shuffle(&mut rand::thread_rng());
    let limit = settings::get_int(store, SettingKey::QuestionsPerSession).await?.max(1) as usize;
    pool.truncate(limit);

    let challenge_id = match desafio_id {
        Some(id) => {
            let challenge = challenge::get(store, id)
                .await?
                .ok_or_else(|| QuizError::NotFound(format!("challenge {id}")))?;
            if challenge.status != challenge::ChallengeStatus::Active {
                return Err(QuizError::Validation(format!(
                    "challenge {id} is not active"
                )));
            }
            Some(id)
        }
        None => challenge::active_challenge(store).await?.map(|c| c.id),
    };

    let conn = store.connect()?;
    conn.execute(
        "INSERT INTO sessions (user_id, challenge_id, started_at) VALUES (?, ?, ?)",
        params![telegram_id, challenge_id, now_timestamp()],
    )
    .await?;
    let simulado_id = crate::store::last_insert_rowid(&conn).await?;

    info!(
        simulado_id,
        telegram_id,
        questions = pool.len(),
        challenge = ?challenge_id,
        "Started quiz session."
    );

    Ok(StartedSession {
        simulado_id,
        total_perguntas_no_simulado: pool.len(),
        questions: pool,
    })
}

/// One answer submission from the Mini-App.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSubmission {
    pub simulado_id: i64,
    pub telegram_id: String,
    pub pergunta: String,
    pub resposta_usuario: String,
    pub resposta_correta: String,
    pub acertou: bool,
    #[serde(default)]
    pub tema: String,
    #[serde(default)]
    pub subtema: String,
}

/// Records one answer, keyed by `(session_id, pergunta)`: re-submitting the
/// same question overwrites the earlier row instead of duplicating it.
pub async fn record_answer(store: &Store, answer: &AnswerSubmission) -> Result<(), QuizError> {
    if answer.pergunta.trim().is_empty() {
        return Err(QuizError::Validation("pergunta is required".to_string()));
    }

    let conn = store.connect()?;
    let mut rows = conn
        .query(
            "SELECT 1 FROM sessions WHERE id = ?",
            params![answer.simulado_id],
        )
        .await?;
    if rows.next().await?.is_none() {
        return Err(QuizError::NotFound(format!(
            "session {}",
            answer.simulado_id
        )));
    }

    let changed = conn
        .execute(
            "UPDATE answers SET resposta_usuario = ?, resposta_correta = ?, acertou = ?, \
             tema = ?, subtema = ?, answered_at = ? WHERE session_id = ? AND pergunta = ?",
            params![
                answer.resposta_usuario.clone(),
                answer.resposta_correta.clone(),
                answer.acertou as i64,
                answer.tema.clone(),
                answer.subtema.clone(),
                now_timestamp(),
                answer.simulado_id,
                answer.pergunta.clone()
            ],
        )
        .await?;
    if changed == 0 {
        conn.execute(
            "INSERT INTO answers (session_id, user_id, pergunta, resposta_usuario, \
             resposta_correta, acertou, tema, subtema, answered_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                answer.simulado_id,
                answer.telegram_id.clone(),
                answer.pergunta.clone(),
                answer.resposta_usuario.clone(),
                answer.resposta_correta.clone(),
                answer.acertou as i64,
                answer.tema.clone(),
                answer.subtema.clone(),
                now_timestamp()
            ],
        )
        .await?;
    }
    Ok(())
}

/// A computed session score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub pontuacao_base: i64,
    pub pontuacao_final_com_bonus: i64,
}

/// Scores a finished session: 10 points per correct answer, then a single
/// bonus tier by accuracy (≥90% ×1.20, ≥80% ×1.10, ≥70% ×1.05), floored.
pub fn score(num_acertos: i64, total_perguntas: i64) -> Score {
    let base = num_acertos * 10;
    let accuracy = (num_acertos as f64 / total_perguntas as f64) * 100.0;
    let multiplier = if accuracy >= 90.0 {
        1.20
    } else if accuracy >= 80.0 {
        1.10
    } else if accuracy >= 70.0 {
        1.05
    } else {
        1.00
    };
    Score {
        pontuacao_base: base,
        pontuacao_final_com_bonus: ((base as f64) * multiplier).floor() as i64,
    }
}

/// The response to a successful `finish`.
#[derive(Debug, Serialize)]
pub struct FinishedSession {
    pub pontuacao_base: i64,
    pub pontuacao_final_com_bonus: i64,
    pub num_acertos: i64,
    pub total_perguntas: i64,
}

/// Scores the session and inserts its result row. The reported counts are
/// taken at face value; they are not reconciled against recorded answer rows.
pub async fn finish_session(
    store: &Store,
    telegram_id: &str,
    simulado_id: i64,
    num_acertos: i64,
    total_perguntas: i64,
) -> Result<FinishedSession, QuizError> {
    if total_perguntas <= 0 {
        return Err(QuizError::Validation(
            "total_perguntas must be positive".to_string(),
        ));
    }
    if num_acertos < 0 || num_acertos > total_perguntas {
        return Err(QuizError::Validation(
            "num_acertos must be between 0 and total_perguntas".to_string(),
        ));
    }

    let conn = store.connect()?;
    let mut rows = conn
        .query("SELECT 1 FROM sessions WHERE id = ?", params![simulado_id])
        .await?;
    if rows.next().await?.is_none() {
        return Err(QuizError::NotFound(format!("session {simulado_id}")));
    }

    let score = score(num_acertos, total_perguntas);
    conn.execute(
        "INSERT INTO results (user_id, session_id, pontos, total_perguntas, created_at) \
         VALUES (?, ?, ?, ?, ?)",
        params![
            telegram_id,
            simulado_id,
            score.pontuacao_final_com_bonus,
            total_perguntas,
            now_timestamp()
        ],
    )
    .await?;

    info!(
        simulado_id,
        telegram_id,
        pontos = score.pontuacao_final_com_bonus,
        "Finished quiz session."
    );

    Ok(FinishedSession {
        pontuacao_base: score.pontuacao_base,
        pontuacao_final_com_bonus: score.pontuacao_final_com_bonus,
        num_acertos,
        total_perguntas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bonus_tier_90_percent() {
        let s = score(9, 10);
        assert_eq!(s.pontuacao_base, 90);
        assert_eq!(s.pontuacao_final_com_bonus, 108); // floor(90 * 1.20)
    }

    #[test]
    fn test_bonus_tier_80_percent() {
        let s = score(8, 10);
        assert_eq!(s.pontuacao_base, 80);
        assert_eq!(s.pontuacao_final_com_bonus, 88); // floor(80 * 1.10)
    }

    #[test]
    fn test_bonus_tier_70_percent() {
        let s = score(7, 10);
        assert_eq!(s.pontuacao_base, 70);
        assert_eq!(s.pontuacao_final_com_bonus, 73); // floor(70 * 1.05)
    }

    #[test]
    fn test_no_bonus_below_70_percent() {
        let s = score(5, 10);
        assert_eq!(s.pontuacao_base, 50);
        assert_eq!(s.pontuacao_final_com_bonus, 50);
    }

    #[test]
    fn test_perfect_score() {
        let s = score(10, 10);
        assert_eq!(s.pontuacao_final_com_bonus, 120);
    }

    #[test]
    fn test_zero_correct() {
        let s = score(0, 10);
        assert_eq!(s.pontuacao_base, 0);
        assert_eq!(s.pontuacao_final_com_bonus, 0);
    }
}
