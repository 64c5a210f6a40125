//! # Question Store
//!
//! Trivia questions live in the `questions` table and are served from an
//! in-memory cache. The cache is an explicit object with a generation counter,
//! injected into request handlers; every admin mutation invalidates it and the
//! next read triggers a full reload. Rows that fail validation (no options, or
//! a correct answer that is not one of the options) are skipped on load, never
//! an error.

use crate::{
    errors::QuizError,
    store::{int_at, text_at, Store},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use turso::params;

pub mod import;

pub use import::{import_questions, parse_question_csv, ImportReport};

/// A trivia question with its targeting lists.
///
/// Empty `publico_alvo` or `canais` means the question applies to every role
/// or channel respectively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: i64,
    pub pergunta: String,
    pub opcoes: Vec<String>,
    pub resposta_correta: String,
    #[serde(default)]
    pub tema: String,
    #[serde(default)]
    pub subtema: String,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub fonte: String,
    #[serde(default)]
    pub publico_alvo: Vec<String>,
    #[serde(default)]
    pub canais: Vec<String>,
}

impl Question {
    /// A question is servable only if its correct answer is one of its options.
    pub fn is_valid(&self) -> bool {
        !self.pergunta.trim().is_empty()
            && !self.opcoes.is_empty()
            && self.opcoes.iter().any(|o| o == &self.resposta_correta)
    }

    /// Empty targeting lists match every profile.
    pub fn matches_profile(&self, cargo: &str, canal: &str) -> bool {
        let role_ok = self.publico_alvo.is_empty() || self.publico_alvo.iter().any(|r| r == cargo);
        let channel_ok = self.canais.is_empty() || self.canais.iter().any(|c| c == canal);
        role_ok && channel_ok
    }
}

/// Splits a pipe-delimited list cell, trimming entries and dropping empty ones.
pub fn split_list(cell: &str) -> Vec<String> {
    cell.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins a list back into its pipe-delimited storage form.
pub fn join_list(items: &[String]) -> String {
    items.join("|")
}

struct CacheInner {
    generation: u64,
    snapshot: Option<Arc<Vec<Question>>>,
}

/// The process-wide question cache.
///
/// The generation counter increments on every invalidation, which lets tests
/// (and logs) observe that a mutation actually dropped the snapshot.
pub struct QuestionCache {
    inner: RwLock<CacheInner>,
}

impl Default for QuestionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                generation: 0,
                snapshot: None,
            }),
        }
    }

    /// Returns the cached questions, loading them from the store on first use
    /// (or after an invalidation).
    pub async fn load(&self, store: &Store) -> Result<Arc<Vec<Question>>, QuizError> {
        if let Some(snapshot) = &self.inner.read().await.snapshot {
            debug!("Serving questions from cache.");
            return Ok(snapshot.clone());
        }

        let questions = load_all_questions(store).await?;
        info!(count = questions.len(), "Loaded question cache.");

        let mut inner = self.inner.write().await;
        // Another task may have raced us here; last write wins, both loads saw
        // the same post-invalidation state.
        let snapshot = Arc::new(questions);
        inner.snapshot = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Drops the snapshot so the next read reparses from the store.
    pub async fn invalidate(&self) {
        let mut inner = self.inner.write().await;
        inner.generation += 1;
        inner.snapshot = None;
        debug!(generation = inner.generation, "Question cache invalidated.");
    }

    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }
}

fn row_to_question(row: &turso::Row) -> Result<Question, QuizError> {
    Ok(Question {
        id: int_at(row, 0)?,
        pergunta: text_at(row, 1)?,
        opcoes: split_list(&text_at(row, 2)?),
        resposta_correta: text_at(row, 3)?,
        tema: text_at(row, 4)?,
        subtema: text_at(row, 5)?,
        feedback: text_at(row, 6)?,
        fonte: text_at(row, 7)?,
        publico_alvo: split_list(&text_at(row, 8)?),
        canais: split_list(&text_at(row, 9)?),
    })
}

const QUESTION_COLUMNS: &str = "id, pergunta, opcoes, resposta_correta, tema, subtema, \
     feedback, fonte, publico_alvo, canais";

/// Loads every stored question, skipping rows that fail validation.
async fn load_all_questions(store: &Store) -> Result<Vec<Question>, QuizError> {
    let conn = store.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {QUESTION_COLUMNS} FROM questions ORDER BY id"),
            (),
        )
        .await?;
    let mut questions = Vec::new();
    while let Some(row) = rows.next().await? {
        let question = row_to_question(&row)?;
        if question.is_valid() {
            questions.push(question);
        } else {
            warn!(id = question.id, "Skipping malformed question row.");
        }
    }
    Ok(questions)
}

/// Lists all stored questions for the admin dashboard, including malformed ones.
pub async fn list_questions(store: &Store) -> Result<Vec<Question>, QuizError> {
    let conn = store.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {QUESTION_COLUMNS} FROM questions ORDER BY id"),
            (),
        )
        .await?;
    let mut questions = Vec::new();
    while let Some(row) = rows.next().await? {
        questions.push(row_to_question(&row)?);
    }
    Ok(questions)
}

fn validate_for_write(question: &Question) -> Result<(), QuizError> {
    if question.pergunta.trim().is_empty() {
        return Err(QuizError::Validation("pergunta is required".to_string()));
    }
    if question.opcoes.is_empty() {
        return Err(QuizError::Validation(
            "at least one option is required".to_string(),
        ));
    }
    if !question.opcoes.iter().any(|o| o == &question.resposta_correta) {
        return Err(QuizError::Validation(
            "resposta_correta must be one of the options".to_string(),
        ));
    }
    Ok(())
}

/// Inserts a question and invalidates the cache. Returns the new id.
pub async fn insert_question(
    store: &Store,
    cache: &QuestionCache,
    question: &Question,
) -> Result<i64, QuizError> {
    validate_for_write(question)?;
    let conn = store.connect()?;
    conn.execute(
        "INSERT INTO questions (pergunta, opcoes, resposta_correta, tema, subtema, \
         feedback, fonte, publico_alvo, canais) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            question.pergunta.clone(),
            join_list(&question.opcoes),
            question.resposta_correta.clone(),
            question.tema.clone(),
            question.subtema.clone(),
            question.feedback.clone(),
            question.fonte.clone(),
            join_list(&question.publico_alvo),
            join_list(&question.canais)
        ],
    )
    .await?;
    let id = crate::store::last_insert_rowid(&conn).await?;
    cache.invalidate().await;
    Ok(id)
}

/// Updates a question by id and invalidates the cache.
pub async fn update_question(
    store: &Store,
    cache: &QuestionCache,
    id: i64,
    question: &Question,
) -> Result<(), QuizError> {
    validate_for_write(question)?;
    let conn = store.connect()?;
    let changed = conn
        .execute(
            "UPDATE questions SET pergunta = ?, opcoes = ?, resposta_correta = ?, tema = ?, \
             subtema = ?, feedback = ?, fonte = ?, publico_alvo = ?, canais = ? WHERE id = ?",
            params![
                question.pergunta.clone(),
                join_list(&question.opcoes),
                question.resposta_correta.clone(),
                question.tema.clone(),
                question.subtema.clone(),
                question.feedback.clone(),
                question.fonte.clone(),
                join_list(&question.publico_alvo),
                join_list(&question.canais),
                id
            ],
        )
        .await?;
    if changed == 0 {
        return Err(QuizError::NotFound(format!("question {id}")));
    }
    cache.invalidate().await;
    Ok(())
}

/// Deletes a question by id and invalidates the cache.
pub async fn delete_question(
    store: &Store,
    cache: &QuestionCache,
    id: i64,
) -> Result<(), QuizError> {
    let conn = store.connect()?;
    let changed = conn
        .execute("DELETE FROM questions WHERE id = ?", params![id])
        .await?;
    if changed == 0 {
        return Err(QuizError::NotFound(format!("question {id}")));
    }
    cache.invalidate().await;
    Ok(())
}

/// Deletes every stored question. Returns how many rows were removed.
pub async fn delete_all_questions(
    store: &Store,
    cache: &QuestionCache,
) -> Result<u64, QuizError> {
    let conn = store.connect()?;
    let removed = conn.execute("DELETE FROM questions", ()).await?;
    cache.invalidate().await;
    Ok(removed)
}
