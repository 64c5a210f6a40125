//! # Test Utilities
//!
//! Shared helpers for `quizd` and `quizd-server` tests: a recording notifier
//! that captures outbound messages in memory, and seeding helpers for the
//! tables most tests need.

use anyhow::Result;
use async_trait::async_trait;
use quizd::{
    notify::{Notifier, NotifyError},
    questions::{Question, QuestionCache},
    users::Profile,
    Store,
};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};
use turso::params;

/// One captured outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: String,
    pub text: String,
    pub file_id: Option<String>,
}

/// A `Notifier` that records every send instead of performing HTTP calls.
/// Specific chat ids can be configured to fail, to exercise per-recipient
/// failure tallying.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every send to `chat_id` fail.
    pub fn fail_for(&self, chat_id: &str) {
        self.failing.lock().unwrap().insert(chat_id.to_string());
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, chat_id: &str, text: &str, file_id: Option<String>) -> Result<(), NotifyError> {
        if self.failing.lock().unwrap().contains(chat_id) {
            return Err(NotifyError::Api(format!("forced failure for {chat_id}")));
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            file_id,
        });
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        self.record(chat_id, text, None)
    }

    async fn send_document(
        &self,
        chat_id: &str,
        file_id: &str,
        caption: &str,
    ) -> Result<(), NotifyError> {
        self.record(chat_id, caption, Some(file_id.to_string()))
    }
}

/// Creates an in-memory store with the schema and default settings in place.
pub async fn test_store() -> Result<Store> {
    let store = Store::new(":memory:").await?;
    store.initialize_schema().await?;
    quizd::settings::seed_defaults(&store).await?;
    Ok(store)
}

/// Inserts a user profile with the given targeting attributes.
pub async fn seed_user(
    store: &Store,
    telegram_id: &str,
    nome: &str,
    ddd: &str,
    canal: &str,
    cargo: &str,
) -> Result<()> {
    let profile = Profile {
        telegram_id: telegram_id.to_string(),
        nome: nome.to_string(),
        ddd: Some(ddd.to_string()),
        canal_principal: Some(canal.to_string()),
        tipo_parceiro: None,
        rede_parceiro: None,
        loja: None,
        cargo: Some(cargo.to_string()),
        is_admin: false,
        data_registro: None,
    };
    quizd::users::upsert_profile(store, &profile).await?;
    Ok(())
}

/// Inserts a question targeting the given roles/channels (empty = all).
pub async fn seed_question(
    store: &Store,
    cache: &QuestionCache,
    pergunta: &str,
    tema: &str,
    publico_alvo: &[&str],
    canais: &[&str],
) -> Result<i64> {
    let question = Question {
        id: 0,
        pergunta: pergunta.to_string(),
        opcoes: vec!["Certa".to_string(), "Errada".to_string()],
        resposta_correta: "Certa".to_string(),
        tema: tema.to_string(),
        subtema: String::new(),
        feedback: String::new(),
        fonte: String::new(),
        publico_alvo: publico_alvo.iter().map(|s| s.to_string()).collect(),
        canais: canais.iter().map(|s| s.to_string()).collect(),
    };
    Ok(quizd::questions::insert_question(store, cache, &question).await?)
}

/// Inserts a session row directly, optionally tagged with a challenge.
pub async fn seed_session(
    store: &Store,
    user_id: &str,
    challenge_id: Option<i64>,
    started_at: &str,
) -> Result<i64> {
    let conn = store.connect()?;
    conn.execute(
        "INSERT INTO sessions (user_id, challenge_id, started_at) VALUES (?, ?, ?)",
        params![user_id, challenge_id, started_at],
    )
    .await?;
    let mut rows = conn.query("SELECT last_insert_rowid()", ()).await?;
    let row = rows.next().await?.expect("rowid row");
    Ok(row.get::<i64>(0)?)
}

/// Inserts a result row directly with an explicit timestamp, which
/// leaderboard-window tests need.
pub async fn seed_result(
    store: &Store,
    user_id: &str,
    session_id: i64,
    pontos: i64,
    created_at: &str,
) -> Result<()> {
    let conn = store.connect()?;
    conn.execute(
        "INSERT INTO results (user_id, session_id, pontos, total_perguntas, created_at) \
         VALUES (?, ?, ?, 10, ?)",
        params![user_id, session_id, pontos, created_at],
    )
    .await?;
    Ok(())
}
