//! # Application State
//!
//! The shared state handed to every request handler: the configuration, the
//! storage provider, the question cache, the options catalog, the outbound
//! messaging client, and the pill scheduler.

use crate::config::AppConfig;
use quizd::{
    notify::{Notifier, TelegramNotifier},
    options::OptionsCatalog,
    questions::QuestionCache,
    scheduler::PillScheduler,
    settings, Store,
};
use std::sync::Arc;
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from the environment.
    pub config: Arc<AppConfig>,
    /// The storage provider for the SQLite database.
    pub store: Store,
    /// The in-memory question cache, invalidated by admin mutations.
    pub questions: Arc<QuestionCache>,
    /// The static registration-form options catalog.
    pub options: Arc<OptionsCatalog>,
    /// The outbound messaging client (Telegram Bot API).
    pub notifier: Box<dyn Notifier>,
    /// The timer that sends knowledge pills on an interval.
    pub scheduler: Arc<PillScheduler>,
}

/// Builds the shared application state from the configuration.
///
/// Opens the database, ensures the schema and default settings are in place,
/// parses the options catalog, and wires up the Telegram client.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let store = Store::new(&config.db_url).await?;
    info!(db_path = %config.db_url, "Initialized local storage provider (SQLite).");
    store.initialize_schema().await?;
    settings::seed_defaults(&store).await?;

    let options = Arc::new(OptionsCatalog::load()?);

    let notifier: Box<dyn Notifier> = Box::new(TelegramNotifier::with_base_url(
        config.telegram_api_url.clone(),
        config.telegram_bot_token.clone(),
    )?);

    let scheduler = Arc::new(PillScheduler::new(store.clone(), notifier.clone()));

    Ok(AppState {
        config: Arc::new(config),
        store,
        questions: Arc::new(QuestionCache::new()),
        options,
        notifier,
        scheduler,
    })
}
