//! # Pill Scheduler
//!
//! A timer-driven job that periodically sends the next knowledge pill. The
//! interval comes from the `pill_interval_minutes` setting; changing it takes
//! effect by restarting the timer, which admins trigger through the config
//! endpoint. A failing tick is logged and never kills the task.

use crate::{
    errors::QuizError,
    notify::Notifier,
    pills,
    settings::{self, SettingKey},
    store::Store,
};
use std::time::Duration;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{error, info};

pub struct PillScheduler {
    store: Store,
    notifier: Box<dyn Notifier>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PillScheduler {
    pub fn new(store: Store, notifier: Box<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            handle: Mutex::new(None),
        }
    }

    /// Spawns the interval task, aborting any previous one. Reads the interval
    /// setting at spawn time, so calling this again picks up a changed value.
    pub async fn start(&self) -> Result<(), QuizError> {
        let minutes = settings::get_int(&self.store, SettingKey::PillIntervalMinutes)
            .await?
            .max(1) as u64;

        let store = self.store.clone();
        let notifier = self.notifier.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(minutes * 60));
            // The first tick of a tokio interval resolves immediately; consume
            // it so the first send happens one full period after startup.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match pills::send_next_pill(&store, notifier.as_ref()).await {
                    Ok(outcome) => info!(?outcome, "Scheduled pill tick finished."),
                    Err(e) => error!("Scheduled pill tick failed: {e}"),
                }
            }
        });

        let mut handle = self.handle.lock().await;
        if let Some(previous) = handle.replace(task) {
            previous.abort();
        }
        info!(interval_minutes = minutes, "Pill scheduler (re)started.");
        Ok(())
    }

    /// Restarts the timer so a changed interval setting takes effect.
    pub async fn restart(&self) -> Result<(), QuizError> {
        self.start().await
    }

    /// Stops the timer. Used on shutdown and in tests.
    pub async fn stop(&self) {
        if let Some(task) = self.handle.lock().await.take() {
            task.abort();
        }
    }

    /// Whether the interval task is currently scheduled.
    pub async fn is_running(&self) -> bool {
        self.handle.lock().await.is_some()
    }
}

impl Drop for PillScheduler {
    fn drop(&mut self) {
        // Best-effort: the task holds no lock, aborting is safe from Drop.
        if let Ok(mut handle) = self.handle.try_lock() {
            if let Some(task) = handle.take() {
                task.abort();
            }
        }
    }
}
