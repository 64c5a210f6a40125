//! # Messaging Client
//!
//! The `Notifier` trait is the seam between the domain logic and the Telegram
//! Bot API. Broadcasts fan out with bounded concurrency and tally per-recipient
//! results; a single recipient's failure never aborts the batch.

use async_trait::async_trait;
use dyn_clone::DynClone;
use futures::StreamExt;
use serde::Serialize;
use std::fmt::Debug;
use std::future::Future;
use thiserror::Error;
use tracing::warn;

pub mod telegram;

pub use telegram::TelegramNotifier;

/// Custom error types for outbound messaging.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
    #[error("Request to messaging API failed: {0}")]
    Request(String),
    #[error("Messaging API returned an error: {0}")]
    Api(String),
}

/// A trait for sending messages to a single recipient.
#[async_trait]
pub trait Notifier: Send + Sync + Debug + DynClone {
    /// Sends a plain text message.
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), NotifyError>;

    /// Sends a previously uploaded file (by platform file handle) with a caption.
    async fn send_document(
        &self,
        chat_id: &str,
        file_id: &str,
        caption: &str,
    ) -> Result<(), NotifyError>;
}

dyn_clone::clone_trait_object!(Notifier);

/// How many in-flight sends a broadcast keeps at once.
pub const BROADCAST_CONCURRENCY: usize = 8;

/// Per-recipient delivery tally for one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BroadcastTally {
    pub delivered: usize,
    pub failed: usize,
}

/// Fans `send` out over every recipient with bounded concurrency.
///
/// Failures are logged and counted, not retried and never fatal.
pub async fn broadcast<F, Fut>(recipients: &[String], send: F) -> BroadcastTally
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<(), NotifyError>>,
{
    let mut tally = BroadcastTally::default();
    let mut deliveries = futures::stream::iter(recipients.iter().cloned())
        .map(send)
        .buffer_unordered(BROADCAST_CONCURRENCY);

    while let Some(result) = deliveries.next().await {
        match result {
            Ok(()) => tally.delivered += 1,
            Err(e) => {
                warn!("Broadcast delivery failed: {e}");
                tally.failed += 1;
            }
        }
    }
    tally
}

/// Broadcasts one text message to every recipient.
pub async fn broadcast_text(
    notifier: &dyn Notifier,
    recipients: &[String],
    text: &str,
) -> BroadcastTally {
    broadcast(recipients, |chat_id| async move {
        notifier.send_text(&chat_id, text).await
    })
    .await
}
