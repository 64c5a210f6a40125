use crate::notify::{Notifier, NotifyError};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde_json::json;

/// The production Telegram Bot API endpoint.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// A `Notifier` backed by the Telegram Bot API.
#[derive(Clone, Debug)]
pub struct TelegramNotifier {
    client: ReqwestClient,
    base_url: String,
    token: String,
}

impl TelegramNotifier {
    /// Creates a notifier against the production API.
    pub fn new(token: String) -> Result<Self, NotifyError> {
        Self::with_base_url(TELEGRAM_API_BASE.to_string(), token)
    }

    /// Creates a notifier against a custom base URL (used by tests to point at
    /// a mock server).
    pub fn with_base_url(base_url: String, token: String) -> Result<Self, NotifyError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(|e| NotifyError::ClientBuild(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api(error_text));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        self.call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await
    }

    async fn send_document(
        &self,
        chat_id: &str,
        file_id: &str,
        caption: &str,
    ) -> Result<(), NotifyError> {
        self.call(
            "sendDocument",
            json!({ "chat_id": chat_id, "document": file_id, "caption": caption }),
        )
        .await
    }
}
