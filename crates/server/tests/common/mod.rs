//! # Common Test Utilities
//!
//! The `TestApp` harness spawns the real server on a random port with a
//! temporary SQLite database and an `httpmock` stand-in for the Telegram Bot
//! API, so every integration test exercises the full HTTP stack.

// Allow unused code because this is a test utility module, and not all
// functions might be used by every test file that includes it.
#![allow(unused)]

use anyhow::Result;
use httpmock::{Method::POST, MockServer};
use quizd::Store;
use quizd_server::{
    config::AppConfig,
    router,
    state::{build_app_state, AppState},
};
use reqwest::Client;
use serde_json::json;
use tempfile::NamedTempFile;
use tokio::{net::TcpListener, task::JoinHandle};

/// The Telegram id the harness configures as the bootstrap admin.
pub const TEST_ADMIN_TELEGRAM_ID: &str = "999";
/// The shared secret the harness configures for the BI export routes.
pub const TEST_BI_SECRET: &str = "bi-test-secret";
/// The JWT secret the harness configures.
pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

const TEST_BOT_TOKEN: &str = "test-token";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub app_state: AppState,
    _db_file: NamedTempFile,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server and returns a `TestApp` instance.
    ///
    /// The mock Telegram API accepts every `sendMessage`/`sendDocument` call;
    /// tests that need failures or assertions register their own mocks.
    pub async fn spawn() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let mock_server = MockServer::start();
        mock_server.mock(|when, then| {
            when.method(POST)
                .path(format!("/bot{TEST_BOT_TOKEN}/sendMessage"));
            then.status(200).json_body(json!({ "ok": true }));
        });
        mock_server.mock(|when, then| {
            when.method(POST)
                .path(format!("/bot{TEST_BOT_TOKEN}/sendDocument"));
            then.status(200).json_body(json!({ "ok": true }));
        });

        let db_file = NamedTempFile::new()?;
        let config = AppConfig {
            port: 0,
            db_url: db_file.path().to_str().unwrap().to_string(),
            jwt_secret: TEST_JWT_SECRET.to_string(),
            telegram_bot_token: TEST_BOT_TOKEN.to_string(),
            telegram_api_url: mock_server.base_url(),
            admin_telegram_id: Some(TEST_ADMIN_TELEGRAM_ID.to_string()),
            bi_secret: Some(TEST_BI_SECRET.to_string()),
        };

        let app_state = build_app_state(config).await?;
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            app_state: app_state_for_harness,
            _db_file: db_file,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// The shared store, for seeding and direct assertions.
    pub fn store(&self) -> &Store {
        &self.app_state.store
    }

    /// Obtains a bearer token through the login endpoint.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/admin/login", self.address))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(
            response.status().is_success(),
            "login failed with status {}",
            response.status()
        );
        let body: serde_json::Value = response.json().await?;
        Ok(body["token"]
            .as_str()
            .expect("token field missing")
            .to_string())
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
