//! Tests for the knowledge-pill endpoints: CRUD, bulk import, the manual
//! send trigger, and the kill switch.

mod common;

use anyhow::Result;
use common::{TestApp, TEST_ADMIN_TELEGRAM_ID};
use serde_json::{json, Value};

async fn register(app: &TestApp, telegram_id: &str, nome: &str) -> Result<()> {
    let response = app
        .client
        .post(format!("{}/user", app.address))
        .json(&json!({
            "telegram_id": telegram_id,
            "nome": nome,
            "cargo": "Vendedor",
            "canal_principal": "Varejo"
        }))
        .send()
        .await?;
    anyhow::ensure!(response.status().is_success());
    Ok(())
}

async fn create_pill(app: &TestApp, tema: &str, conteudo: &str) -> Result<i64> {
    let response = app
        .client
        .post(format!("{}/admin/pills", app.address))
        .header("x-telegram-id", TEST_ADMIN_TELEGRAM_ID)
        .json(&json!({ "tema": tema, "conteudo": conteudo }))
        .send()
        .await?;
    anyhow::ensure!(response.status().is_success());
    let body: Value = response.json().await?;
    Ok(body["id"].as_i64().expect("created id"))
}

async fn send_now(app: &TestApp) -> Result<Value> {
    let response = app
        .client
        .post(format!("{}/admin/pills/send-now", app.address))
        .header("x-telegram-id", TEST_ADMIN_TELEGRAM_ID)
        .send()
        .await?;
    anyhow::ensure!(response.status().is_success());
    Ok(response.json().await?)
}

#[tokio::test]
async fn test_pill_crud_via_api() -> Result<()> {
    let app = TestApp::spawn().await?;

    let id = create_pill(&app, "Planos", "O plano de entrada tem 20GB.").await?;

    let response = app
        .client
        .put(format!("{}/admin/pills/{id}", app.address))
        .header("x-telegram-id", TEST_ADMIN_TELEGRAM_ID)
        .json(&json!({
            "tema": "Planos",
            "conteudo": "O plano de entrada agora tem 25GB.",
            "cargos": ["Vendedor"]
        }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let pills: Vec<Value> = app
        .client
        .get(format!("{}/admin/pills", app.address))
        .header("x-telegram-id", TEST_ADMIN_TELEGRAM_ID)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(pills.len(), 1);
    assert_eq!(pills[0]["conteudo"], "O plano de entrada agora tem 25GB.");
    assert_eq!(pills[0]["cargos"][0], "Vendedor");

    // Blank content is rejected.
    let response = app
        .client
        .put(format!("{}/admin/pills/{id}", app.address))
        .header("x-telegram-id", TEST_ADMIN_TELEGRAM_ID)
        .json(&json!({ "conteudo": "  " }))
        .send()
        .await?;
    assert_eq!(response.status(), 400);

    let response = app
        .client
        .delete(format!("{}/admin/pills/{id}", app.address))
        .header("x-telegram-id", TEST_ADMIN_TELEGRAM_ID)
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let response = app
        .client
        .delete(format!("{}/admin/pills/{id}", app.address))
        .header("x-telegram-id", TEST_ADMIN_TELEGRAM_ID)
        .send()
        .await?;
    assert_eq!(response.status(), 404);
    Ok(())
}

#[tokio::test]
async fn test_pill_import_counts_rows() -> Result<()> {
    let app = TestApp::spawn().await?;

    let file = "cargos;canais;tema;conteudo;arquivo_origem;pagina\n\
        Vendedor;Varejo;Planos;Pilula um.;manual.pdf;3\n\
        ;;Regras;;;\n\
        ;;Regras;Pilula dois.;;\n";

    let response = app
        .client
        .post(format!("{}/admin/pills/import", app.address))
        .header("x-telegram-id", TEST_ADMIN_TELEGRAM_ID)
        .body(file)
        .send()
        .await?;
    assert_eq!(response.status(), 200);
    let report: Value = response.json().await?;
    assert_eq!(report["imported"], 2);
    assert_eq!(report["skipped"], 1);

    let pills: Vec<Value> = app
        .client
        .get(format!("{}/admin/pills", app.address))
        .header("x-telegram-id", TEST_ADMIN_TELEGRAM_ID)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(pills.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_send_now_delivers_and_rotates() -> Result<()> {
    let app = TestApp::spawn().await?;
    register(&app, "100", "Ana").await?;
    register(&app, "200", "Bia").await?;
    create_pill(&app, "Planos", "Primeira pilula.").await?;
    create_pill(&app, "Regras", "Segunda pilula.").await?;

    let first = send_now(&app).await?;
    assert_eq!(first["sent"], true);
    assert_eq!(first["recipients"], 2);
    assert_eq!(first["failures"], 0);
    let first_id = first["pill_id"].as_i64().expect("pill_id");

    // The rotation moves on to the pill that has never been sent.
    let second = send_now(&app).await?;
    assert_eq!(second["sent"], true);
    let second_id = second["pill_id"].as_i64().expect("pill_id");
    assert_ne!(first_id, second_id);

    // Both sent, so the rotation wraps back to the oldest send.
    let third = send_now(&app).await?;
    assert_eq!(third["pill_id"].as_i64(), Some(first_id));
    Ok(())
}

#[tokio::test]
async fn test_kill_switch_blocks_sends() -> Result<()> {
    let app = TestApp::spawn().await?;
    register(&app, "100", "Ana").await?;
    create_pill(&app, "Planos", "Primeira pilula.").await?;

    let response = app
        .client
        .put(format!("{}/admin/config", app.address))
        .header("x-telegram-id", TEST_ADMIN_TELEGRAM_ID)
        .json(&json!({ "pills_enabled": "false" }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let outcome = send_now(&app).await?;
    assert_eq!(outcome["sent"], false);
    assert_eq!(outcome["reason"], "disabled");
    Ok(())
}

#[tokio::test]
async fn test_send_now_without_content_reports_reason() -> Result<()> {
    let app = TestApp::spawn().await?;
    register(&app, "100", "Ana").await?;

    let outcome = send_now(&app).await?;
    assert_eq!(outcome["sent"], false);
    assert_eq!(outcome["reason"], "no content");
    Ok(())
}

#[tokio::test]
async fn test_targeted_pill_skips_non_matching_profiles() -> Result<()> {
    let app = TestApp::spawn().await?;
    register(&app, "100", "Ana").await?;

    // Ana is a Vendedor; this pill only targets Gerente.
    let response = app
        .client
        .post(format!("{}/admin/pills", app.address))
        .header("x-telegram-id", TEST_ADMIN_TELEGRAM_ID)
        .json(&json!({
            "tema": "Gestao",
            "conteudo": "Somente para gerentes.",
            "cargos": ["Gerente"]
        }))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    // The pill still rotates forward so it cannot block the queue head.
    let outcome = send_now(&app).await?;
    assert_eq!(outcome["sent"], true);
    assert_eq!(outcome["recipients"], 0);
    assert_eq!(outcome["reason"], "no eligible recipients");
    Ok(())
}
