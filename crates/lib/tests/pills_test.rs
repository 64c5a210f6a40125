//! Integration tests for the pill rotation and broadcast: recipient
//! targeting, rotation order, failure tallying, and the kill switch.

use anyhow::Result;
use quizd::{
    pills::{self, Pill},
    settings::{self, SettingKey},
    QuizError,
};
use quizd_test_utils::{seed_user, test_store, RecordingNotifier};

fn pill(tema: &str, conteudo: &str, cargos: &[&str], canais: &[&str]) -> Pill {
    Pill {
        id: 0,
        cargos: cargos.iter().map(|s| s.to_string()).collect(),
        canais: canais.iter().map(|s| s.to_string()).collect(),
        tema: tema.to_string(),
        conteudo: conteudo.to_string(),
        arquivo_origem: String::new(),
        pagina: None,
        telegram_file_id: None,
        last_sent_at: None,
    }
}

#[tokio::test]
async fn test_send_targets_matching_profiles_only() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    seed_user(&store, "200", "Bia", "21", "Varejo", "Gerente").await?;
    seed_user(&store, "300", "Caio", "31", "Loja Propria", "Vendedor").await?;
    pills::insert_pill(&store, &pill("Planos", "Novo plano X.", &["Vendedor"], &["Varejo"])).await?;

    let outcome = pills::send_next_pill(&store, &notifier).await?;

    assert!(outcome.sent);
    assert_eq!(outcome.recipients, 1);
    assert_eq!(outcome.failures, 0);
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, "100");
    assert!(sent[0].text.contains("Novo plano X."));
    Ok(())
}

#[tokio::test]
async fn test_rotation_prefers_never_sent_then_oldest() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    let first = pills::insert_pill(&store, &pill("A", "primeiro", &[], &[])).await?;
    let second = pills::insert_pill(&store, &pill("B", "segundo", &[], &[])).await?;

    // Two sends walk the rotation in insertion order, then wrap around.
    let outcome = pills::send_next_pill(&store, &notifier).await?;
    assert_eq!(outcome.pill_id, Some(first));
    let outcome = pills::send_next_pill(&store, &notifier).await?;
    assert_eq!(outcome.pill_id, Some(second));
    let outcome = pills::send_next_pill(&store, &notifier).await?;
    assert_eq!(outcome.pill_id, Some(first));
    Ok(())
}

#[tokio::test]
async fn test_kill_switch_blocks_sends() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    pills::insert_pill(&store, &pill("A", "conteudo", &[], &[])).await?;
    settings::set(&store, SettingKey::PillsEnabled, "false").await?;

    let outcome = pills::send_next_pill(&store, &notifier).await?;

    assert!(!outcome.sent);
    assert_eq!(outcome.reason.as_deref(), Some("disabled"));
    assert!(notifier.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_empty_table_reports_no_content() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();

    let outcome = pills::send_next_pill(&store, &notifier).await?;
    assert!(!outcome.sent);
    assert_eq!(outcome.reason.as_deref(), Some("no content"));
    Ok(())
}

#[tokio::test]
async fn test_untargetable_pill_still_rotates() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    let orphan = pills::insert_pill(&store, &pill("A", "ninguem", &["Diretor"], &[])).await?;
    let reachable = pills::insert_pill(&store, &pill("B", "todos", &[], &[])).await?;

    let outcome = pills::send_next_pill(&store, &notifier).await?;
    assert_eq!(outcome.pill_id, Some(orphan));
    assert_eq!(outcome.recipients, 0);
    assert_eq!(outcome.reason.as_deref(), Some("no eligible recipients"));

    // The orphan does not block the queue head.
    let outcome = pills::send_next_pill(&store, &notifier).await?;
    assert_eq!(outcome.pill_id, Some(reachable));
    assert_eq!(outcome.recipients, 1);
    Ok(())
}

#[tokio::test]
async fn test_per_recipient_failures_are_tallied() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    seed_user(&store, "200", "Bia", "21", "Varejo", "Gerente").await?;
    notifier.fail_for("200");
    pills::insert_pill(&store, &pill("A", "conteudo", &[], &[])).await?;

    let outcome = pills::send_next_pill(&store, &notifier).await?;

    assert!(outcome.sent);
    assert_eq!(outcome.recipients, 1);
    assert_eq!(outcome.failures, 1);
    Ok(())
}

#[tokio::test]
async fn test_attachment_goes_out_as_document() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    let mut with_file = pill("A", "veja o anexo", &[], &[]);
    with_file.telegram_file_id = Some("file-abc".to_string());
    pills::insert_pill(&store, &with_file).await?;

    pills::send_next_pill(&store, &notifier).await?;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].file_id.as_deref(), Some("file-abc"));
    Ok(())
}

#[tokio::test]
async fn test_crud_and_import() -> Result<()> {
    let store = test_store().await?;

    let id = pills::insert_pill(&store, &pill("A", "original", &[], &[])).await?;
    let mut updated = pill("A", "editado", &["Vendedor"], &[]);
    pills::update_pill(&store, id, &updated).await?;

    let all = pills::list_pills(&store).await?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].conteudo, "editado");
    assert_eq!(all[0].cargos, vec!["Vendedor".to_string()]);

    updated.conteudo = String::new();
    let err = pills::update_pill(&store, id, &updated).await;
    assert!(matches!(err, Err(QuizError::Validation(_))));

    pills::delete_pill(&store, id).await?;
    let err = pills::delete_pill(&store, id).await;
    assert!(matches!(err, Err(QuizError::NotFound(_))));

    let data = "cargos;canais;tema;conteudo;arquivo_origem;pagina\n\
                Vendedor;Varejo;Planos;Pilula um;doc.pdf;3\n\
                ;;Planos;Pilula dois;;\n\
                ;;Planos;;;\n";
    let report = pills::import_pills(&store, data).await?;
    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(pills::list_pills(&store).await?.len(), 2);
    Ok(())
}
