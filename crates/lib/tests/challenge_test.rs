//! Integration tests for the challenge lifecycle: activation with the
//! single-active invariant, session tagging, and the closing summary.

use anyhow::Result;
use quizd::{
    challenge::{self, ChallengeStatus, DeactivationOutcome},
    questions::QuestionCache,
    quiz::{self, AnswerSubmission},
    settings::{self, SettingKey},
    QuizError,
};
use quizd_test_utils::{seed_question, seed_result, seed_session, seed_user, test_store, RecordingNotifier};

#[tokio::test]
async fn test_activate_announces_to_all_users() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    seed_user(&store, "200", "Bia", "21", "Varejo", "Gerente").await?;

    let outcome = challenge::activate(&store, &notifier, "tema", "Planos").await?;

    assert_eq!(outcome.challenge.status, ChallengeStatus::Active);
    assert_eq!(outcome.challenge.value, "Planos");
    assert_eq!(outcome.notified.delivered, 2);
    assert_eq!(notifier.sent().len(), 2);
    assert!(notifier.sent()[0].text.contains("Planos"));
    Ok(())
}

#[tokio::test]
async fn test_second_activation_conflicts() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();
    challenge::activate(&store, &notifier, "tema", "Planos").await?;

    let err = challenge::activate(&store, &notifier, "subtema", "5G").await;
    assert!(matches!(err, Err(QuizError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn test_activate_rejects_bad_input() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();

    let err = challenge::activate(&store, &notifier, "categoria", "Planos").await;
    assert!(matches!(err, Err(QuizError::Validation(_))));

    let err = challenge::activate(&store, &notifier, "tema", "   ").await;
    assert!(matches!(err, Err(QuizError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn test_disabled_notifications_skip_broadcast() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    settings::set(&store, SettingKey::ChallengeNotificationsEnabled, "false").await?;

    let outcome = challenge::activate(&store, &notifier, "tema", "Planos").await?;

    assert_eq!(outcome.notified.delivered, 0);
    assert!(notifier.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sessions_started_during_challenge_are_tagged() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();
    let cache = QuestionCache::new();
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    seed_question(&store, &cache, "pergunta?", "Planos", &[], &[]).await?;
    let outcome = challenge::activate(&store, &notifier, "tema", "Planos").await?;

    let session = quiz::start_session(
        &store,
        &cache,
        "100",
        "Vendedor",
        "Varejo",
        Some(outcome.challenge.id),
    )
    .await?;

    let tagged = challenge::get(&store, outcome.challenge.id).await?.unwrap();
    assert_eq!(tagged.status, ChallengeStatus::Active);
    assert!(session.simulado_id > 0);
    Ok(())
}

#[tokio::test]
async fn test_start_with_inactive_challenge_fails() -> Result<()> {
    let store = test_store().await?;
    let cache = QuestionCache::new();
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    seed_question(&store, &cache, "pergunta?", "Planos", &[], &[]).await?;

    let err = quiz::start_session(&store, &cache, "100", "Vendedor", "Varejo", Some(99)).await;
    assert!(matches!(err, Err(QuizError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_deactivate_summarizes_and_closes() -> Result<()> {
    // --- 1. Arrange ---
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();
    let cache = QuestionCache::new();
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    seed_user(&store, "200", "Bia", "21", "Varejo", "Gerente").await?;
    seed_question(&store, &cache, "pergunta?", "Planos", &[], &[]).await?;
    settings::set(&store, SettingKey::ChallengeNotificationsEnabled, "false").await?;
    let active = challenge::activate(&store, &notifier, "tema", "Planos")
        .await?
        .challenge;
    settings::set(&store, SettingKey::ChallengeNotificationsEnabled, "true").await?;

    // Ana plays the challenge and wins; Bia plays too.
    for (user, acertou, pontos) in [("100", true, 120), ("200", false, 50)] {
        let session = quiz::start_session(&store, &cache, user, "Vendedor", "Varejo", Some(active.id)).await?;
        quiz::record_answer(
            &store,
            &AnswerSubmission {
                simulado_id: session.simulado_id,
                telegram_id: user.to_string(),
                pergunta: "pergunta?".to_string(),
                resposta_usuario: if acertou { "Certa" } else { "Errada" }.to_string(),
                resposta_correta: "Certa".to_string(),
                acertou,
                tema: "Planos".to_string(),
                subtema: String::new(),
            },
        )
        .await?;
        seed_result(&store, user, session.simulado_id, pontos, "2026-08-20 10:00:00").await?;
    }

    // --- 2. Act ---
    let outcome = challenge::deactivate(&store, &notifier).await?;

    // --- 3. Assert ---
    let DeactivationOutcome::Closed { summary, notified } = outcome else {
        panic!("expected a closed challenge");
    };
    assert_eq!(summary.challenge.status, ChallengeStatus::Closed);
    assert!(summary.challenge.closed_at.is_some());
    assert_eq!(summary.participantes, 2);
    assert_eq!(summary.total_respostas, 2);
    assert_eq!(summary.acertos, 1);
    assert_eq!(summary.top10.len(), 2);
    assert_eq!(summary.top10[0].nome, "Ana");
    assert_eq!(summary.top10[0].pontos, 120);
    assert_eq!(notified.delivered, 2);
    assert!(notifier.sent().iter().any(|m| m.text.contains("Ana")));

    assert!(challenge::active_challenge(&store).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_deactivate_without_active_challenge_is_a_noop() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();

    let outcome = challenge::deactivate(&store, &notifier).await?;
    assert!(matches!(outcome, DeactivationOutcome::NoActiveChallenge));
    assert!(notifier.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_list_returns_newest_first() -> Result<()> {
    let store = test_store().await?;
    let notifier = RecordingNotifier::new();
    settings::set(&store, SettingKey::ChallengeNotificationsEnabled, "false").await?;

    challenge::activate(&store, &notifier, "tema", "Planos").await?;
    challenge::deactivate(&store, &notifier).await?;
    challenge::activate(&store, &notifier, "subtema", "5G").await?;

    let all = challenge::list(&store).await?;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].value, "5G");
    assert_eq!(all[1].value, "Planos");
    assert_eq!(all[1].status, ChallengeStatus::Closed);

    // seed_session helper keeps the FK usable for ad-hoc rows too.
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    let id = seed_session(&store, "100", Some(all[0].id), "2026-08-20 10:00:00").await?;
    assert!(id > 0);
    Ok(())
}
