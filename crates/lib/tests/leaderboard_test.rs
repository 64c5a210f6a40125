//! Integration tests for the ranking aggregation: the daily top-3 cap on
//! normal sessions, the uncapped challenge pool, time windows, and profile
//! filters.

use anyhow::Result;
use chrono::Utc;
use quizd::leaderboard::{self, RankingFilters};
use quizd_test_utils::{seed_result, seed_session, seed_user, test_store};
use turso::params;

const DAY_ONE: &str = "2026-08-10 09:00:00";

async fn seed_normal_result(
    store: &quizd::Store,
    user: &str,
    pontos: i64,
    created_at: &str,
) -> Result<()> {
    let session = seed_session(store, user, None, created_at).await?;
    seed_result(store, user, session, pontos, created_at).await
}

#[tokio::test]
async fn test_only_top_three_daily_results_count() -> Result<()> {
    let store = test_store().await?;
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;

    // Five results on the same day; only the best three (50+40+30) count.
    for pontos in [10, 30, 40, 20, 50] {
        seed_normal_result(&store, "100", pontos, DAY_ONE).await?;
    }

    let ranking = leaderboard::top_players(&store, &RankingFilters::default(), 10).await?;
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].nome, "Ana");
    assert_eq!(ranking[0].pontos, 120);
    Ok(())
}

#[tokio::test]
async fn test_daily_cap_resets_per_day() -> Result<()> {
    let store = test_store().await?;
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;

    for pontos in [50, 50, 50, 50] {
        seed_normal_result(&store, "100", pontos, DAY_ONE).await?;
    }
    seed_normal_result(&store, "100", 50, "2026-08-11 09:00:00").await?;

    let ranking = leaderboard::top_players(&store, &RankingFilters::default(), 10).await?;
    // 150 from day one plus 50 from day two.
    assert_eq!(ranking[0].pontos, 200);
    Ok(())
}

#[tokio::test]
async fn test_challenge_results_count_in_full() -> Result<()> {
    let store = test_store().await?;
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    let conn = store.connect()?;
    conn.execute(
        "INSERT INTO challenges (kind, value, status, created_at) \
         VALUES ('tema', 'Planos', 'active', ?)",
        params![DAY_ONE],
    )
    .await?;

    // Five challenge results on one day all count, unlike the normal pool.
    for pontos in [10, 10, 10, 10, 10] {
        let session = seed_session(&store, "100", Some(1), DAY_ONE).await?;
        seed_result(&store, "100", session, pontos, DAY_ONE).await?;
    }

    let ranking = leaderboard::top_players(&store, &RankingFilters::default(), 10).await?;
    assert_eq!(ranking[0].pontos, 50);
    Ok(())
}

#[tokio::test]
async fn test_ordering_and_limit() -> Result<()> {
    let store = test_store().await?;
    for (id, nome, pontos) in [("300", "Caio", 80), ("100", "Ana", 120), ("200", "Bia", 80)] {
        seed_user(&store, id, nome, "11", "Varejo", "Vendedor").await?;
        seed_normal_result(&store, id, pontos, DAY_ONE).await?;
    }

    let ranking = leaderboard::top_players(&store, &RankingFilters::default(), 2).await?;
    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking[0].nome, "Ana");
    // Tie between Bia and Caio resolves by ascending telegram id.
    assert_eq!(ranking[1].nome, "Bia");
    Ok(())
}

#[tokio::test]
async fn test_profile_filters_narrow_the_pool() -> Result<()> {
    let store = test_store().await?;
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    seed_user(&store, "200", "Bia", "21", "Loja Propria", "Vendedor").await?;
    seed_normal_result(&store, "100", 50, DAY_ONE).await?;
    seed_normal_result(&store, "200", 90, DAY_ONE).await?;

    let filters = RankingFilters {
        ddd_filter: Some("11".to_string()),
        ..Default::default()
    };
    let ranking = leaderboard::top_players(&store, &filters, 10).await?;
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].nome, "Ana");

    let filters = RankingFilters {
        canal_filter: Some("Loja Propria".to_string()),
        ..Default::default()
    };
    let ranking = leaderboard::top_players(&store, &filters, 10).await?;
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].nome, "Bia");
    Ok(())
}

#[tokio::test]
async fn test_period_window_excludes_old_results() -> Result<()> {
    let store = test_store().await?;
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;

    // One result today, one far in the past.
    let today = Utc::now().format("%Y-%m-%d 09:00:00").to_string();
    seed_normal_result(&store, "100", 70, &today).await?;
    seed_normal_result(&store, "100", 999, "2020-01-01 09:00:00").await?;

    let filters = RankingFilters {
        periodo: Some("mes".to_string()),
        ..Default::default()
    };
    let ranking = leaderboard::top_players(&store, &filters, 10).await?;
    assert_eq!(ranking.len(), 1);
    assert_eq!(ranking[0].pontos, 70);

    // All-time still sees both.
    let ranking = leaderboard::top_players(&store, &RankingFilters::default(), 10).await?;
    assert_eq!(ranking[0].pontos, 70 + 999);
    Ok(())
}

#[tokio::test]
async fn test_empty_history_yields_empty_ranking() -> Result<()> {
    let store = test_store().await?;
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;

    let ranking = leaderboard::top_players(&store, &RankingFilters::default(), 10).await?;
    assert!(ranking.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_user_stats_aggregates() -> Result<()> {
    let store = test_store().await?;
    seed_user(&store, "100", "Ana", "11", "Varejo", "Vendedor").await?;
    let session = seed_session(&store, "100", None, DAY_ONE).await?;
    seed_result(&store, "100", session, 88, DAY_ONE).await?;
    let conn = store.connect()?;
    for (i, acertou) in [1, 1, 0, 0].into_iter().enumerate() {
        conn.execute(
            "INSERT INTO answers (session_id, user_id, pergunta, resposta_usuario, \
             resposta_correta, acertou, answered_at) VALUES (?, '100', ?, 'x', 'y', ?, ?)",
            params![session, format!("pergunta {i}?"), acertou, DAY_ONE],
        )
        .await?;
    }

    let stats = leaderboard::user_stats(&store, "100").await?;
    assert_eq!(stats.sessoes, 1);
    assert_eq!(stats.respostas, 4);
    assert_eq!(stats.acertos, 2);
    assert_eq!(stats.melhor_pontuacao, 88);
    assert!((stats.precisao - 50.0).abs() < f64::EPSILON);
    Ok(())
}
