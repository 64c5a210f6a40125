//! # Leaderboard/Stats Aggregator
//!
//! Read-only aggregation over session history. A user's total combines two
//! pools: the sum of their top-3 normal-session results per day, and the sum
//! of all their challenge-tagged results, both optionally restricted to a
//! time window. Profile filters narrow the user set through an allow-listed
//! set of keys; user input is never spliced into the SQL text.

use crate::{
    errors::QuizError,
    store::{int_at, text_at, Store},
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use turso::Value;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub nome: String,
    pub pontos: i64,
}

/// Query-string filters for the ranking endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RankingFilters {
    pub periodo: Option<String>,
    pub ddd_filter: Option<String>,
    pub canal_filter: Option<String>,
    pub rede_filter: Option<String>,
    pub loja_filter: Option<String>,
}

/// How many daily results count towards the normal pool.
const TOP_RESULTS_PER_DAY: usize = 3;

/// Resolves a `periodo` value to an inclusive window start timestamp.
/// Unknown or missing values mean all time.
fn window_start(periodo: Option<&str>) -> Option<String> {
    let today = Utc::now().date_naive();
    let start_day = match periodo {
        Some("semana") => {
            today - chrono::Duration::days(today.weekday().num_days_from_monday() as i64)
        }
        Some("mes") => today.with_day(1).unwrap_or(today),
        _ => return None,
    };
    Some(format!("{} 00:00:00", start_day.format("%Y-%m-%d")))
}

/// The allow-listed profile filter columns. Anything else in the query string
/// is ignored.
fn profile_conditions(
    filters: &RankingFilters,
    conditions: &mut Vec<String>,
    params: &mut Vec<Value>,
) {
    let pairs: [(&Option<String>, &str); 4] = [
        (&filters.ddd_filter, "u.ddd"),
        (&filters.canal_filter, "u.canal_principal"),
        (&filters.rede_filter, "u.rede_parceiro"),
        (&filters.loja_filter, "u.loja"),
    ];
    for (value, column) in pairs {
        if let Some(value) = value {
            if !value.trim().is_empty() {
                conditions.push(format!("{column} = ?"));
                params.push(value.clone().into());
            }
        }
    }
}

/// Computes the ranked point totals and returns the top `limit` entries.
/// Ties are broken by ascending Telegram id.
pub async fn top_players(
    store: &Store,
    filters: &RankingFilters,
    limit: usize,
) -> Result<Vec<RankEntry>, QuizError> {
    let conn = store.connect()?;
    let start = window_start(filters.periodo.as_deref());

    // Totals keyed by telegram_id; the name rides along for the output.
    let mut totals: HashMap<String, (String, i64)> = HashMap::new();

    // Normal pool: every untagged result in the window, grouped per user and
    // day in Rust so only the top three results of each day count.
    {
        let mut conditions = vec!["s.challenge_id IS NULL".to_string()];
        let mut params: Vec<Value> = Vec::new();
        if let Some(start) = &start {
            conditions.push("r.created_at >= ?".to_string());
            params.push(start.clone().into());
        }
        profile_conditions(filters, &mut conditions, &mut params);

        let sql = format!(
            "SELECT u.telegram_id, u.nome, substr(r.created_at, 1, 10) AS dia, r.pontos \
             FROM results r \
             JOIN sessions s ON s.id = r.session_id \
             JOIN users u ON u.telegram_id = r.user_id \
             WHERE {}",
            conditions.join(" AND ")
        );

        let mut rows = conn.query(&sql, params).await?;
        let mut per_day: HashMap<(String, String), Vec<i64>> = HashMap::new();
        let mut names: HashMap<String, String> = HashMap::new();
        while let Some(row) = rows.next().await? {
            let telegram_id = text_at(&row, 0)?;
            let nome = text_at(&row, 1)?;
            let dia = text_at(&row, 2)?;
            let pontos = int_at(&row, 3)?;
            names.insert(telegram_id.clone(), nome);
            per_day.entry((telegram_id, dia)).or_default().push(pontos);
        }
        for ((telegram_id, _), mut points) in per_day {
            points.sort_unstable_by(|a, b| b.cmp(a));
            let day_total: i64 = points.iter().take(TOP_RESULTS_PER_DAY).sum();
            let nome = names.get(&telegram_id).cloned().unwrap_or_default();
            let entry = totals.entry(telegram_id).or_insert((nome, 0));
            entry.1 += day_total;
        }
    }

    // Challenge pool: every tagged result in the window counts in full.
    {
        let mut conditions = vec!["s.challenge_id IS NOT NULL".to_string()];
        let mut params: Vec<Value> = Vec::new();
        if let Some(start) = &start {
            conditions.push("r.created_at >= ?".to_string());
            params.push(start.clone().into());
        }
        profile_conditions(filters, &mut conditions, &mut params);

        let sql = format!(
            "SELECT u.telegram_id, u.nome, SUM(r.pontos) \
             FROM results r \
             JOIN sessions s ON s.id = r.session_id \
             JOIN users u ON u.telegram_id = r.user_id \
             WHERE {} \
             GROUP BY u.telegram_id, u.nome",
            conditions.join(" AND ")
        );

        let mut rows = conn.query(&sql, params).await?;
        while let Some(row) = rows.next().await? {
            let telegram_id = text_at(&row, 0)?;
            let nome = text_at(&row, 1)?;
            let pontos = int_at(&row, 2)?;
            let entry = totals.entry(telegram_id).or_insert((nome, 0));
            entry.1 += pontos;
        }
    }

    let mut ranked: Vec<(String, String, i64)> = totals
        .into_iter()
        .map(|(telegram_id, (nome, pontos))| (telegram_id, nome, pontos))
        .collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);

    Ok(ranked
        .into_iter()
        .map(|(_, nome, pontos)| RankEntry { nome, pontos })
        .collect())
}

/// Per-user aggregate statistics for the BI export surface.
#[derive(Debug, Serialize)]
pub struct UserStats {
    pub telegram_id: String,
    pub sessoes: i64,
    pub respostas: i64,
    pub acertos: i64,
    pub precisao: f64,
    pub melhor_pontuacao: i64,
}

pub async fn user_stats(store: &Store, telegram_id: &str) -> Result<UserStats, QuizError> {
    let conn = store.connect()?;

    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM sessions WHERE user_id = ?",
            turso::params![telegram_id],
        )
        .await?;
    let sessoes = match rows.next().await? {
        Some(row) => int_at(&row, 0)?,
        None => 0,
    };

    let mut rows = conn
        .query(
            "SELECT COUNT(*), COALESCE(SUM(acertou), 0) FROM answers WHERE user_id = ?",
            turso::params![telegram_id],
        )
        .await?;
    let (respostas, acertos) = match rows.next().await? {
        Some(row) => (int_at(&row, 0)?, int_at(&row, 1)?),
        None => (0, 0),
    };

    let mut rows = conn
        .query(
            "SELECT COALESCE(MAX(pontos), 0) FROM results WHERE user_id = ?",
            turso::params![telegram_id],
        )
        .await?;
    let melhor_pontuacao = match rows.next().await? {
        Some(row) => int_at(&row, 0)?,
        None => 0,
    };

    let precisao = if respostas > 0 {
        (acertos as f64 / respostas as f64) * 100.0
    } else {
        0.0
    };

    Ok(UserStats {
        telegram_id: telegram_id.to_string(),
        sessoes,
        respostas,
        acertos,
        precisao,
        melhor_pontuacao,
    })
}
