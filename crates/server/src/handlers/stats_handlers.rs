//! Handlers for the public ranking endpoint.

use crate::{errors::AppError, state::AppState};
use axum::{
    extract::{Query, State},
    Json,
};
use quizd::leaderboard::{self, RankEntry, RankingFilters};

/// Handler for `GET /top10`: the ranked point totals, optionally windowed by
/// `periodo` and narrowed by profile filters.
pub async fn top10_handler(
    State(app_state): State<AppState>,
    Query(filters): Query<RankingFilters>,
) -> Result<Json<Vec<RankEntry>>, AppError> {
    let ranking = leaderboard::top_players(&app_state.store, &filters, 10).await?;
    Ok(Json(ranking))
}
