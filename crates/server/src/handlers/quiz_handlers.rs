//! Handlers for the quiz session lifecycle: start, answer, finish.

use crate::{errors::AppError, state::AppState, types::StatusResponse};
use axum::{
    extract::{Query, State},
    Json,
};
use quizd::quiz::{self, AnswerSubmission, StartedSession};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Query parameters for `GET /quiz/start`.
#[derive(Debug, Deserialize)]
pub struct StartQuizParams {
    pub telegram_id: String,
    #[serde(default)]
    pub cargo: String,
    #[serde(default)]
    pub canal_principal: String,
    #[serde(default)]
    pub desafio_id: Option<i64>,
}

/// Handler for `GET /quiz/start`: samples questions for the caller's profile
/// and opens a session.
pub async fn start_quiz_handler(
    State(app_state): State<AppState>,
    Query(params): Query<StartQuizParams>,
) -> Result<Json<StartedSession>, AppError> {
    info!(telegram_id = %params.telegram_id, "Received quiz start request.");
    let session = quiz::start_session(
        &app_state.store,
        &app_state.questions,
        &params.telegram_id,
        &params.cargo,
        &params.canal_principal,
        params.desafio_id,
    )
    .await?;
    Ok(Json(session))
}

/// Handler for `POST /quiz/answer`.
pub async fn answer_handler(
    State(app_state): State<AppState>,
    Json(submission): Json<AnswerSubmission>,
) -> Result<Json<StatusResponse>, AppError> {
    quiz::record_answer(&app_state.store, &submission).await?;
    Ok(Json(StatusResponse::success()))
}

/// The request body for `POST /quiz/finish`.
#[derive(Debug, Deserialize)]
pub struct FinishQuizRequest {
    pub telegram_id: String,
    pub simulado_id: i64,
    pub num_acertos: i64,
    pub total_perguntas: i64,
}

/// The response body for `POST /quiz/finish`.
#[derive(Serialize)]
pub struct FinishQuizResponse {
    pub status: &'static str,
    pub pontuacao_base: i64,
    pub pontuacao_final_com_bonus: i64,
    pub num_acertos: i64,
    pub total_perguntas: i64,
}

/// Handler for `POST /quiz/finish`: scores the session and records the result.
pub async fn finish_quiz_handler(
    State(app_state): State<AppState>,
    Json(request): Json<FinishQuizRequest>,
) -> Result<Json<FinishQuizResponse>, AppError> {
    let finished = quiz::finish_session(
        &app_state.store,
        &request.telegram_id,
        request.simulado_id,
        request.num_acertos,
        request.total_perguntas,
    )
    .await?;
    Ok(Json(FinishQuizResponse {
        status: "success",
        pontuacao_base: finished.pontuacao_base,
        pontuacao_final_com_bonus: finished.pontuacao_final_com_bonus,
        num_acertos: finished.num_acertos,
        total_perguntas: finished.total_perguntas,
    }))
}
