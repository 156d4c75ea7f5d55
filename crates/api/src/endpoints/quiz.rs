//! Trivia quiz endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use careride_common::AppResult;
use careride_core::{ChatInput, ChatOutcome, ExplainInput, ExplainOutcome, Question, TranslateInput};
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create the quiz router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/questions", get(questions))
        .route("/chat", post(chat))
        .route("/explain", post(explain))
        .route("/translate", post(translate))
}

/// Question bank response.
#[derive(Serialize)]
pub struct QuestionsResponse {
    pub topics: serde_json::Map<String, serde_json::Value>,
}

/// Fetch the static question bank.
async fn questions(
    AuthUser(_, _): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<QuestionsResponse>> {
    let bank = state.quiz_service.questions()?;
    Ok(ApiResponse::ok(QuestionsResponse {
        topics: bank.topics,
    }))
}

/// Chat about a question without spoiling the answer.
async fn chat(
    AuthUser(user, _): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ChatInput>,
) -> AppResult<ApiResponse<ChatOutcome>> {
    let outcome = state.quiz_service.chat(&user.id, input).await?;
    Ok(ApiResponse::ok(outcome))
}

/// Explain the correct answer after the user has answered.
async fn explain(
    AuthUser(user, _): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ExplainInput>,
) -> AppResult<ApiResponse<ExplainOutcome>> {
    let outcome = state.quiz_service.explain(&user.id, input).await?;
    Ok(ApiResponse::ok(outcome))
}

/// Translated questions response.
#[derive(Serialize)]
pub struct TranslateResponse {
    pub questions: Vec<Question>,
}

/// Translate a batch of questions to Hebrew.
async fn translate(
    AuthUser(_, _): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<TranslateInput>,
) -> AppResult<ApiResponse<TranslateResponse>> {
    let questions = state.quiz_service.translate(input).await?;
    Ok(ApiResponse::ok(TranslateResponse { questions }))
}
