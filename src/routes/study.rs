use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::middleware::session::SessionContext;
use crate::models::quiz::{self, QuizGrade, QuizQuestion};
use crate::routes::require_document;
use crate::services::prompts;
use crate::state::AppState;

// ── Study plan ──────────────────────────────────────────────

#[derive(Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StudyPlanRequest {
    /// Free text such as "2 hours" or "3 days".
    pub available_time: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StudyPlanResponse {
    pub available_time: String,
    pub plan: String,
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/session/study-plan", tag = "Study", request_body = StudyPlanRequest, responses((status = 200, body = StudyPlanResponse), (status = 400, body = crate::errors::ErrorResponse), (status = 502, body = crate::errors::ErrorResponse))))]
pub async fn study_plan(
    State(state): State<AppState>,
    ctx: SessionContext,
    Json(payload): Json<StudyPlanRequest>,
) -> Result<Json<StudyPlanResponse>, AppError> {
    let available_time = payload.available_time.trim().to_string();
    if available_time.is_empty() {
        return Err(AppError::Validation(
            "Please enter the time you have available".to_string(),
        ));
    }

    let index = require_document(&*ctx.session.lock().await)?;
    let excerpt = index.excerpt(state.config.documents.excerpt_chars);

    let plan = state
        .chat
        .complete(
            prompts::STUDY_PLAN.request(prompts::study_plan_prompt(excerpt, &available_time), None),
        )
        .await?;

    Ok(Json(StudyPlanResponse {
        available_time,
        plan,
    }))
}

// ── Quiz ────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QuizRequest {
    pub count: Option<usize>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QuizResponse {
    pub questions: Vec<QuizQuestion>,
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/session/quiz", tag = "Study", request_body = QuizRequest, responses((status = 200, body = QuizResponse), (status = 400, body = crate::errors::ErrorResponse), (status = 502, body = crate::errors::ErrorResponse))))]
pub async fn generate_quiz(
    State(state): State<AppState>,
    ctx: SessionContext,
    Json(payload): Json<QuizRequest>,
) -> Result<Json<QuizResponse>, AppError> {
    let max_count = state.config.quiz.max_count;
    let count = payload.count.unwrap_or(state.config.quiz.default_count);
    if !(1..=max_count).contains(&count) {
        return Err(AppError::Validation(format!(
            "Number of questions must be between 1 and {max_count}"
        )));
    }

    let index = require_document(&*ctx.session.lock().await)?;
    let excerpt = index.excerpt(state.config.documents.excerpt_chars);

    let reply = state
        .chat
        .complete(prompts::QUIZ.request(prompts::quiz_prompt(count, excerpt), None))
        .await;

    // Whatever happens, the previous quiz is replaced.
    let parsed = reply
        .map_err(AppError::from)
        .and_then(|raw| quiz::parse_quiz(&raw).map_err(AppError::from));

    let mut session = ctx.session.lock().await;
    match parsed {
        Ok(questions) => {
            session.quiz = questions.clone();
            Ok(Json(QuizResponse { questions }))
        }
        Err(e) => {
            if let AppError::InvalidResponse(reason) = &e {
                tracing::warn!("Session {}: discarding invalid quiz response: {reason}", ctx.id);
            }
            session.quiz.clear();
            Err(e)
        }
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/session/quiz", tag = "Study", responses((status = 200, body = QuizResponse))))]
pub async fn get_quiz(ctx: SessionContext) -> Json<QuizResponse> {
    Json(QuizResponse {
        questions: ctx.session.lock().await.quiz.clone(),
    })
}

#[derive(Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GradeRequest {
    /// Selected label per question, in quiz order; `null` for unanswered.
    pub answers: Vec<Option<String>>,
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/session/quiz/grade", tag = "Study", request_body = GradeRequest, responses((status = 200, body = QuizGrade), (status = 400, body = crate::errors::ErrorResponse))))]
pub async fn grade_quiz(
    ctx: SessionContext,
    Json(payload): Json<GradeRequest>,
) -> Result<Json<QuizGrade>, AppError> {
    let session = ctx.session.lock().await;
    if session.quiz.is_empty() {
        return Err(AppError::Validation("No quiz generated yet".to_string()));
    }

    Ok(Json(quiz::grade_quiz(&session.quiz, &payload.answers)))
}
