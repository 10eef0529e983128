use axum::{extract::State, Json};
use serde::Deserialize;

use crate::dto::session::HrResponse;
use crate::errors::AppError;
use crate::middleware::session::SessionContext;
use crate::services::{hr, prompts};
use crate::state::AppState;

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/hr/questions", tag = "HR practice", responses((status = 200, body = Vec<String>))))]
pub async fn list_questions() -> Json<Vec<&'static str>> {
    Json(hr::HR_QUESTIONS.to_vec())
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/session/hr", tag = "HR practice", responses((status = 200, body = HrResponse))))]
pub async fn get_state(ctx: SessionContext) -> Json<HrResponse> {
    Json(HrResponse::from(&ctx.session.lock().await.hr))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/session/hr/next", tag = "HR practice", responses((status = 200, body = HrResponse))))]
pub async fn next_question(ctx: SessionContext) -> Json<HrResponse> {
    let mut session = ctx.session.lock().await;
    session.hr.rotate(&mut rand::rng());
    Json(HrResponse::from(&session.hr))
}

#[derive(Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FeedbackRequest {
    pub answer: String,
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/session/hr/feedback", tag = "HR practice", request_body = FeedbackRequest, responses((status = 200, body = HrResponse), (status = 400, body = crate::errors::ErrorResponse), (status = 502, body = crate::errors::ErrorResponse))))]
pub async fn feedback(
    State(state): State<AppState>,
    ctx: SessionContext,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<HrResponse>, AppError> {
    let answer = payload.answer.trim();
    if answer.is_empty() {
        return Err(AppError::Validation(
            "Please enter your answer first".to_string(),
        ));
    }

    let (question_index, question, reset_key) = {
        let session = ctx.session.lock().await;
        (
            session.hr.question_index,
            session.hr.question(),
            session.hr.reset_key,
        )
    };

    let request = prompts::HR_FEEDBACK.request(
        prompts::hr_feedback_prompt(question, answer),
        Some(state.config.hr_model().to_string()),
    );
    let text = state.chat.complete(request).await?;

    let mut session = ctx.session.lock().await;
    // Feedback for a question the user has already rotated away from is not kept.
    if session.hr.reset_key == reset_key {
        session.hr.feedback = Some(text.clone());
    }

    Ok(Json(HrResponse {
        question_index,
        question: question.to_string(),
        feedback: Some(text),
        reset_key,
    }))
}
