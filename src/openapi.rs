use axum::Router;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_redoc::{Redoc, Servable};

use crate::dto::document::DocumentResponse;
use crate::dto::session::{HrResponse, SessionResponse};
use crate::errors::ErrorResponse;
use crate::models::quiz::{QuestionResult, QuizGrade, QuizQuestion};
use crate::models::session::QaEntry;
use crate::routes::health::HealthResponse;
use crate::routes::hr::FeedbackRequest;
use crate::routes::qa::{AnswerResponse, AskMode, AskRequest};
use crate::routes::study::{GradeRequest, QuizRequest, QuizResponse, StudyPlanRequest, StudyPlanResponse};
use crate::services::vector::RetrievedChunk;
use crate::state::AppState;

struct SessionHeaderAddon;

impl Modify for SessionHeaderAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_id",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-session-id"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PDF Study Assistant API",
        version = "0.1.0",
        description = "Upload a PDF, ask questions about it, generate study plans and quizzes, and practise HR interviews."
    ),
    modifiers(&SessionHeaderAddon),
    paths(
        crate::routes::health::health_check,
        crate::routes::sessions::create_session,
        crate::routes::sessions::get_session,
        crate::routes::sessions::delete_session,
        crate::routes::documents::upload,
        crate::routes::documents::get_document,
        crate::routes::qa::ask,
        crate::routes::qa::history,
        crate::routes::study::study_plan,
        crate::routes::study::generate_quiz,
        crate::routes::study::get_quiz,
        crate::routes::study::grade_quiz,
        crate::routes::hr::list_questions,
        crate::routes::hr::get_state,
        crate::routes::hr::next_question,
        crate::routes::hr::feedback,
    ),
    components(
        schemas(
            HealthResponse, SessionResponse, HrResponse, DocumentResponse,
            AskRequest, AskMode, AnswerResponse, RetrievedChunk, QaEntry,
            StudyPlanRequest, StudyPlanResponse,
            QuizRequest, QuizResponse, QuizQuestion, GradeRequest, QuizGrade, QuestionResult,
            FeedbackRequest, ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Sessions", description = "Per-browser session lifecycle"),
        (name = "Documents", description = "PDF upload and indexing"),
        (name = "Q&A", description = "Questions about the uploaded PDF and their history"),
        (name = "Study", description = "Study plans and multiple-choice quizzes"),
        (name = "HR practice", description = "Mock HR interview questions and feedback"),
    )
)]
pub struct ApiDoc;

pub fn docs_router() -> Router<AppState> {
    Router::new().merge(Redoc::with_url("/api/docs", ApiDoc::openapi()))
}
