use serde::Serialize;
use uuid::Uuid;

use crate::dto::document::DocumentResponse;
use crate::models::session::{HrState, Session};

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HrResponse {
    pub question_index: usize,
    pub question: String,
    pub feedback: Option<String>,
    pub reset_key: u64,
}

impl From<&HrState> for HrResponse {
    fn from(hr: &HrState) -> Self {
        Self {
            question_index: hr.question_index,
            question: hr.question().to_string(),
            feedback: hr.feedback.clone(),
            reset_key: hr.reset_key,
        }
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionResponse {
    pub id: Uuid,
    pub created_at: String,
    pub document: Option<DocumentResponse>,
    pub history_count: usize,
    pub quiz_count: usize,
    pub hr: HrResponse,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            created_at: session.created_at.clone(),
            document: session.document.as_ref().map(DocumentResponse::from),
            history_count: session.history.len(),
            quiz_count: session.quiz.len(),
            hr: HrResponse::from(&session.hr),
        }
    }
}
