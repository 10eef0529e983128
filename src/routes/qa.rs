use anyhow::Context;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::middleware::session::SessionContext;
use crate::models::session::QaEntry;
use crate::routes::require_document;
use crate::services::prompts;
use crate::services::vector::RetrievedChunk;
use crate::state::AppState;

#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AskMode {
    /// Answer from the top-k retrieved chunks.
    #[default]
    Retrieval,
    /// Answer from the opening excerpt of the document.
    Excerpt,
}

#[derive(Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub mode: AskMode,
}

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnswerResponse {
    pub question: String,
    pub answer: String,
    pub mode: AskMode,
    pub sources: Vec<RetrievedChunk>,
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/session/ask", tag = "Q&A", request_body = AskRequest, responses((status = 200, body = AnswerResponse), (status = 400, body = crate::errors::ErrorResponse), (status = 502, body = crate::errors::ErrorResponse))))]
pub async fn ask(
    State(state): State<AppState>,
    ctx: SessionContext,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let question = payload.question.trim().to_string();
    if question.is_empty() {
        return Err(AppError::Validation("Question cannot be empty".to_string()));
    }

    let index = require_document(&*ctx.session.lock().await)?;

    let (request, sources) = match payload.mode {
        AskMode::Retrieval => {
            let embedder = state.embedder.clone();
            let top_k = state.config.documents.top_k;
            let query = question.clone();
            let doc = index.clone();
            let sources = tokio::task::spawn_blocking(move || {
                doc.retrieve(&query, top_k, embedder.as_ref())
            })
            .await
            .context("Retrieval task panicked")??;

            let chunks: Vec<&str> = sources.iter().map(|s| s.text.as_str()).collect();
            let prompt = prompts::retrieval_qa_prompt(&chunks, &question);
            (prompts::RETRIEVAL_QA.request(prompt, None), sources)
        }
        AskMode::Excerpt => {
            let excerpt = index.excerpt(state.config.documents.excerpt_chars);
            let prompt = prompts::excerpt_qa_prompt(excerpt, &question);
            (
                prompts::EXCERPT_QA.request(prompt, Some(state.config.excerpt_model().to_string())),
                Vec::new(),
            )
        }
    };

    let answer = state.chat.complete(request).await?;

    ctx.session
        .lock()
        .await
        .record_answer(question.clone(), answer.clone());

    Ok(Json(AnswerResponse {
        question,
        answer,
        mode: payload.mode,
        sources,
    }))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/session/history", tag = "Q&A", responses((status = 200, body = Vec<QaEntry>))))]
pub async fn history(ctx: SessionContext) -> Json<Vec<QaEntry>> {
    Json(ctx.session.lock().await.history.clone())
}
