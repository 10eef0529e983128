use anyhow::Context;
use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::dto::document::DocumentResponse;
use crate::errors::AppError;
use crate::middleware::session::SessionContext;
use crate::services::pdf;
use crate::services::vector::{self, DocumentIndex};
use crate::state::AppState;

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/session/document", tag = "Documents", request_body(content = String, content_type = "multipart/form-data", description = "PDF file"), responses((status = 200, body = DocumentResponse), (status = 400, body = crate::errors::ErrorResponse))))]
pub async fn upload(
    State(state): State<AppState>,
    ctx: SessionContext,
    mut multipart: Multipart,
) -> Result<Json<DocumentResponse>, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart data: {e}")))?
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    let filename = field.file_name().unwrap_or("unnamed.pdf").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    if !pdf::is_pdf(&content_type, &filename) {
        return Err(AppError::Validation(
            "Only PDF files are supported".to_string(),
        ));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;

    let max_bytes = state.config.documents.max_upload_bytes;
    if data.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "File too large. Maximum size is {} MB",
            max_bytes / 1024 / 1024
        )));
    }

    let extracted = pdf::extract_text(data.to_vec(), &filename)
        .await
        .map_err(|e| AppError::Validation(format!("Could not read PDF: {e:#}")))?;

    let text = extracted.text();
    let page_count = extracted.page_count();
    let chunk_size = state.config.documents.chunk_size;
    let fingerprint = vector::fingerprint(&text);

    let (index, cached) = match state.index_cache.get(&fingerprint, chunk_size) {
        Some(index) => {
            tracing::info!("Index cache hit for '{filename}' ({fingerprint})");
            (index, true)
        }
        None => {
            let embedder = state.embedder.clone();
            let built = tokio::task::spawn_blocking(move || {
                DocumentIndex::build(text, chunk_size, embedder.as_ref())
            })
            .await
            .context("Indexing task panicked")??;

            let built = Arc::new(built);
            state.index_cache.insert(built.clone());
            (built, false)
        }
    };

    tracing::info!(
        "Session {}: '{filename}' processed ({} pages, {} chunks, cached={cached})",
        ctx.id,
        page_count,
        index.chunks.len()
    );

    let mut session = ctx.session.lock().await;
    session.load_document(filename, page_count, index, cached);

    let doc = session
        .document
        .as_ref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Document disappeared")))?;

    Ok(Json(doc.into()))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/session/document", tag = "Documents", responses((status = 200, body = DocumentResponse), (status = 404, body = crate::errors::ErrorResponse))))]
pub async fn get_document(ctx: SessionContext) -> Result<Json<DocumentResponse>, AppError> {
    let session = ctx.session.lock().await;
    let doc = session
        .document
        .as_ref()
        .ok_or_else(|| AppError::NotFound("No document uploaded".to_string()))?;

    Ok(Json(doc.into()))
}
