use serde::Serialize;

use crate::models::session::LoadedDocument;

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DocumentResponse {
    pub filename: String,
    pub uploaded_at: String,
    pub page_count: usize,
    pub char_count: usize,
    pub word_count: usize,
    pub chunk_size: usize,
    pub chunk_count: usize,
    pub fingerprint: String,
    /// True when the index came from the cache instead of being re-embedded.
    pub cached: bool,
}

impl From<&LoadedDocument> for DocumentResponse {
    fn from(doc: &LoadedDocument) -> Self {
        Self {
            filename: doc.filename.clone(),
            uploaded_at: doc.uploaded_at.clone(),
            page_count: doc.page_count,
            char_count: doc.index.text.chars().count(),
            word_count: doc.index.word_count(),
            chunk_size: doc.index.chunk_size,
            chunk_count: doc.index.chunks.len(),
            fingerprint: doc.index.fingerprint.clone(),
            cached: doc.cached,
        }
    }
}
