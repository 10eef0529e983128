use anyhow::{Context, Result};
use std::time::Duration;

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(120);

/// Text pulled out of a PDF, one entry per page.
#[derive(Debug, Clone, Default)]
pub struct ExtractedPdf {
    pub pages: Vec<String>,
}

impl ExtractedPdf {
    pub fn text(&self) -> String {
        self.pages.concat()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Extract page texts on the blocking pool.
pub async fn extract_text(bytes: Vec<u8>, filename: &str) -> Result<ExtractedPdf> {
    let fname = filename.to_string();
    tracing::info!("extract_text: starting extraction for '{fname}' ({} bytes)", bytes.len());

    let handle = tokio::task::spawn_blocking(move || extract_pages(&bytes));

    match tokio::time::timeout(EXTRACTION_TIMEOUT, handle).await {
        Ok(join_result) => join_result.context("PDF extraction task panicked")?,
        Err(_) => anyhow::bail!("PDF extraction timed out after 120s for '{fname}'"),
    }
}

/// Per-page extraction with lopdf. A page that fails yields an empty string;
/// a document lopdf cannot load is retried whole with pdf_extract.
pub fn extract_pages(bytes: &[u8]) -> Result<ExtractedPdf> {
    match lopdf::Document::load_mem(bytes) {
        Ok(doc) => {
            let pages = doc
                .get_pages()
                .into_keys()
                .map(|page_num| match doc.extract_text(&[page_num]) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!("Page {page_num} extraction failed, skipping: {e}");
                        String::new()
                    }
                })
                .collect();
            Ok(ExtractedPdf { pages })
        }
        Err(e) => {
            tracing::warn!("lopdf could not load PDF ({e}), falling back to pdf_extract");
            let text = pdf_extract::extract_text_from_mem(bytes)
                .context("Failed to extract text from PDF")?;
            Ok(ExtractedPdf { pages: vec![text] })
        }
    }
}

pub fn is_pdf(content_type: &str, filename: &str) -> bool {
    content_type == "application/pdf"
        || filename
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}

/// Split text into consecutive, non-overlapping windows of `chunk_size` words.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();

    words
        .chunks(chunk_size)
        .map(|window| window.join(" "))
        .collect()
}
