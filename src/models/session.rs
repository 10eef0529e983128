use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::models::quiz::QuizQuestion;
use crate::services::hr;
use crate::services::vector::DocumentIndex;

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QaEntry {
    pub question: String,
    pub answer: String,
    pub asked_at: String,
}

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub filename: String,
    pub uploaded_at: String,
    /// Taken from this upload; a cached index may come from a differently paginated file.
    pub page_count: usize,
    pub cached: bool,
    pub index: Arc<DocumentIndex>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HrState {
    pub question_index: usize,
    pub feedback: Option<String>,
    /// Bumped on every rotation so the UI can clear its answer box.
    pub reset_key: u64,
}

impl HrState {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            question_index: hr::random_question_index(rng),
            feedback: None,
            reset_key: 0,
        }
    }

    pub fn question(&self) -> &'static str {
        hr::question(self.question_index)
    }

    pub fn rotate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.question_index = hr::random_question_index(rng);
        self.feedback = None;
        self.reset_key += 1;
    }
}

/// Everything one browser session accumulates between requests.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub created_at: String,
    pub document: Option<LoadedDocument>,
    pub history: Vec<QaEntry>,
    pub quiz: Vec<QuizQuestion>,
    pub hr: HrState,
    last_active: Instant,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            created_at: chrono::Utc::now().to_rfc3339(),
            document: None,
            history: Vec::new(),
            quiz: Vec::new(),
            hr: HrState::new(&mut rand::rng()),
            last_active: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    /// Replaces the current document. The quiz belonged to the old text and is dropped.
    pub fn load_document(
        &mut self,
        filename: String,
        page_count: usize,
        index: Arc<DocumentIndex>,
        cached: bool,
    ) {
        self.document = Some(LoadedDocument {
            filename,
            uploaded_at: chrono::Utc::now().to_rfc3339(),
            page_count,
            cached,
            index,
        });
        self.quiz.clear();
    }

    pub fn record_answer(&mut self, question: String, answer: String) {
        self.history.push(QaEntry {
            question,
            answer,
            asked_at: chrono::Utc::now().to_rfc3339(),
        });
    }
}
