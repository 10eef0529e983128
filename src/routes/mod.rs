use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_mw,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::errors::AppError;
use crate::middleware::session::session_middleware;
use crate::models::session::Session;
use crate::services::vector::DocumentIndex;
use crate::state::AppState;

pub mod documents;
pub mod health;
pub mod hr;
pub mod qa;
pub mod sessions;
pub mod study;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.documents.max_upload_bytes + MULTIPART_OVERHEAD;

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/sessions", post(sessions::create_session))
        .route("/api/session", delete(sessions::delete_session))
        .route("/api/hr/questions", get(hr::list_questions));

    let session_routes = Router::new()
        .route(
            "/api/session",
            get(sessions::get_session),
        )
        .route(
            "/api/session/document",
            post(documents::upload).get(documents::get_document),
        )
        .route("/api/session/ask", post(qa::ask))
        .route("/api/session/history", get(qa::history))
        .route("/api/session/study-plan", post(study::study_plan))
        .route(
            "/api/session/quiz",
            post(study::generate_quiz).get(study::get_quiz),
        )
        .route("/api/session/quiz/grade", post(study::grade_quiz))
        .route("/api/session/hr", get(hr::get_state))
        .route("/api/session/hr/next", post(hr::next_question))
        .route("/api/session/hr/feedback", post(hr::feedback))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    let app = Router::new().merge(public_routes).merge(session_routes);

    #[cfg(feature = "openapi")]
    let app = app.merge(crate::openapi::docs_router());

    app.fallback_service(ServeDir::new(&state.config.server.static_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub(crate) fn require_document(session: &Session) -> Result<Arc<DocumentIndex>, AppError> {
    session
        .document
        .as_ref()
        .map(|doc| doc.index.clone())
        .ok_or_else(|| AppError::Validation("Please upload a PDF to get started.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::middleware::session::SESSION_HEADER;
    use crate::services::llm_provider::LlmError;
    use crate::services::pdf::tests::{pdf_from_contents, sample_pdf, text_page_blocks};
    use crate::services::prompts;
    use crate::test_support::{test_state, ScriptedChat};

    const QUIZ_JSON: &str = r#"[
        {"question": "What do mitochondria produce?",
         "options": {"A": "ATP", "B": "DNA", "C": "Starch", "D": "Oxygen"},
         "answer": "A"},
        {"question": "Where does photosynthesis happen?",
         "options": {"A": "Roots", "B": "Chloroplasts", "C": "Nucleus", "D": "Vacuole"},
         "answer": "B"}
    ]"#;

    fn biology_text(words: usize) -> String {
        let sentence = "mitochondria produce energy for the cell while chloroplasts capture light";
        sentence
            .split_whitespace()
            .cycle()
            .take(words)
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn seed_document(state: &AppState, text: &str) -> Uuid {
        let (id, handle) = state.sessions.create().await;
        let index = DocumentIndex::build(
            text.to_string(),
            state.config.documents.chunk_size,
            state.embedder.as_ref(),
        )
        .unwrap();
        handle
            .lock()
            .await
            .load_document("biology.pdf".into(), 1, Arc::new(index), false);
        id
    }

    fn json_request(method: &str, uri: &str, session: Option<Uuid>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id.to_string());
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, session: Option<Uuid>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id.to_string());
        }
        builder.body(Body::empty()).unwrap()
    }

    fn upload_request(session: Uuid, filename: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
        let boundary = "pdf-study-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/session/document")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header(SESSION_HEADER, session.to_string())
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Option<String>, Value) {
        let response = router(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let session = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, session, body)
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state(ScriptedChat::new(vec![]));
        let (status, _, body) = send(&state, get_request("/api/health", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["llm_provider"], "groq");
    }

    #[tokio::test]
    async fn test_missing_session_header_creates_session() {
        let state = test_state(ScriptedChat::new(vec![]));
        let (status, session, body) = send(&state, get_request("/api/session", None)).await;

        assert_eq!(status, StatusCode::OK);
        let id = session.expect("session header echoed");
        assert_eq!(body["id"], id.as_str());
        assert_eq!(body["document"], Value::Null);
        assert_eq!(state.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_known_session_is_reused() {
        let state = test_state(ScriptedChat::new(vec![]));
        let (id, _) = state.sessions.create().await;

        let (_, session, _) = send(&state, get_request("/api/session", Some(id))).await;
        assert_eq!(session, Some(id.to_string()));
        assert_eq!(state.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_ask_without_document_is_rejected() {
        let chat = ScriptedChat::replying("unused");
        let state = test_state(chat.clone());

        let req = json_request("POST", "/api/session/ask", None, json!({"question": "What is ATP?"}));
        let (status, _, body) = send(&state, req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please upload a PDF to get started.");
        assert!(chat.requests().is_empty());
    }

    #[tokio::test]
    async fn test_ask_empty_question_is_rejected() {
        let state = test_state(ScriptedChat::new(vec![]));
        let id = seed_document(&state, &biology_text(50)).await;

        let req = json_request("POST", "/api/session/ask", Some(id), json!({"question": "   "}));
        let (status, _, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ask_with_retrieval_records_history() {
        let chat = ScriptedChat::replying("Mitochondria produce energy.");
        let state = test_state(chat.clone());
        let id = seed_document(&state, &biology_text(1200)).await;

        let req = json_request(
            "POST",
            "/api/session/ask",
            Some(id),
            json!({"question": "What do mitochondria produce?"}),
        );
        let (status, _, body) = send(&state, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "Mitochondria produce energy.");
        assert_eq!(body["mode"], "retrieval");
        assert_eq!(body["sources"].as_array().unwrap().len(), 3);

        let requests = chat.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system, prompts::ASSISTANT_SYSTEM);
        assert_eq!(requests[0].temperature, 0.3);
        assert!(requests[0].prompt.starts_with("Context:\n"));
        assert!(requests[0].prompt.ends_with("Question:\nWhat do mitochondria produce?\n\nAnswer:"));

        let (_, _, history) = send(&state, get_request("/api/session/history", Some(id))).await;
        let history = history.as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["question"], "What do mitochondria produce?");
        assert_eq!(history[0]["answer"], "Mitochondria produce energy.");
    }

    #[tokio::test]
    async fn test_ask_on_empty_document_still_answers() {
        let chat = ScriptedChat::replying("The document has no text.");
        let state = test_state(chat.clone());
        let id = seed_document(&state, "").await;

        let req = json_request("POST", "/api/session/ask", Some(id), json!({"question": "Anything?"}));
        let (status, _, body) = send(&state, req).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["sources"].as_array().unwrap().is_empty());
        assert!(chat.requests()[0].prompt.starts_with("Context:\n\n\nQuestion:"));
    }

    #[tokio::test]
    async fn test_ask_llm_failure_is_surfaced_and_not_recorded() {
        let chat = ScriptedChat::new(vec![Err(LlmError::Request("401 invalid api key".into()))]);
        let state = test_state(chat);
        let id = seed_document(&state, &biology_text(100)).await;

        let req = json_request("POST", "/api/session/ask", Some(id), json!({"question": "Why?"}));
        let (status, _, body) = send(&state, req).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "LLM request failed: 401 invalid api key");

        let (_, _, history) = send(&state, get_request("/api/session/history", Some(id))).await;
        assert!(history.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ask_excerpt_mode_uses_document_opening() {
        let chat = ScriptedChat::replying("It is about cells.");
        let mut state = test_state(chat.clone());
        let mut config = (*state.config).clone();
        config.llm.excerpt_model = Some("llama-3.1-8b-instant".into());
        state.config = Arc::new(config);
        let text = format!("{} UNIQUE_TAIL_MARKER", "a".repeat(4000));
        let id = seed_document(&state, &text).await;

        let req = json_request(
            "POST",
            "/api/session/ask",
            Some(id),
            json!({"question": "Summarise", "mode": "excerpt"}),
        );
        let (status, _, body) = send(&state, req).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["sources"].as_array().unwrap().is_empty());

        let request = &chat.requests()[0];
        assert_eq!(request.system, prompts::PDF_ASSISTANT_SYSTEM);
        assert_eq!(request.temperature, 0.7);
        assert!(request.prompt.contains("PDF Content:"));
        assert!(!request.prompt.contains("UNIQUE_TAIL_MARKER"));
        assert_eq!(request.model.as_deref(), Some("llama-3.1-8b-instant"));
    }

    #[tokio::test]
    async fn test_study_plan() {
        let chat = ScriptedChat::replying("Day 1: read chapter one.");
        let state = test_state(chat.clone());
        let id = seed_document(&state, &biology_text(100)).await;

        let req = json_request("POST", "/api/session/study-plan", Some(id), json!({"available_time": ""}));
        let (status, _, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(chat.requests().is_empty());

        let req = json_request("POST", "/api/session/study-plan", Some(id), json!({"available_time": "3 days"}));
        let (status, _, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plan"], "Day 1: read chapter one.");
        assert!(chat.requests()[0].prompt.contains("Time available: 3 days"));
    }

    #[tokio::test]
    async fn test_quiz_generate_get_and_grade() {
        let chat = ScriptedChat::replying(&format!("```json\n{QUIZ_JSON}\n```"));
        let state = test_state(chat.clone());
        let id = seed_document(&state, &biology_text(200)).await;

        let req = json_request("POST", "/api/session/quiz", Some(id), json!({"count": 2}));
        let (status, _, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["questions"].as_array().unwrap().len(), 2);
        assert!(chat.requests()[0].prompt.starts_with("Generate 2 multiple-choice"));

        let (_, _, stored) = send(&state, get_request("/api/session/quiz", Some(id))).await;
        assert_eq!(stored["questions"][1]["answer"], "B");

        let req = json_request("POST", "/api/session/quiz/grade", Some(id), json!({"answers": ["a", "C"]}));
        let (status, _, grade) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(grade["score"], 1);
        assert_eq!(grade["total"], 2);
    }

    #[tokio::test]
    async fn test_malformed_quiz_leaves_quiz_empty() {
        let chat = ScriptedChat::new(vec![
            Ok(QUIZ_JSON.to_string()),
            Ok("Here are some questions: 1. What is a cell?".to_string()),
        ]);
        let state = test_state(chat);
        let id = seed_document(&state, &biology_text(200)).await;

        let req = json_request("POST", "/api/session/quiz", Some(id), json!({}));
        let (status, _, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);

        let req = json_request("POST", "/api/session/quiz", Some(id), json!({}));
        let (status, _, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().starts_with("invalid-response:"));

        let (_, _, stored) = send(&state, get_request("/api/session/quiz", Some(id))).await;
        assert!(stored["questions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quiz_count_bounds() {
        let chat = ScriptedChat::new(vec![]);
        let state = test_state(chat.clone());
        let id = seed_document(&state, &biology_text(200)).await;

        for count in [0, 21] {
            let req = json_request("POST", "/api/session/quiz", Some(id), json!({"count": count}));
            let (status, _, _) = send(&state, req).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        assert!(chat.requests().is_empty());
    }

    #[tokio::test]
    async fn test_grade_without_quiz_is_rejected() {
        let state = test_state(ScriptedChat::new(vec![]));
        let req = json_request("POST", "/api/session/quiz/grade", None, json!({"answers": []}));
        let (status, _, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_hr_rotation_and_feedback() {
        let chat = ScriptedChat::replying("Be more specific about your impact.");
        let state = test_state(chat.clone());
        let (id, _) = state.sessions.create().await;

        let (_, _, before) = send(&state, get_request("/api/session/hr", Some(id))).await;
        assert_eq!(before["reset_key"], 0);

        let req = json_request("POST", "/api/session/hr/next", Some(id), json!({}));
        let (status, _, after) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(after["reset_key"], 1);
        assert!(after["question_index"].as_u64().unwrap() < 10);

        let req = json_request("POST", "/api/session/hr/feedback", Some(id), json!({"answer": ""}));
        let (status, _, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let req = json_request(
            "POST",
            "/api/session/hr/feedback",
            Some(id),
            json!({"answer": "I led a team of four students."}),
        );
        let (status, _, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["feedback"], "Be more specific about your impact.");

        let request = &chat.requests()[0];
        assert_eq!(request.system, prompts::HR_SYSTEM);
        assert_eq!(request.model.as_deref(), Some("llama-3.3-70b-versatile"));
        assert!(request.prompt.contains("I led a team of four students."));
        assert!(request.prompt.contains(after["question"].as_str().unwrap()));

        let (_, _, stored) = send(&state, get_request("/api/session/hr", Some(id))).await;
        assert_eq!(stored["feedback"], "Be more specific about your impact.");
    }

    #[tokio::test]
    async fn test_hr_questions_list() {
        let state = test_state(ScriptedChat::new(vec![]));
        let (status, _, body) = send(&state, get_request("/api/hr/questions", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_upload_pdf_and_reuse_cached_index() {
        let state = test_state(ScriptedChat::new(vec![]));
        let (id, _) = state.sessions.create().await;
        let pdf = sample_pdf(&["Cells are the basic unit of life", "Mitochondria produce ATP"]);

        let (status, _, body) = send(&state, upload_request(id, "biology.pdf", "application/pdf", &pdf)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "biology.pdf");
        assert_eq!(body["page_count"], 2);
        assert_eq!(body["chunk_count"], 1);
        assert_eq!(body["cached"], false);

        let (status, _, body) = send(&state, upload_request(id, "copy.pdf", "application/pdf", &pdf)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cached"], true);

        let (_, _, doc) = send(&state, get_request("/api/session/document", Some(id))).await;
        assert_eq!(doc["filename"], "copy.pdf");
    }

    #[tokio::test]
    async fn test_cached_index_reports_page_count_of_each_upload() {
        let state = test_state(ScriptedChat::new(vec![]));
        let (id, _) = state.sessions.create().await;
        let two_pages = pdf_from_contents(vec![
            text_page_blocks(&["Osmosis moves water"]),
            text_page_blocks(&["across membranes"]),
        ]);
        let one_page =
            pdf_from_contents(vec![text_page_blocks(&["Osmosis moves water", "across membranes"])]);

        let (_, _, first) =
            send(&state, upload_request(id, "split.pdf", "application/pdf", &two_pages)).await;
        assert_eq!(first["page_count"], 2);
        assert_eq!(first["cached"], false);

        let (status, _, second) =
            send(&state, upload_request(id, "single.pdf", "application/pdf", &one_page)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["cached"], true);
        assert_eq!(second["fingerprint"], first["fingerprint"]);
        assert_eq!(second["page_count"], 1);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf() {
        let state = test_state(ScriptedChat::new(vec![]));
        let (id, _) = state.sessions.create().await;

        let (status, _, body) = send(&state, upload_request(id, "notes.txt", "text/plain", b"hello")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Only PDF files are supported");
    }

    #[tokio::test]
    async fn test_upload_rejects_unreadable_pdf() {
        let state = test_state(ScriptedChat::new(vec![]));
        let (id, _) = state.sessions.create().await;

        let (status, _, body) =
            send(&state, upload_request(id, "broken.pdf", "application/pdf", b"%PDF-garbage")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Could not read PDF"));
    }

    #[tokio::test]
    async fn test_get_document_before_upload() {
        let state = test_state(ScriptedChat::new(vec![]));
        let (status, _, _) = send(&state, get_request("/api/session/document", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let state = test_state(ScriptedChat::new(vec![]));
        let (id, _) = state.sessions.create().await;

        let req = Request::builder()
            .method("DELETE")
            .uri("/api/session")
            .header(SESSION_HEADER, id.to_string())
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&state, req).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.sessions.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_unknown_session_is_not_found() {
        let state = test_state(ScriptedChat::new(vec![]));

        let req = Request::builder()
            .method("DELETE")
            .uri("/api/session")
            .header(SESSION_HEADER, Uuid::new_v4().to_string())
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(&state, req).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Session not found");
        assert!(state.sessions.is_empty().await);
    }
}
