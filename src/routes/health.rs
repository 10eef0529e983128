use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub llm_provider: String,
    pub embedding_dimension: usize,
    pub active_sessions: usize,
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/health", tag = "Health", responses((status = 200, body = HealthResponse))))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        llm_provider: state.config.llm.provider.clone(),
        embedding_dimension: state.embedder.dimension(),
        active_sessions: state.sessions.len().await,
    })
}
