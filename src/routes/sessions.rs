use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::dto::session::SessionResponse;
use crate::errors::AppError;
use crate::middleware::session::{SESSION_HEADER, SessionContext};
use crate::state::AppState;

/// Starts a fresh session regardless of any `x-session-id` the caller sends.
#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/sessions", tag = "Sessions", responses((status = 200, body = SessionResponse))))]
pub async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let (_, handle) = state.sessions.create().await;
    let session = handle.lock().await;
    Json(SessionResponse::from(&*session))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/session", tag = "Sessions", responses((status = 200, body = SessionResponse))))]
pub async fn get_session(ctx: SessionContext) -> Json<SessionResponse> {
    let session = ctx.session.lock().await;
    Json(SessionResponse::from(&*session))
}

/// Mounted outside the session middleware so an unknown id is reported, not recreated.
#[cfg_attr(feature = "openapi", utoipa::path(delete, path = "/api/session", tag = "Sessions", responses((status = 204), (status = 404, body = crate::errors::ErrorResponse))))]
pub async fn delete_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    if !state.sessions.remove(&id).await {
        return Err(AppError::NotFound("Session not found".to_string()));
    }
    tracing::info!("Session {id} deleted");
    Ok(StatusCode::NO_CONTENT)
}
