use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::services::session_store::SessionHandle;
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Clone)]
pub struct SessionContext {
    pub id: Uuid,
    pub session: SessionHandle,
}

impl<S: Send + Sync> FromRequestParts<S> for SessionContext {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Resolves the caller's session from `x-session-id`, creating one when the
/// header is missing or names an unknown session, and echoes the id back.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let requested = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok());

    let (id, session, _created) = state.sessions.resolve(requested).await;
    session.lock().await.touch();

    req.extensions_mut().insert(SessionContext { id, session });

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}
