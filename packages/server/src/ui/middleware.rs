//! Session cookie interceptor.
//!
//! Runs on every request, the upgrade request included. A request that
//! arrives without a valid `SESSION` cookie gets a fresh identity, and the
//! response carries it back in `Set-Cookie` so the client presents the same
//! identity on every later request and reconnect.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use kotatsu_shared::protocol::{SESSION_COOKIE, session_from_cookie_header};

use crate::domain::SessionId;

use super::state::AppState;

pub async fn session_interceptor(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !state.issue_sessions {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(session_from_cookie_header)
        .map(str::to_owned);

    let binding = state.identity_store.bind_or_create(presented.as_deref());
    let minted = binding.is_minted();
    let session_id = binding.into_session_id();
    request.extensions_mut().insert(session_id.clone());

    let mut response = next.run(request).await;

    if minted {
        match HeaderValue::from_str(&set_cookie_value(&session_id)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
                tracing::debug!("Issued new session '{}'", session_id);
            }
            Err(e) => tracing::warn!("Failed to encode session cookie: {}", e),
        }
    }

    response
}

fn set_cookie_value(session_id: &SessionId) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        session_id.as_str()
    )
}
