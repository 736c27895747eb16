//! WebSocket connection handler.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{State, ws::WebSocketUpgrade},
    response::IntoResponse,
};
use futures_util::stream::StreamExt;

use crate::{
    domain::SessionId,
    ui::{session::SessionCoordinator, state::AppState},
};

/// Upgrade and hand the socket to a [`SessionCoordinator`].
///
/// The identity is whatever the session interceptor bound for this request;
/// when there is none the coordinator closes the socket right after the
/// upgrade.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    identity: Option<Extension<SessionId>>,
) -> impl IntoResponse {
    let identity = identity.map(|Extension(id)| id);

    ws.on_upgrade(move |socket| async move {
        let (sender, receiver) = socket.split();
        SessionCoordinator::new(state)
            .run(identity, sender, receiver)
            .await;
    })
}
