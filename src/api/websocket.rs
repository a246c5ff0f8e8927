//! WebSocket push endpoint

use std::sync::Arc;

use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures::StreamExt;
use serde::Deserialize;

use super::session::session_token;
use super::state::AppState;
use crate::auth::SessionStore;
use crate::push::Connection;
use crate::types::UserId;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Optional session key for clients that cannot send the cookie
    pub token: Option<String>,
}

/// GET /ws - WebSocket upgrade handler.
///
/// The endpoint does not require a session; when one is presented the
/// connection is tagged with its user.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let user_id = connection_user(params.token, &headers, &state.sessions);
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

/// Resolve the user behind a push connection.
///
/// `?token=` wins over the `Authorization` header and the session cookie.
/// Unknown or expired sessions leave the connection anonymous.
pub fn connection_user(
    query_token: Option<String>,
    headers: &HeaderMap,
    sessions: &SessionStore,
) -> Option<UserId> {
    query_token
        .filter(|token| !token.is_empty())
        .or_else(|| session_token(headers))
        .and_then(|token| sessions.resolve(&token))
}

/// Serve one push connection until it closes
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: Option<UserId>) {
    let connection = Connection::accept(state.registry().clone(), user_id, state.lifecycle.clone());
    let (sink, stream) = socket.split();
    connection.run(sink, stream).await;
}
