//! Account endpoints

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::api::error::ApiError;
use crate::api::session::{cleared_cookie, session_cookie, session_token};
use crate::api::state::AppState;
use crate::types::{Role, User};

/// Body of register and login requests
#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// User plus the session key, for clients that cannot rely on cookies
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

fn open_session(state: &AppState, status: StatusCode, user: User) -> impl IntoResponse {
    let token = state.sessions.create(&user.id);
    let cookie = session_cookie(&token, state.sessions.ttl_seconds());
    tracing::info!(user_id = %user.id, username = %user.username, "session opened");
    (
        status,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse { user, token }),
    )
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(credentials) = body?;

    // bcrypt is CPU-bound
    let worker = state.clone();
    let user = tokio::task::spawn_blocking(move || {
        worker.auth.register(
            &worker.store,
            &credentials.username,
            &credentials.password,
            Role::User,
        )
    })
    .await??;

    Ok(open_session(&state, StatusCode::CREATED, user))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(credentials) = body?;
    if credentials.username.trim().is_empty() || credentials.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let worker = state.clone();
    let user = tokio::task::spawn_blocking(move || {
        worker
            .auth
            .authenticate(&worker.store, &credentials.username, &credentials.password)
    })
    .await??;

    Ok(open_session(&state, StatusCode::OK, user))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        state.sessions.destroy(&token);
    }
    (
        [(header::SET_COOKIE, cleared_cookie())],
        Json(MessageResponse::new("Logged out successfully")),
    )
}
