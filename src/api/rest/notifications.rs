//! Notification endpoints
//!
//! Every successful mutation is committed to the store first and then handed
//! to the push hub as exactly one change event. Failed mutations push nothing.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::MessageResponse;
use crate::api::error::ApiError;
use crate::api::session::AuthUser;
use crate::api::state::AppState;
use crate::types::{is_valid_id, Notification, NotificationDraft};

/// Body of PATCH /api/notifications/:id
#[derive(Debug, Deserialize)]
pub struct MarkRequest {
    pub read: bool,
}

fn checked_id(id: &str) -> Result<(), ApiError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Invalid notification ID"))
    }
}

fn checked_draft(body: Result<Json<NotificationDraft>, JsonRejection>) -> Result<NotificationDraft, ApiError> {
    let Json(draft) = body?;
    draft.validate().map_err(ApiError::bad_request)?;
    Ok(draft)
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
) -> Json<Vec<Notification>> {
    Json(state.store.list_for_user(&caller.user.id))
}

/// POST /api/notifications
pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    body: Result<Json<NotificationDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = checked_draft(body)?;

    let mut notification = Notification::from_draft(draft);
    notification.user_id = caller.user.id;
    let saved = state.store.insert_notification(notification);

    state.hub.on_notification_created(saved.clone()).await;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// PATCH /api/notifications/:id
pub async fn mark_notification(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<MarkRequest>, JsonRejection>,
) -> Result<Json<Notification>, ApiError> {
    checked_id(&id)?;
    let Json(request) = body?;

    let updated = state
        .store
        .set_read(&id, &caller.user.id, request.read)
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;

    state.hub.on_notification_updated(updated.clone()).await;
    Ok(Json(updated))
}

/// DELETE /api/notifications/:id
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    checked_id(&id)?;

    let removed = state
        .store
        .delete_notification(&id, &caller.user.id)
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;

    state
        .hub
        .on_notification_deleted(removed.id, removed.user_id)
        .await;
    Ok(Json(MessageResponse::new("Notification deleted")))
}

/// POST /api/notifications/sendToAll
pub async fn send_to_all(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    body: Result<Json<NotificationDraft>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !caller.user.is_admin() {
        return Err(ApiError::forbidden());
    }
    let draft = checked_draft(body)?;

    let template = Notification::from_draft(draft);
    let copies = state.store.insert_for_all_users(&template);
    tracing::info!(
        admin = %caller.user.username,
        recipients = copies.len(),
        "notification sent to all users"
    );

    state.hub.on_notification_announced(template).await;
    Ok(Json(MessageResponse::new("Notification sent to all users")))
}
