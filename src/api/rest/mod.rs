//! REST API module for HTTP endpoints
//!
//! - `POST /api/auth/register` - Create an account and open a session
//! - `POST /api/auth/login` - Open a session
//! - `POST /api/auth/logout` - Close the current session
//! - `GET /api/notifications` - The caller's notifications, newest first
//! - `POST /api/notifications` - Create a notification
//! - `PATCH /api/notifications/:id` - Mark read or unread
//! - `DELETE /api/notifications/:id` - Delete a notification
//! - `POST /api/notifications/sendToAll` - Admin fan-out to every user

pub mod auth;
pub mod notifications;

use serde::Serialize;

/// Plain `{"message": ...}` response body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}
