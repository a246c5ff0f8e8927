//! Data types for the notification service
//!
//! This module contains the records shared by the store, the HTTP API and
//! the push hub.

mod notification;
mod user;

pub use notification::{Category, Notification, NotificationDraft};
pub use user::{Role, User};

/// Identifier of a stored notification (32-char lowercase hex)
pub type NotificationId = String;

/// Identifier of a registered user (32-char lowercase hex)
pub type UserId = String;

/// Generate a fresh record identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Check that a path parameter looks like an identifier produced by [`new_id`]
pub fn is_valid_id(id: &str) -> bool {
    id.len() == 32 && id.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
}

/// Check if string is empty (for skip_serializing_if)
pub fn is_empty(val: &str) -> bool {
    val.is_empty()
}
