//! Notification records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_empty, NotificationId, UserId};

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Info,
    Alert,
    Message,
}

/// A personal notification owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", default, skip_serializing_if = "is_empty")]
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub category: Category,
    #[serde(default)]
    pub read: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "userId", default, skip_serializing_if = "is_empty")]
    pub user_id: UserId,
}

impl Notification {
    /// Build an unread, unsaved notification from a draft.
    ///
    /// `id` and `user_id` stay empty until the store assigns them.
    pub fn from_draft(draft: NotificationDraft) -> Self {
        Self {
            id: NotificationId::new(),
            title: draft.title,
            message: draft.message,
            category: draft.category,
            read: false,
            timestamp: Utc::now(),
            user_id: UserId::new(),
        }
    }
}

/// Client-supplied fields of a new notification
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub category: Category,
}

impl NotificationDraft {
    /// Validate required fields, returning a user-facing message on failure
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("Title is required");
        }
        if self.message.trim().is_empty() {
            return Err("Message is required");
        }
        Ok(())
    }
}
