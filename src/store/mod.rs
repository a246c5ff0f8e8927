//! Document store - in-memory notification and user collections
//!
//! The store owns every persisted record. Each collection sits behind its own
//! lock and every operation holds the lock only for the duration of the
//! collection update.

mod notifications;
mod users;

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;

use crate::types::{Notification, NotificationId, User, UserId};

/// Errors raised by store operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Username already exists")]
    UsernameTaken,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// In-memory document store
pub struct DocumentStore {
    pub(crate) notifications: RwLock<HashMap<NotificationId, Notification>>,
    pub(crate) users: RwLock<HashMap<UserId, User>>,
}

impl DocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            notifications: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored notifications across all users
    pub fn notification_count(&self) -> usize {
        self.notifications.read().len()
    }

    /// Number of registered users
    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

// Notification and user operations live in their own files
impl DocumentStore {
    pub fn insert_notification(&self, notification: Notification) -> Notification {
        notifications::insert(self, notification)
    }

    pub fn list_for_user(&self, user_id: &str) -> Vec<Notification> {
        notifications::list_for_user(self, user_id)
    }

    pub fn set_read(&self, id: &str, owner: &str, read: bool) -> Option<Notification> {
        notifications::set_read(self, id, owner, read)
    }

    pub fn delete_notification(&self, id: &str, owner: &str) -> Option<Notification> {
        notifications::delete(self, id, owner)
    }

    pub fn insert_for_all_users(&self, template: &Notification) -> Vec<Notification> {
        notifications::insert_for_all_users(self, template)
    }

    pub fn create_user(&self, user: User) -> StoreResult<User> {
        users::create(self, user)
    }

    pub fn find_user(&self, id: &str) -> Option<User> {
        users::find(self, id)
    }

    pub fn find_user_by_name(&self, username: &str) -> Option<User> {
        users::find_by_name(self, username)
    }

    pub fn user_ids(&self) -> Vec<UserId> {
        users::ids(self)
    }
}
