//! User collection operations

use crate::types::{User, UserId};

use super::{DocumentStore, StoreError, StoreResult};

/// Register a user; usernames are unique
pub fn create(store: &DocumentStore, user: User) -> StoreResult<User> {
    let mut users = store.users.write();
    if users.values().any(|u| u.username == user.username) {
        return Err(StoreError::UsernameTaken);
    }
    users.insert(user.id.clone(), user.clone());
    Ok(user)
}

pub fn find(store: &DocumentStore, id: &str) -> Option<User> {
    store.users.read().get(id).cloned()
}

pub fn find_by_name(store: &DocumentStore, username: &str) -> Option<User> {
    store
        .users
        .read()
        .values()
        .find(|u| u.username == username)
        .cloned()
}

pub fn ids(store: &DocumentStore) -> Vec<UserId> {
    store.users.read().keys().cloned().collect()
}
