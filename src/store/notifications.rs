//! Notification collection operations

use crate::types::{new_id, Notification};

use super::DocumentStore;

/// Insert a notification, assigning a fresh id
pub fn insert(store: &DocumentStore, mut notification: Notification) -> Notification {
    notification.id = new_id();
    store
        .notifications
        .write()
        .insert(notification.id.clone(), notification.clone());
    notification
}

/// All notifications owned by `user_id`, newest first
pub fn list_for_user(store: &DocumentStore, user_id: &str) -> Vec<Notification> {
    let mut owned: Vec<Notification> = store
        .notifications
        .read()
        .values()
        .filter(|n| n.user_id == user_id)
        .cloned()
        .collect();
    owned.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    owned
}

/// Set the read flag on a notification owned by `owner`
pub fn set_read(store: &DocumentStore, id: &str, owner: &str, read: bool) -> Option<Notification> {
    let mut notifications = store.notifications.write();
    let notification = notifications.get_mut(id).filter(|n| n.user_id == owner)?;
    notification.read = read;
    Some(notification.clone())
}

/// Delete a notification owned by `owner`, returning the removed record
pub fn delete(store: &DocumentStore, id: &str, owner: &str) -> Option<Notification> {
    let mut notifications = store.notifications.write();
    if notifications.get(id).is_some_and(|n| n.user_id == owner) {
        notifications.remove(id)
    } else {
        None
    }
}

/// Insert one copy of `template` per registered user
pub fn insert_for_all_users(store: &DocumentStore, template: &Notification) -> Vec<Notification> {
    let user_ids = store.user_ids();
    let mut notifications = store.notifications.write();

    user_ids
        .into_iter()
        .map(|user_id| {
            let copy = Notification {
                id: new_id(),
                user_id,
                ..template.clone()
            };
            notifications.insert(copy.id.clone(), copy.clone());
            copy
        })
        .collect()
}
