//! Change events and their push encoding

use serde::Serialize;

use crate::types::{Notification, NotificationId, UserId};

/// Immutable description of a committed notification mutation
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeEvent {
    /// A notification was created for one user
    Created(Notification),

    /// A notification's read flag changed
    Updated(Notification),

    /// A notification was deleted
    Deleted { id: NotificationId, owner: UserId },

    /// An administrator sent a notification to every user
    Announced(Notification),
}

impl ChangeEvent {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Created(_) => "created",
            ChangeEvent::Updated(_) => "updated",
            ChangeEvent::Deleted { .. } => "deleted",
            ChangeEvent::Announced(_) => "announced",
        }
    }

    /// The user this event belongs to, or `None` for an all-users announcement
    pub fn owner(&self) -> Option<&str> {
        match self {
            ChangeEvent::Created(n) | ChangeEvent::Updated(n) => Some(&n.user_id),
            ChangeEvent::Deleted { owner, .. } => Some(owner),
            ChangeEvent::Announced(_) => None,
        }
    }

    /// Encode as the JSON text frame pushed to subscribers
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(&PushMessage::from(self))
    }
}

/// Wire shape of one push frame
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum PushMessage<'a> {
    #[serde(rename = "notification")]
    Notification { notification: &'a Notification },

    #[serde(rename = "newNotification")]
    NewNotification { notification: &'a Notification },

    #[serde(rename = "deletion")]
    Deletion { id: &'a str },
}

impl<'a> From<&'a ChangeEvent> for PushMessage<'a> {
    fn from(event: &'a ChangeEvent) -> Self {
        match event {
            ChangeEvent::Created(notification) | ChangeEvent::Updated(notification) => {
                PushMessage::Notification { notification }
            }
            ChangeEvent::Announced(notification) => PushMessage::NewNotification { notification },
            ChangeEvent::Deleted { id, .. } => PushMessage::Deletion { id },
        }
    }
}
