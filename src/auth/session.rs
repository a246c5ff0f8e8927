//! Keyed session store

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use crate::types::UserId;

/// An open session
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Session store keyed by an unguessable session id
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Session lifetime in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Open a session for `user_id` and return its key
    pub fn create(&self, user_id: &str) -> String {
        let session_id = format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple());
        let session = Session {
            user_id: user_id.to_string(),
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.write().insert(session_id.clone(), session);
        session_id
    }

    /// Resolve a session key to its user; expired sessions are dropped
    pub fn resolve(&self, session_id: &str) -> Option<UserId> {
        {
            let sessions = self.sessions.read();
            match sessions.get(session_id) {
                Some(session) if !session.is_expired() => return Some(session.user_id.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.sessions.write().remove(session_id);
        None
    }

    /// Close a session; unknown keys are ignored
    pub fn destroy(&self, session_id: &str) {
        self.sessions.write().remove(session_id);
    }

    /// Drop every expired session, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        before - sessions.len()
    }

    /// Get active session count
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}
