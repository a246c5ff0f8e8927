//! Shared application state

use std::sync::Arc;

use crate::auth::{Authenticator, SessionStore};
use crate::config::ServerConfig;
use crate::push::{BroadcastHub, ConnectionRegistry, LifecycleConfig};
use crate::store::DocumentStore;

/// State shared by every handler
pub struct AppState {
    pub store: DocumentStore,
    pub sessions: SessionStore,
    pub auth: Authenticator,
    /// Push hub; owns the connection registry
    pub hub: BroadcastHub,
    pub lifecycle: LifecycleConfig,
    pub frontend_url: Option<String>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        Self {
            store: DocumentStore::new(),
            sessions: SessionStore::new(config.session_ttl_seconds),
            auth: Authenticator::new(config.bcrypt_cost),
            hub: BroadcastHub::new(registry, config.hub.clone()),
            lifecycle: config.lifecycle.clone(),
            frontend_url: config.frontend_url.clone(),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        self.hub.registry()
    }
}
