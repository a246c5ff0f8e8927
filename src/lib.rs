//! Notify Hub
//!
//! A notification service: authenticated users create, read, update and
//! delete personal notifications, administrators fan a notification out to
//! every user, and every committed change is pushed live to connected
//! WebSocket clients.
//!
//! # Modules
//!
//! - `types`: Core records (Notification, User)
//! - `store`: In-memory document store for notifications and users
//! - `auth`: Password hashing and the keyed session store
//! - `push`: Connection registry, broadcast hub and connection lifecycle
//! - `api`: REST endpoints and the `/ws` push endpoint
//! - `config`: Environment-driven server configuration
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use notify_hub::{create_router, AppState, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::from_env()?;
//!     let state = Arc::new(AppState::new(&config));
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//!     axum::serve(listener, create_router(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod push;
pub mod store;
pub mod types;

// Re-export commonly used items at crate root
pub use api::{create_router, AppState};
pub use config::ServerConfig;
pub use push::{BroadcastHub, ChangeEvent, ConnectionRegistry, PushScope};
pub use store::DocumentStore;
pub use types::{Category, Notification, Role, User};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
