//! HTTP and WebSocket endpoints
//!
//! REST endpoints for accounts and notifications, plus the `/ws` push
//! endpoint that feeds live change events to connected clients.

pub mod error;
pub mod http;
pub mod rest;
pub mod session;
pub mod state;
pub mod websocket;

pub use error::ApiError;
pub use http::create_router;
pub use state::AppState;
