//! Real-time push delivery
//!
//! Tracks live push connections and delivers notification change events to
//! them.
//!
//! - `registry`: the set of live subscribers
//! - `hub`: fans one change event out to every registered subscriber
//! - `lifecycle`: per-connection register / read / remove loop
//! - `subscriber`: the handle for one connection and its outbound queue
//! - `events`: change events and their wire encoding

pub mod events;
pub mod hub;
pub mod lifecycle;
pub mod registry;
pub mod subscriber;

pub use events::{ChangeEvent, PushMessage};
pub use hub::{BroadcastHub, BroadcastReport, HubConfig, PushScope};
pub use lifecycle::{Connection, ConnectionState, LifecycleConfig};
pub use registry::ConnectionRegistry;
pub use subscriber::{ConnectionId, DeliveryError, Frame, Subscriber};
