//! Broadcast hub
//!
//! Turns committed notification mutations into push frames and fans them out
//! to every registered subscriber. The hub is owned by the application state
//! and handed to request handlers; there is no process-wide instance.
//!
//! # Delivery
//!
//! - Each event is encoded once and shared by every recipient.
//! - The registry is snapshotted under its lock, then frames are enqueued to
//!   all recipients concurrently with the lock released.
//! - A subscriber that is closed or does not accept the frame within the send
//!   timeout is evicted and closed. Nothing is retried.
//! - Per subscriber, frames keep the order in which `broadcast` calls
//!   completed for a single caller.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, error, trace};

use super::events::ChangeEvent;
use super::registry::ConnectionRegistry;
use super::subscriber::{Frame, Subscriber};
use crate::types::Notification;

/// Which subscribers receive an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PushScope {
    /// Every subscriber receives every event
    #[default]
    All,
    /// Events go to the owning user's connections; announcements go to every
    /// authenticated connection
    Owner,
}

impl FromStr for PushScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(PushScope::All),
            "owner" => Ok(PushScope::Owner),
            other => Err(format!("unknown push scope '{}', expected 'all' or 'owner'", other)),
        }
    }
}

/// Hub tuning
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Longest wait for space in one subscriber's queue
    pub send_timeout: Duration,
    pub scope: PushScope,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_millis(2000),
            scope: PushScope::All,
        }
    }
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers the event was addressed to
    pub recipients: usize,
    /// Frames accepted into a subscriber queue.
    ///
    /// Acceptance is not a socket write: a subscriber whose socket already
    /// broke still counts here and stays registered until its writer task
    /// fails the write and evicts it.
    pub delivered: usize,
    /// Subscribers evicted because delivery failed
    pub evicted: usize,
}

/// Fans change events out to registered subscribers
pub struct BroadcastHub {
    registry: Arc<ConnectionRegistry>,
    config: HubConfig,
}

impl BroadcastHub {
    pub fn new(registry: Arc<ConnectionRegistry>, config: HubConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Deliver `event` to every subscriber registered at the time of the call.
    ///
    /// Never fails: delivery errors evict the affected subscriber and are
    /// otherwise only logged.
    pub async fn broadcast(&self, event: ChangeEvent) -> BroadcastReport {
        let frame: Frame = match event.encode() {
            Ok(json) => Frame::from(json),
            Err(e) => {
                error!(kind = event.kind(), error = %e, "failed to encode change event, skipping");
                return BroadcastReport::default();
            }
        };

        let recipients: Vec<Arc<Subscriber>> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|s| self.accepts(s, &event))
            .collect();

        let timeout = self.config.send_timeout;
        let results = join_all(
            recipients
                .iter()
                .map(|subscriber| subscriber.deliver(frame.clone(), timeout)),
        )
        .await;

        let mut report = BroadcastReport {
            recipients: recipients.len(),
            ..Default::default()
        };

        for (subscriber, result) in recipients.iter().zip(results) {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    debug!(
                        connection_id = %subscriber.id(),
                        kind = event.kind(),
                        error = %e,
                        "delivery failed, evicting subscriber"
                    );
                    self.registry.evict(subscriber);
                    report.evicted += 1;
                }
            }
        }

        trace!(
            kind = event.kind(),
            recipients = report.recipients,
            delivered = report.delivered,
            evicted = report.evicted,
            "broadcast complete"
        );
        report
    }

    fn accepts(&self, subscriber: &Subscriber, event: &ChangeEvent) -> bool {
        match self.config.scope {
            PushScope::All => true,
            PushScope::Owner => match (subscriber.user_id(), event.owner()) {
                (Some(user), Some(owner)) => user == owner,
                (Some(_), None) => true,
                (None, _) => false,
            },
        }
    }

    // Entry points for the CRUD layer, one broadcast per committed mutation

    pub async fn on_notification_created(&self, notification: Notification) -> BroadcastReport {
        self.broadcast(ChangeEvent::Created(notification)).await
    }

    pub async fn on_notification_updated(&self, notification: Notification) -> BroadcastReport {
        self.broadcast(ChangeEvent::Updated(notification)).await
    }

    pub async fn on_notification_deleted(&self, id: String, owner: String) -> BroadcastReport {
        self.broadcast(ChangeEvent::Deleted { id, owner }).await
    }

    pub async fn on_notification_announced(&self, notification: Notification) -> BroadcastReport {
        self.broadcast(ChangeEvent::Announced(notification)).await
    }
}
