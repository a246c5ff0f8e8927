//! Subscriber handles
//!
//! A [`Subscriber`] stands for one live push connection. Writing to it means
//! enqueuing an encoded frame into its bounded outbound queue; a single
//! writer task per connection drains that queue into the socket, so frames
//! for one connection are never interleaved.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::SendTimeoutError};

use crate::types::UserId;

/// One encoded push frame, shared by every recipient of a broadcast
pub type Frame = Arc<str>;

/// Identity of a push connection, unique for the lifetime of a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why a frame could not be handed to a subscriber
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("subscriber transport is closed")]
    Closed,
    #[error("subscriber did not accept the frame within {0:?}")]
    TimedOut(Duration),
}

/// Handle for one live push connection
pub struct Subscriber {
    id: ConnectionId,
    user_id: Option<UserId>,
    outbound: Mutex<Option<mpsc::Sender<Frame>>>,
}

impl Subscriber {
    /// Create a handle and the receiving end of its outbound queue
    pub fn new(
        id: ConnectionId,
        user_id: Option<UserId>,
        queue_capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let subscriber = Arc::new(Self {
            id,
            user_id,
            outbound: Mutex::new(Some(tx)),
        });
        (subscriber, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Authenticated user behind this connection, if any
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Enqueue one frame, waiting at most `timeout` for queue space
    pub async fn deliver(&self, frame: Frame, timeout: Duration) -> Result<(), DeliveryError> {
        // Clone the sender out so the lock is not held across the await
        let tx = self.outbound.lock().clone().ok_or(DeliveryError::Closed)?;

        tx.send_timeout(frame, timeout).await.map_err(|e| match e {
            SendTimeoutError::Timeout(_) => DeliveryError::TimedOut(timeout),
            SendTimeoutError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Close the outbound side. Returns true only for the call that closed it.
    ///
    /// The writer task sees the end of the queue once in-flight deliveries
    /// finish, sends a close frame and shuts the socket down.
    pub fn close(&self) -> bool {
        self.outbound.lock().take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.lock().as_ref().map_or(true, |tx| tx.is_closed())
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
