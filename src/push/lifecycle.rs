//! Subscriber lifecycle
//!
//! Drives one push connection through
//! `Connecting -> Registered -> Reading -> Closing -> Removed`:
//!
//! - the subscriber is registered before anything is read,
//! - a writer task drains the subscriber's queue into the socket, each write
//!   bounded by a timeout,
//! - the read loop only watches for liveness; inbound payloads are ignored,
//! - whichever side notices the failure first (read loop, writer task or a
//!   broadcast) evicts the subscriber; the others are no-ops.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::registry::ConnectionRegistry;
use super::subscriber::{ConnectionId, Frame, Subscriber};
use crate::types::UserId;

/// Connection states, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConnectionState {
    Connecting,
    Registered,
    Reading,
    Closing,
    Removed,
}

/// Per-connection settings
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Outbound queue capacity per subscriber
    pub queue_capacity: usize,
    /// Longest a single socket write may take
    pub write_timeout: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            write_timeout: Duration::from_millis(5000),
        }
    }
}

/// Socket write failures seen by the writer task
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("write timed out after {0:?}")]
    TimedOut(Duration),
    #[error("transport error: {0}")]
    Transport(String),
}

/// One push connection being served
pub struct Connection {
    registry: Arc<ConnectionRegistry>,
    subscriber: Arc<Subscriber>,
    queue: Option<mpsc::Receiver<Frame>>,
    config: LifecycleConfig,
    state: ConnectionState,
}

impl Connection {
    /// Build the handle for a freshly accepted connection
    pub fn accept(
        registry: Arc<ConnectionRegistry>,
        user_id: Option<UserId>,
        config: LifecycleConfig,
    ) -> Self {
        let id = registry.next_connection_id();
        let (subscriber, queue) = Subscriber::new(id, user_id, config.queue_capacity);
        Self {
            registry,
            subscriber,
            queue: Some(queue),
            config,
            state: ConnectionState::Connecting,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.subscriber.id()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn transition(&mut self, next: ConnectionState) {
        trace!(connection_id = %self.id(), from = ?self.state, to = ?next, "connection state");
        self.state = next;
    }

    /// Serve the connection until either side closes it.
    ///
    /// `sink` and `stream` are the two halves of the socket. Returns once the
    /// subscriber has been removed from the registry.
    pub async fn run<S, R, E>(mut self, sink: S, mut stream: R) -> ConnectionState
    where
        S: Sink<Message> + Unpin + Send + 'static,
        S::Error: Display + Send,
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        let Some(queue) = self.queue.take() else {
            return self.state;
        };

        self.registry.add(self.subscriber.clone());
        self.transition(ConnectionState::Registered);
        debug!(
            connection_id = %self.id(),
            user_id = self.subscriber.user_id().unwrap_or("anonymous"),
            subscribers = self.registry.len(),
            "push subscriber registered"
        );

        let mut writer = tokio::spawn(write_loop(
            queue,
            sink,
            self.config.write_timeout,
            self.registry.clone(),
            self.subscriber.clone(),
        ));
        let mut writer_done = false;

        self.transition(ConnectionState::Reading);
        loop {
            tokio::select! {
                inbound = stream.next() => match inbound {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => trace!(connection_id = %self.id(), "ignoring inbound frame"),
                    Some(Err(e)) => {
                        debug!(connection_id = %self.id(), error = %e, "push connection read failed");
                        break;
                    }
                },
                _ = &mut writer => {
                    writer_done = true;
                    break;
                }
            }
        }

        self.transition(ConnectionState::Closing);
        self.registry.evict(&self.subscriber);

        if !writer_done {
            // The writer exits once the queue drains; a stuck socket write is cut off
            if tokio::time::timeout(self.config.write_timeout, &mut writer).await.is_err() {
                writer.abort();
            }
        }

        self.transition(ConnectionState::Removed);
        debug!(
            connection_id = %self.id(),
            subscribers = self.registry.len(),
            "push subscriber removed"
        );
        self.state
    }
}

/// Writer task: forward queued frames to the socket, then close it.
///
/// A failed or timed-out write evicts the subscriber, which ends the
/// connection's read loop.
async fn write_loop<S>(
    queue: mpsc::Receiver<Frame>,
    mut sink: S,
    write_timeout: Duration,
    registry: Arc<ConnectionRegistry>,
    subscriber: Arc<Subscriber>,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display + Send,
{
    match pump(queue, &mut sink, write_timeout).await {
        Ok(()) => {
            let _ = tokio::time::timeout(write_timeout, sink.send(Message::Close(None))).await;
            let _ = tokio::time::timeout(write_timeout, sink.close()).await;
        }
        Err(e) => {
            warn!(connection_id = %subscriber.id(), error = %e, "push write failed, evicting subscriber");
            registry.evict(&subscriber);
        }
    }
}

/// Forward frames from `queue` into `sink` until the queue ends
pub async fn pump<S>(
    mut queue: mpsc::Receiver<Frame>,
    sink: &mut S,
    write_timeout: Duration,
) -> Result<(), WriteError>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(frame) = queue.recv().await {
        match tokio::time::timeout(write_timeout, sink.send(Message::Text(frame.to_string()))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(WriteError::Transport(e.to_string())),
            Err(_) => return Err(WriteError::TimedOut(write_timeout)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures::channel::mpsc as fmpsc;

    use super::*;

    const SHORT: Duration = Duration::from_millis(100);

    #[tokio::test]
    async fn test_pump_forwards_frames_in_order() {
        let (tx, rx) = mpsc::channel(4);
        let (mut sink, mut written) = fmpsc::unbounded::<Message>();

        tx.send(Frame::from("one")).await.unwrap();
        tx.send(Frame::from("two")).await.unwrap();
        drop(tx);

        pump(rx, &mut sink, SHORT).await.unwrap();
        assert_eq!(written.next().await, Some(Message::Text("one".to_string())));
        assert_eq!(written.next().await, Some(Message::Text("two".to_string())));
    }

    #[tokio::test]
    async fn test_pump_reports_broken_transport() {
        let (tx, rx) = mpsc::channel(4);
        let (mut sink, written) = fmpsc::unbounded::<Message>();
        drop(written);

        tx.send(Frame::from("lost")).await.unwrap();
        let result = pump(rx, &mut sink, SHORT).await;
        assert!(matches!(result, Err(WriteError::Transport(_))));
    }

    #[tokio::test]
    async fn test_pump_times_out_on_stalled_transport() {
        let (tx, rx) = mpsc::channel(4);
        // Bounded channel with nobody reading: the second send never completes
        let (mut sink, _written) = fmpsc::channel::<Message>(0);

        tx.send(Frame::from("a")).await.unwrap();
        tx.send(Frame::from("b")).await.unwrap();
        tx.send(Frame::from("c")).await.unwrap();
        let result = pump(rx, &mut sink, SHORT).await;
        assert!(matches!(result, Err(WriteError::TimedOut(_))));
    }

    #[tokio::test]
    async fn test_connection_starts_connecting() {
        let registry = Arc::new(ConnectionRegistry::new());
        let conn = Connection::accept(registry.clone(), None, LifecycleConfig::default());
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_remote_close_removes_subscriber() {
        let registry = Arc::new(ConnectionRegistry::new());
        let conn = Connection::accept(registry.clone(), None, LifecycleConfig::default());
        let id = conn.id();

        let (sink, mut written) = fmpsc::unbounded::<Message>();
        let (inbound, stream) = fmpsc::unbounded::<Result<Message, Infallible>>();
        inbound.unbounded_send(Ok(Message::Text("hi".to_string()))).unwrap();
        inbound.unbounded_send(Ok(Message::Close(None))).unwrap();

        let state = conn.run(sink, stream).await;
        assert_eq!(state, ConnectionState::Removed);
        assert!(!registry.contains(id));

        // Inbound text is not echoed; only the closing frame is written
        assert_eq!(written.next().await, Some(Message::Close(None)));
    }
}
