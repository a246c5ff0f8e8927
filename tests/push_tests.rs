//! Push hub tests: registry properties, broadcast scenarios and connection
//! lifecycle, driven through in-memory channels instead of sockets.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use chrono::Utc;
use futures::channel::mpsc as fmpsc;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use notify_hub::push::{
    BroadcastHub, ChangeEvent, Connection, ConnectionRegistry, ConnectionState, Frame, HubConfig,
    LifecycleConfig, PushScope, Subscriber,
};
use notify_hub::types::{Category, Notification};

fn hub() -> BroadcastHub {
    BroadcastHub::new(
        Arc::new(ConnectionRegistry::new()),
        HubConfig {
            send_timeout: Duration::from_millis(100),
            scope: PushScope::All,
        },
    )
}

fn register(registry: &ConnectionRegistry) -> (Arc<Subscriber>, mpsc::Receiver<Frame>) {
    let (subscriber, rx) = Subscriber::new(registry.next_connection_id(), None, 16);
    assert!(registry.add(subscriber.clone()));
    (subscriber, rx)
}

fn notification(id: &str, title: &str) -> Notification {
    Notification {
        id: id.to_string(),
        title: title.to_string(),
        message: "body".to_string(),
        category: Category::Info,
        read: false,
        timestamp: Utc::now(),
        user_id: "u1".to_string(),
    }
}

fn parse(frame: &str) -> Value {
    serde_json::from_str(frame).unwrap()
}

async fn wait_until<F: Fn() -> bool>(condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[test]
fn test_repeated_add_registers_once() {
    let registry = ConnectionRegistry::new();
    let (h, _rx) = Subscriber::new(registry.next_connection_id(), None, 4);
    for _ in 0..10 {
        registry.add(h.clone());
    }
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_repeated_remove_is_harmless() {
    let registry = ConnectionRegistry::new();
    let (h, _rx) = register(&registry);
    for _ in 0..10 {
        registry.remove(h.id());
        registry.evict(&h);
    }
    assert!(!registry.contains(h.id()));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_broadcast_reaches_every_live_subscriber() {
    let hub = hub();
    let mut queues: Vec<_> = (0..10).map(|_| register(hub.registry()).1).collect();

    let event = ChangeEvent::Created(notification("x", "T"));
    let expected = event.encode().unwrap();
    let report = hub.broadcast(event).await;

    assert_eq!(report.delivered, 10);
    assert_eq!(report.evicted, 0);
    for rx in queues.iter_mut() {
        assert_eq!(rx.recv().await.as_deref(), Some(expected.as_str()));
        assert!(rx.try_recv().is_err());
    }
}

#[tokio::test]
async fn test_closed_subscriber_is_evicted() {
    let hub = hub();
    let (h, rx) = register(hub.registry());
    drop(rx);

    let report = hub
        .broadcast(ChangeEvent::Deleted {
            id: "x".to_string(),
            owner: "u1".to_string(),
        })
        .await;

    assert_eq!(report.evicted, 1);
    assert!(!hub.registry().contains(h.id()));
    assert!(h.is_closed());
    // Closing again is a no-op
    assert!(!h.close());
}

#[tokio::test]
async fn test_created_event_reaches_both_subscribers() {
    let hub = hub();
    let (_h1, mut rx1) = register(hub.registry());
    let (_h2, mut rx2) = register(hub.registry());

    hub.on_notification_created(notification("x", "T")).await;

    for rx in [&mut rx1, &mut rx2] {
        let frame = parse(&rx.recv().await.unwrap());
        assert_eq!(frame["type"], "notification");
        assert_eq!(frame["notification"]["_id"], "x");
        assert_eq!(frame["notification"]["title"], "T");
        assert_eq!(frame["notification"]["read"], false);
    }
}

#[tokio::test]
async fn test_deletion_skips_closed_subscriber() {
    let hub = hub();
    let (_h1, mut rx1) = register(hub.registry());
    let (h2, rx2) = register(hub.registry());
    let (_h3, mut rx3) = register(hub.registry());

    // h2's transport goes away out of band
    drop(rx2);

    let report = hub
        .on_notification_deleted("x".to_string(), "u1".to_string())
        .await;

    assert_eq!(report.delivered, 2);
    assert_eq!(report.evicted, 1);
    for rx in [&mut rx1, &mut rx3] {
        assert_eq!(parse(&rx.recv().await.unwrap()), json!({"type": "deletion", "id": "x"}));
    }
    assert!(!hub.registry().contains(h2.id()));
    assert_eq!(hub.registry().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_remove_broadcast() {
    let hub = Arc::new(hub());
    let adds = Arc::new(AtomicUsize::new(0));
    let removes = Arc::new(AtomicUsize::new(0));
    let mut tasks = Vec::new();

    for worker in 0..8 {
        let hub = hub.clone();
        let adds = adds.clone();
        let removes = removes.clone();
        tasks.push(tokio::spawn(async move {
            let mut kept = Vec::new();
            for i in 0..50 {
                let (h, mut rx) =
                    Subscriber::new(hub.registry().next_connection_id(), None, 64);
                if hub.registry().add(h.clone()) {
                    adds.fetch_add(1, Ordering::SeqCst);
                }
                if (i + worker) % 3 == 0 {
                    if hub.registry().remove(h.id()).is_some() {
                        removes.fetch_add(1, Ordering::SeqCst);
                    }
                    // A second removal must be a no-op
                    assert!(hub.registry().remove(h.id()).is_none());
                } else {
                    // Keep draining so the queue never fills
                    tokio::spawn(async move { while rx.recv().await.is_some() {} });
                    kept.push(h);
                }
                hub.on_notification_deleted(format!("n{}", i), "u1".to_string())
                    .await;
            }
            kept
        }));
    }

    let mut kept = 0;
    for task in tasks {
        kept += task.await.unwrap().len();
    }

    let added = adds.load(Ordering::SeqCst);
    let removed = removes.load(Ordering::SeqCst);
    assert_eq!(added, 8 * 50);
    assert!(hub.registry().len() <= added - removed);
    assert_eq!(hub.registry().len(), kept);
}

#[tokio::test]
async fn test_lifecycle_registers_pushes_and_removes() {
    let hub = Arc::new(hub());
    let registry = hub.registry().clone();
    let connection = Connection::accept(registry.clone(), Some("u1".to_string()), LifecycleConfig::default());
    let id = connection.id();

    let (sink, mut written) = fmpsc::unbounded::<Message>();
    let (inbound, stream) = fmpsc::unbounded::<Result<Message, Infallible>>();
    let served = tokio::spawn(connection.run(sink, stream));

    wait_until(|| registry.contains(id)).await;
    hub.on_notification_created(notification("x", "T")).await;

    match written.next().await {
        Some(Message::Text(text)) => assert_eq!(parse(&text)["type"], "notification"),
        other => panic!("unexpected frame: {:?}", other),
    }

    // Remote end goes away
    drop(inbound);
    assert_eq!(served.await.unwrap(), ConnectionState::Removed);
    assert!(!registry.contains(id));
    assert_eq!(written.next().await, Some(Message::Close(None)));
}

#[tokio::test]
async fn test_lifecycle_ends_when_broadcast_evicts() {
    let hub = Arc::new(hub());
    let registry = hub.registry().clone();
    let connection = Connection::accept(registry.clone(), None, LifecycleConfig::default());
    let id = connection.id();

    let (sink, written) = fmpsc::unbounded::<Message>();
    let (_inbound, stream) = fmpsc::unbounded::<Result<Message, Infallible>>();
    let served = tokio::spawn(connection.run(sink, stream));
    wait_until(|| registry.contains(id)).await;

    // The socket breaks: the writer's next write fails and evicts the handle
    drop(written);
    let report = hub.on_notification_created(notification("x", "T")).await;
    // The frame is queued before the writer finds the socket broken
    assert_eq!(report.delivered, 1);
    assert_eq!(report.evicted, 0);

    let state = tokio::time::timeout(Duration::from_secs(2), served)
        .await
        .expect("connection did not terminate")
        .unwrap();
    assert_eq!(state, ConnectionState::Removed);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_shutdown_closes_all_connections() {
    let hub = Arc::new(hub());
    let registry = hub.registry().clone();
    let mut served = Vec::new();
    let mut inbound = Vec::new();

    for _ in 0..3 {
        let connection = Connection::accept(registry.clone(), None, LifecycleConfig::default());
        let (sink, _) = fmpsc::unbounded::<Message>();
        let (tx, stream) = fmpsc::unbounded::<Result<Message, Infallible>>();
        inbound.push(tx);
        served.push(tokio::spawn(connection.run(sink, stream)));
    }
    wait_until(|| registry.len() == 3).await;

    assert_eq!(registry.close_all(), 3);
    for task in served {
        let state = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("connection did not terminate")
            .unwrap();
        assert_eq!(state, ConnectionState::Removed);
    }
}
