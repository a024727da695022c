//! Integration tests for the notification pipeline.
//!
//! These tests verify the end-to-end flow:
//! 1. The scheduler assigns a task and publishes domain events
//! 2. The event bus fans them out to the notification bridge
//! 3. The bridge routes client messages through the connection hub
//! 4. A client session writes them to the client transport as JSON frames
//!
//! Uses in-memory adapters and channel-backed transports, no sockets.

use futures::channel::mpsc as fmpsc;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use unlimited_corp::adapters::events::InMemoryEventBus;
use unlimited_corp::adapters::storage::{InMemoryAgentDirectory, InMemoryTaskStore};
use unlimited_corp::adapters::websocket::{
    ClientConnection, ClientSession, ConnectionHub, NotificationBridge, NotificationPayload,
    SessionSettings,
};
use unlimited_corp::application::TaskScheduler;
use unlimited_corp::domain::agent::Agent;
use unlimited_corp::domain::foundation::{EventEnvelope, EventType, TenantId, UserId};
use unlimited_corp::domain::task::{Task, TaskPriority};
use unlimited_corp::ports::{EventPublisher, Frame, TransportError};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Client {
    to_server: fmpsc::UnboundedSender<Result<Frame, TransportError>>,
    from_server: fmpsc::UnboundedReceiver<Frame>,
    session: JoinHandle<()>,
}

impl Client {
    /// Next JSON text frame, skipping heartbeats. `None` on timeout or close.
    async fn next_message(&mut self) -> Option<Value> {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(2), self.from_server.next())
                .await
                .ok()
                .flatten()?;
            match frame {
                Frame::Text(text) => return Some(serde_json::from_str(&text).unwrap()),
                Frame::Ping(_) | Frame::Pong(_) => continue,
                _ => return None,
            }
        }
    }

    /// True if nothing arrives within a short window.
    async fn stays_quiet(&mut self) -> bool {
        tokio::time::timeout(Duration::from_millis(150), self.from_server.next())
            .await
            .is_err()
    }
}

struct Pipeline {
    bus: Arc<InMemoryEventBus>,
    hub: Arc<ConnectionHub>,
    bridge: Arc<NotificationBridge>,
}

impl Pipeline {
    fn new() -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let hub = Arc::new(ConnectionHub::new(16));
        let bridge = NotificationBridge::new_shared(hub.clone());
        bridge.start(&*bus);
        Self { bus, hub, bridge }
    }

    fn connect(&self, user: &str, tenant: Option<&str>) -> Client {
        let settings = SessionSettings {
            write_timeout: Duration::from_millis(500),
            pong_wait: Duration::from_secs(10),
            ping_period: Duration::from_secs(5),
            max_message_bytes: 4096,
            send_queue_capacity: 16,
        };
        let (conn, outbound) = ClientConnection::new(
            UserId::new(user).unwrap(),
            tenant.map(|t| TenantId::new(t).unwrap()),
            settings.send_queue_capacity,
        );
        let id = self.hub.register(conn);

        let (to_server, inbound) = fmpsc::unbounded();
        let (outgoing, from_server) = fmpsc::unbounded();
        let sink = outgoing.sink_map_err(|_| TransportError::Closed);

        let session = ClientSession::new(self.hub.clone(), id, settings);
        let session = tokio::spawn(session.run(sink, inbound, outbound));

        Client {
            to_server,
            from_server,
            session,
        }
    }
}

fn acme() -> TenantId {
    TenantId::new("acme").unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn assignment_reaches_every_client_of_the_tenant() {
    let pipeline = Pipeline::new();
    let mut alice = pipeline.connect("alice", Some("acme"));
    let mut bob = pipeline.connect("bob", Some("acme"));
    let mut outsider = pipeline.connect("eve", Some("globex"));

    let agents = Arc::new(InMemoryAgentDirectory::new());
    let tasks = Arc::new(InMemoryTaskStore::new());
    let agent = Agent::new(acme(), "Ada").unwrap();
    agents.insert(agent.clone()).await;
    let mut task = Task::new(acme(), "Draft launch email", TaskPriority::Urgent).unwrap();
    tasks.insert(task.clone()).await;

    let scheduler = TaskScheduler::new(agents, tasks, pipeline.bus.clone());
    assert!(scheduler.schedule(&mut task).await.unwrap().is_assigned());

    for client in [&mut alice, &mut bob] {
        let mut types = Vec::new();
        for _ in 0..2 {
            let message = client.next_message().await.expect("missing message");
            types.push(message["type"].as_str().unwrap().to_string());
            if message["type"] == "task.update" {
                assert_eq!(message["payload"]["task_id"], json!(task.id()));
                assert_eq!(message["payload"]["agent_id"], json!(agent.id()));
            }
        }
        types.sort();
        assert_eq!(types, vec!["employee.update", "task.update"]);
    }

    assert!(outsider.stays_quiet().await);
}

#[tokio::test]
async fn chat_reply_reaches_only_its_user() {
    let pipeline = Pipeline::new();
    let mut alice = pipeline.connect("alice", Some("acme"));
    let mut bob = pipeline.connect("bob", Some("acme"));

    let event = EventEnvelope::new(EventType::ChatResponse, "chat", json!({"text": "Done!"}))
        .with_tenant(acme())
        .with_user(UserId::new("alice").unwrap());
    pipeline.bus.publish_sync(event).await.unwrap();

    let message = alice.next_message().await.expect("missing chat message");
    assert_eq!(message["type"], "chat.response");
    assert_eq!(message["payload"]["text"], "Done!");
    assert!(message["id"].is_string());
    assert!(bob.stays_quiet().await);
}

#[tokio::test]
async fn client_ping_and_broadcast_share_the_queue() {
    let pipeline = Pipeline::new();
    let _hub_loop = pipeline.hub.start();
    let mut alice = pipeline.connect("alice", None);

    alice
        .to_server
        .send(Ok(Frame::Text(r#"{"type":"ping"}"#.to_string())))
        .await
        .unwrap();
    assert_eq!(alice.next_message().await.unwrap()["type"], "pong");

    pipeline
        .bridge
        .broadcast_notification(&NotificationPayload::new("Maintenance", "Back in 5"))
        .unwrap();
    let message = alice.next_message().await.unwrap();
    assert_eq!(message["type"], "notification");
    assert_eq!(message["payload"]["title"], "Maintenance");

    pipeline.hub.stop();
}

#[tokio::test]
async fn disconnect_unregisters_and_later_events_are_harmless() {
    let pipeline = Pipeline::new();
    let alice = pipeline.connect("alice", Some("acme"));
    assert_eq!(pipeline.hub.tenant_online_count(&acme()), 1);

    alice.to_server.close_channel();
    tokio::time::timeout(Duration::from_secs(2), alice.session)
        .await
        .expect("session did not end")
        .unwrap();
    assert_eq!(pipeline.hub.online_count(), 0);

    let event = EventEnvelope::new(EventType::TaskCompleted, "worker", json!({}))
        .with_tenant(acme());
    pipeline.bus.publish_sync(event).await.unwrap();
    assert_eq!(pipeline.bus.history_len(), 1);
}

#[tokio::test]
async fn stopped_bridge_forwards_nothing() {
    let pipeline = Pipeline::new();
    let mut alice = pipeline.connect("alice", Some("acme"));
    pipeline.bridge.stop(&*pipeline.bus);

    let event = EventEnvelope::new(EventType::TaskCreated, "api", json!({"title": "x"}))
        .with_tenant(acme());
    pipeline.bus.publish_sync(event).await.unwrap();

    assert!(alice.stays_quiet().await);
}
