//! Notification bridge connecting domain events to live clients.
//!
//! Subscribes to the client-relevant domain events and forwards each one to
//! the connections in its scope.
//!
//! # Event Flow
//!
//! ```text
//! Domain Event Published
//!          │
//!          ▼
//! ┌──────────────────────┐
//! │ NotificationBridge   │
//! │  receives event      │
//! └──────────────────────┘
//!          │
//!          ▼
//! ┌──────────────────────┐
//! │  Map to client       │
//! │  message type        │
//! └──────────────────────┘
//!          │
//!          ▼
//! ┌──────────────────────┐
//! │  Route by scope:     │
//! │  tenant or user      │
//! └──────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::foundation::{
    DomainError, ErrorCode, EventEnvelope, EventType, TenantId, UserId,
};
use crate::ports::{EventHandler, EventSubscriber, Subscription};

use super::hub::ConnectionHub;
use super::messages::{MessageType, OutboundMessage};

/// Event types forwarded to connected clients.
pub const ROUTED_EVENT_TYPES: &[EventType] = &[
    EventType::TaskCreated,
    EventType::TaskAssigned,
    EventType::TaskStarted,
    EventType::TaskCompleted,
    EventType::TaskFailed,
    EventType::TaskProgress,
    EventType::EmployeeOnline,
    EventType::EmployeeOffline,
    EventType::EmployeeBusy,
    EventType::EmployeeIdle,
    EventType::ChatMessage,
    EventType::ChatResponse,
];

/// Who an event is primarily meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audience {
    Tenant,
    User,
}

/// Client message type and audience for a domain event, if it is forwarded.
fn route(event_type: EventType) -> Option<(MessageType, Audience)> {
    let routed = match event_type {
        EventType::TaskCreated => (MessageType::TaskCreated, Audience::Tenant),
        EventType::TaskAssigned
        | EventType::TaskStarted
        | EventType::TaskFailed
        | EventType::TaskProgress => (MessageType::TaskUpdate, Audience::Tenant),
        EventType::TaskCompleted => (MessageType::TaskCompleted, Audience::Tenant),
        EventType::EmployeeOnline => (MessageType::EmployeeOnline, Audience::Tenant),
        EventType::EmployeeOffline => (MessageType::EmployeeOffline, Audience::Tenant),
        EventType::EmployeeBusy | EventType::EmployeeIdle => {
            (MessageType::EmployeeUpdate, Audience::Tenant)
        }
        EventType::ChatMessage => (MessageType::ChatMessage, Audience::User),
        EventType::ChatResponse => (MessageType::ChatResponse, Audience::User),
        _ => return None,
    };
    Some(routed)
}

/// Bridge between the event bus and the connection hub.
///
/// Implements `EventHandler`; one instance is subscribed once per routed
/// event type.
pub struct NotificationBridge {
    hub: Arc<ConnectionHub>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl NotificationBridge {
    pub fn new(hub: Arc<ConnectionHub>) -> Self {
        Self {
            hub,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Create as an Arc (for sharing with the event subscriber).
    pub fn new_shared(hub: Arc<ConnectionHub>) -> Arc<Self> {
        Arc::new(Self::new(hub))
    }

    /// Subscribe to every routed event type. Start the bridge once.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let bridge = NotificationBridge::new_shared(hub.clone());
    /// bridge.start(&*event_bus);
    /// ```
    pub fn start(self: &Arc<Self>, subscriber: &dyn EventSubscriber) {
        let handler: Arc<dyn EventHandler> = self.clone();
        let mut subscriptions = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for event_type in ROUTED_EVENT_TYPES {
            subscriptions.push(subscriber.subscribe(*event_type, Arc::clone(&handler)));
        }
        info!(count = subscriptions.len(), "Notification bridge subscribed");
    }

    /// Remove every subscription made by `start`.
    pub fn stop(&self, subscriber: &dyn EventSubscriber) {
        let subscriptions: Vec<_> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for subscription in &subscriptions {
            subscriber.unsubscribe(subscription);
        }
        info!(count = subscriptions.len(), "Notification bridge unsubscribed");
    }

    /// Send a `notification` message to one user.
    pub fn notify_user<T: Serialize>(&self, user_id: &UserId, payload: &T) -> Result<(), DomainError> {
        let message = Self::notification(payload)?;
        self.hub.send_to_user(user_id, message);
        Ok(())
    }

    /// Send a `notification` message to every connection of a tenant.
    pub fn notify_tenant<T: Serialize>(
        &self,
        tenant_id: &TenantId,
        payload: &T,
    ) -> Result<(), DomainError> {
        let message = Self::notification(payload)?;
        self.hub.send_to_tenant(tenant_id, message);
        Ok(())
    }

    /// Queue a `notification` message for every connection.
    pub fn broadcast_notification<T: Serialize>(&self, payload: &T) -> Result<(), DomainError> {
        let message = Self::notification(payload)?;
        self.hub.broadcast(message);
        Ok(())
    }

    fn notification<T: Serialize>(payload: &T) -> Result<OutboundMessage, DomainError> {
        OutboundMessage::notification(payload).map_err(|e| {
            DomainError::new(
                ErrorCode::SerializationFailed,
                format!("Failed to serialize notification: {}", e),
            )
        })
    }

    fn deliver_to_tenant(&self, tenant_id: &TenantId, message: OutboundMessage) {
        let delivered = self.hub.send_to_tenant(tenant_id, message);
        debug!(tenant_id = %tenant_id, delivered, "Forwarded event to tenant");
    }

    fn deliver_to_user(&self, user_id: &UserId, message: OutboundMessage) {
        let delivered = self.hub.send_to_user(user_id, message);
        debug!(user_id = %user_id, delivered, "Forwarded event to user");
    }
}

#[async_trait]
impl EventHandler for NotificationBridge {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let Some((message_type, audience)) = route(event.event_type) else {
            return Ok(());
        };
        let message = OutboundMessage::new(message_type, event.payload);
        let scope = event.scope;

        match (audience, scope.tenant_id, scope.user_id) {
            (Audience::Tenant, Some(tenant_id), _) => self.deliver_to_tenant(&tenant_id, message),
            (Audience::User, _, Some(user_id)) => self.deliver_to_user(&user_id, message),
            (Audience::Tenant, None, Some(user_id)) => self.deliver_to_user(&user_id, message),
            (Audience::User, Some(tenant_id), None) => self.deliver_to_tenant(&tenant_id, message),
            (_, None, None) => {
                debug!(event_type = %event.event_type, "Event has no scope, not forwarded");
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "NotificationBridge"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::websocket::hub::{ClientConnection, OutboundReceiver};
    use crate::adapters::websocket::messages::NotificationPayload;
    use crate::ports::EventPublisher;
    use serde_json::json;

    fn tenant(s: &str) -> TenantId {
        TenantId::new(s).unwrap()
    }

    fn user(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn connect(hub: &ConnectionHub, user_id: &str, tenant_id: Option<&str>) -> OutboundReceiver {
        let (conn, rx) = ClientConnection::new(user(user_id), tenant_id.map(tenant), 8);
        hub.register(conn);
        rx
    }

    #[test]
    fn routing_table_covers_every_routed_type() {
        for event_type in ROUTED_EVENT_TYPES {
            assert!(route(*event_type).is_some(), "{} is not routed", event_type);
        }
        assert!(route(EventType::SkillCardCreated).is_none());
        assert!(route(EventType::TaskCancelled).is_none());
    }

    #[test]
    fn lifecycle_events_map_to_client_types() {
        assert_eq!(
            route(EventType::TaskAssigned),
            Some((MessageType::TaskUpdate, Audience::Tenant))
        );
        assert_eq!(
            route(EventType::EmployeeIdle),
            Some((MessageType::EmployeeUpdate, Audience::Tenant))
        );
        assert_eq!(
            route(EventType::ChatResponse),
            Some((MessageType::ChatResponse, Audience::User))
        );
    }

    #[tokio::test]
    async fn tenant_event_reaches_only_that_tenant() {
        let hub = Arc::new(ConnectionHub::new(8));
        let bridge = NotificationBridge::new(hub.clone());
        let mut acme = connect(&hub, "u-1", Some("acme"));
        let mut globex = connect(&hub, "u-2", Some("globex"));

        let event = EventEnvelope::new(EventType::TaskCreated, "test", json!({"task_id": "t-1"}))
            .with_tenant(tenant("acme"));
        bridge.handle(event).await.unwrap();

        let received = acme.try_recv().unwrap();
        assert_eq!(received.message_type, MessageType::TaskCreated);
        assert_eq!(received.payload["task_id"], "t-1");
        assert!(globex.try_recv().is_err());
    }

    #[tokio::test]
    async fn chat_event_goes_to_the_user() {
        let hub = Arc::new(ConnectionHub::new(8));
        let bridge = NotificationBridge::new(hub.clone());
        let mut alice = connect(&hub, "alice", Some("acme"));
        let mut bob = connect(&hub, "bob", Some("acme"));

        let event = EventEnvelope::new(EventType::ChatResponse, "chat", json!({"text": "hi"}))
            .with_tenant(tenant("acme"))
            .with_user(user("alice"));
        bridge.handle(event).await.unwrap();

        assert_eq!(alice.try_recv().unwrap().message_type, MessageType::ChatResponse);
        assert!(bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn tenant_event_without_tenant_falls_back_to_user() {
        let hub = Arc::new(ConnectionHub::new(8));
        let bridge = NotificationBridge::new(hub.clone());
        let mut alice = connect(&hub, "alice", None);

        let event = EventEnvelope::new(EventType::TaskCompleted, "test", json!({}))
            .with_user(user("alice"));
        bridge.handle(event).await.unwrap();

        assert_eq!(alice.try_recv().unwrap().message_type, MessageType::TaskCompleted);
    }

    #[tokio::test]
    async fn unscoped_event_is_not_forwarded() {
        let hub = Arc::new(ConnectionHub::new(8));
        let bridge = NotificationBridge::new(hub.clone());
        let mut alice = connect(&hub, "alice", Some("acme"));

        let event = EventEnvelope::new(EventType::TaskCreated, "test", json!({}));
        bridge.handle(event).await.unwrap();

        assert!(alice.try_recv().is_err());
    }

    #[tokio::test]
    async fn start_and_stop_manage_bus_subscriptions() {
        let bus = InMemoryEventBus::new();
        let hub = Arc::new(ConnectionHub::new(8));
        let bridge = NotificationBridge::new_shared(hub.clone());
        let mut rx = connect(&hub, "u-1", Some("acme"));

        bridge.start(&bus);
        assert_eq!(bus.subscription_count(), ROUTED_EVENT_TYPES.len());

        let event = EventEnvelope::new(EventType::EmployeeBusy, "scheduler", json!({}))
            .with_tenant(tenant("acme"));
        bus.publish_sync(event).await.unwrap();
        assert_eq!(rx.try_recv().unwrap().message_type, MessageType::EmployeeUpdate);

        bridge.stop(&bus);
        assert_eq!(bus.subscription_count(), 0);
    }

    #[tokio::test]
    async fn notify_helpers_send_notification_messages() {
        let hub = Arc::new(ConnectionHub::new(8));
        let bridge = NotificationBridge::new(hub.clone());
        let mut rx = connect(&hub, "u-1", Some("acme"));
        let payload = NotificationPayload::new("Heads up", "Deploy at noon");

        bridge.notify_user(&user("u-1"), &payload).unwrap();
        bridge.notify_tenant(&tenant("acme"), &payload).unwrap();

        for _ in 0..2 {
            let message = rx.try_recv().unwrap();
            assert_eq!(message.message_type, MessageType::Notification);
            assert_eq!(message.payload["title"], "Heads up");
        }
    }

    #[tokio::test]
    async fn unserializable_notification_is_reported() {
        struct Broken;
        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("nope"))
            }
        }

        let hub = Arc::new(ConnectionHub::new(8));
        let bridge = NotificationBridge::new(hub);

        let err = bridge.broadcast_notification(&Broken).unwrap_err();
        assert_eq!(err.code, ErrorCode::SerializationFailed);
    }
}
