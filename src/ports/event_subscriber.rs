//! EventSubscriber port - Interface for subscribing to domain events.
//!
//! Handlers register interest either in one concrete `EventType` or in every
//! event (`SubscriptionScope::All`). Wildcard subscribers receive each event
//! in addition to the type-specific ones.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, EventEnvelope, EventType};

/// Handler for processing domain events.
///
/// Implementations should be:
/// - **Quick** - the bus may run many handlers per publish concurrently
/// - **Isolated** - errors and panics don't affect other handlers
///
/// # Example
///
/// ```ignore
/// struct AuditLog { /* ... */ }
///
/// #[async_trait]
/// impl EventHandler for AuditLog {
///     async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
///         // append to audit trail...
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "AuditLog"
///     }
/// }
/// ```
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Process an event.
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// What a subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionScope {
    Specific(EventType),
    All,
}

impl fmt::Display for SubscriptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionScope::Specific(t) => write!(f, "{}", t),
            SubscriptionScope::All => write!(f, "*"),
        }
    }
}

/// Unique identifier of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receipt returned by `subscribe`; hand it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub scope: SubscriptionScope,
}

/// Port for subscribing to domain events.
///
/// # Example
///
/// ```ignore
/// let sub = subscriber.subscribe(EventType::TaskCreated, notifier);
/// let audit = subscriber.subscribe_all(audit_log);
/// subscriber.unsubscribe(&sub);
/// ```
pub trait EventSubscriber: Send + Sync {
    /// Subscribe handler to one concrete event type. Never fails.
    fn subscribe(&self, event_type: EventType, handler: Arc<dyn EventHandler>) -> Subscription;

    /// Subscribe handler to every event type.
    fn subscribe_all(&self, handler: Arc<dyn EventHandler>) -> Subscription;

    /// Remove a subscription. Unknown or already removed subscriptions are ignored.
    fn unsubscribe(&self, subscription: &Subscription);
}

/// Combined trait for event bus implementations.
///
/// An EventBus provides both publishing and subscribing capabilities.
pub trait EventBus: super::EventPublisher + EventSubscriber {}

// Blanket implementation - any type that implements both traits is an EventBus
impl<T: super::EventPublisher + EventSubscriber> EventBus for T {}
