//! In-process event bus with bounded history.
//!
//! One `RwLock` guards the subscription map and the history ring. Publishing
//! takes the write lock only to stamp, record and snapshot matching handlers;
//! handlers always run after the lock is released, so a slow handler never
//! stalls `subscribe`, `unsubscribe` or unrelated publishes.
//!
//! - `publish` spawns one task per handler and returns immediately.
//! - `publish_sync` runs all matching handlers concurrently and waits for
//!   them, then reports the first failure.
//!
//! Panics inside handlers are caught per handler and never reach the bus.

use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope, EventType};
use crate::ports::{
    EventHandler, EventPublisher, EventSubscriber, Subscription, SubscriptionId,
    SubscriptionScope,
};

/// Default number of events retained in history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

struct Registered {
    id: SubscriptionId,
    handler: Arc<dyn EventHandler>,
}

#[derive(Default)]
struct BusState {
    subscriptions: HashMap<SubscriptionScope, Vec<Registered>>,
    history: VecDeque<EventEnvelope>,
}

impl BusState {
    /// Type-specific handlers followed by wildcard handlers.
    fn matching(&self, event_type: EventType) -> Vec<Arc<dyn EventHandler>> {
        [SubscriptionScope::Specific(event_type), SubscriptionScope::All]
            .iter()
            .filter_map(|scope| self.subscriptions.get(scope))
            .flatten()
            .map(|r| Arc::clone(&r.handler))
            .collect()
    }
}

/// In-process publish/subscribe registry.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// let sub = bus.subscribe(EventType::TaskCreated, handler);
///
/// bus.publish(envelope).await?;
///
/// assert_eq!(bus.get_history(0).len(), 1);
/// bus.unsubscribe(&sub);
/// ```
pub struct InMemoryEventBus {
    state: RwLock<BusState>,
    history_capacity: usize,
}

impl InMemoryEventBus {
    /// Creates an empty bus retaining the last 1000 events.
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates an empty bus retaining the last `capacity` events.
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::new(BusState::default()),
            history_capacity: capacity,
        }
    }

    /// Most recent `limit` events in publish order; `0` returns everything retained.
    pub fn get_history(&self, limit: usize) -> Vec<EventEnvelope> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let skip = if limit == 0 {
            0
        } else {
            state.history.len().saturating_sub(limit)
        };
        state.history.iter().skip(skip).cloned().collect()
    }

    /// Most recent `limit` events of one type, in publish order; `0` means all.
    pub fn get_history_by_type(&self, event_type: EventType, limit: usize) -> Vec<EventEnvelope> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let take = if limit == 0 { usize::MAX } else { limit };
        let mut newest_first: Vec<EventEnvelope> = state
            .history
            .iter()
            .rev()
            .filter(|e| e.event_type == event_type)
            .take(take)
            .cloned()
            .collect();
        newest_first.reverse();
        newest_first
    }

    /// Number of events currently retained.
    pub fn history_len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .len()
    }

    /// Number of live subscriptions across all scopes.
    pub fn subscription_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .subscriptions
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Stamps the event, appends it to history and snapshots its handlers.
    fn record(&self, mut event: EventEnvelope) -> (EventEnvelope, Vec<Arc<dyn EventHandler>>) {
        event.stamp();

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.history.push_back(event.clone());
        while state.history.len() > self.history_capacity {
            state.history.pop_front();
        }
        let handlers = state.matching(event.event_type);

        (event, handlers)
    }

    fn add(&self, scope: SubscriptionScope, handler: Arc<dyn EventHandler>) -> Subscription {
        let id = SubscriptionId::new();
        debug!(subscription_id = %id, scope = %scope, handler = handler.name(), "Subscribing handler");

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state
            .subscriptions
            .entry(scope)
            .or_default()
            .push(Registered { id, handler });

        Subscription { id, scope }
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one handler, converting a panic into a `HandlerFailed` error.
async fn run_isolated(
    handler: Arc<dyn EventHandler>,
    event: EventEnvelope,
) -> Result<(), DomainError> {
    match AssertUnwindSafe(handler.handle(event)).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(DomainError::new(
            ErrorCode::HandlerFailed,
            format!("handler {} panicked", handler.name()),
        )
        .with_detail("handler", handler.name())),
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let (event, handlers) = self.record(event);
        debug!(
            event_type = %event.event_type,
            handlers = handlers.len(),
            "Publishing event"
        );

        for handler in handlers {
            let event = event.clone();
            tokio::spawn(async move {
                let name = handler.name();
                let event_type = event.event_type;
                if let Err(e) = run_isolated(handler, event).await {
                    warn!(handler = name, event_type = %event_type, error = %e, "Event handler failed");
                }
            });
        }

        Ok(())
    }

    async fn publish_sync(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let (event, handlers) = self.record(event);
        debug!(
            event_type = %event.event_type,
            handlers = handlers.len(),
            "Publishing event synchronously"
        );

        let results = join_all(
            handlers
                .into_iter()
                .map(|handler| run_isolated(handler, event.clone())),
        )
        .await;

        match results.into_iter().find_map(Result::err) {
            Some(err) => {
                warn!(event_type = %event.event_type, error = %err, "Event handler failed");
                Err(err)
            }
            None => Ok(()),
        }
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, event_type: EventType, handler: Arc<dyn EventHandler>) -> Subscription {
        self.add(SubscriptionScope::Specific(event_type), handler)
    }

    fn subscribe_all(&self, handler: Arc<dyn EventHandler>) -> Subscription {
        self.add(SubscriptionScope::All, handler)
    }

    fn unsubscribe(&self, subscription: &Subscription) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(registered) = state.subscriptions.get_mut(&subscription.scope) {
            registered.retain(|r| r.id != subscription.id);
            if registered.is_empty() {
                state.subscriptions.remove(&subscription.scope);
            }
        }
    }
}
