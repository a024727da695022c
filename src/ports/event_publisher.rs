//! EventPublisher port - Interface for publishing domain events.
//!
//! This port defines how producers (the scheduler, chat, workflow activities)
//! announce state changes without knowing who listens.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
///
/// Implementations must ensure:
/// - A missing event id or timestamp is assigned at publish time
/// - `publish` returns without waiting for handlers; handler failures never
///   reach the caller
/// - `publish_sync` waits for every matching handler and returns the first
///   handler error, after all of them have run
///
/// # Example
///
/// ```ignore
/// let event = EventEnvelope::new(EventType::TaskCreated, "api", payload)
///     .with_tenant(tenant_id);
/// publisher.publish(event).await?;
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event, fire-and-forget with respect to handlers.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish an event and wait for every matching handler to finish.
    async fn publish_sync(&self, event: EventEnvelope) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn EventPublisher) {}

    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn event_publisher_is_send_sync() {
        #[allow(dead_code)]
        fn check<T: EventPublisher>() {
            assert_send_sync::<T>();
        }
    }
}
