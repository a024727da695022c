//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for publishing domain events
//! - `EventSubscriber` - Port for subscribing to domain events
//! - `EventHandler` - Handler that processes incoming events
//!
//! ## Persistence Ports
//!
//! - `AgentDirectory` - Employee agents and their skill cards
//! - `TaskStore` - Task persistence and pending-task queries
//!
//! ## Client Ports
//!
//! - `FrameSink` / `FrameStream` - Framed transport to one live client

mod agent_directory;
mod client_transport;
mod event_publisher;
mod event_subscriber;
mod task_store;

pub use agent_directory::AgentDirectory;
pub use client_transport::{Frame, FrameSink, FrameStream, TransportError};
pub use event_publisher::EventPublisher;
pub use event_subscriber::{
    EventBus, EventHandler, EventSubscriber, Subscription, SubscriptionId, SubscriptionScope,
};
pub use task_store::TaskStore;
