//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `events` - In-process event bus
//! - `storage` - In-memory agent directory and task store
//! - `websocket` - Live client connections and notification routing

pub mod events;
pub mod storage;
pub mod websocket;

pub use events::InMemoryEventBus;
pub use storage::{InMemoryAgentDirectory, InMemoryTaskStore};
pub use websocket::{ConnectionHub, NotificationBridge};
