//! WebSocket adapters for real-time client notifications.
//!
//! This module pushes domain events to connected clients and keeps the
//! registry of live connections.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Event Bus                                    │
//! │                      InMemoryEventBus                                │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ subscribes
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    NotificationBridge                                │
//! │   - Subscribes to task, employee and chat events                    │
//! │   - Maps EventEnvelope → OutboundMessage                            │
//! │   - Routes by tenant or user scope                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ send_to_tenant / send_to_user
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      ConnectionHub                                   │
//! │   by_id            by_user              by_tenant                   │
//! │   conn-a → queue   alice → conn-a       acme → {conn-a, conn-b}     │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ bounded queue per connection
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      ClientSession                                   │
//! │   read pump (ping → pong)      write pump (queue + heartbeat)       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - Client message protocol types
//! - [`hub`] - Connection registry and routing
//! - [`session`] - Per-connection read/write pumps
//! - [`handler`] - Axum WebSocket upgrade handler
//! - [`event_bridge`] - Bridge between event bus and hub

pub mod event_bridge;
pub mod handler;
pub mod hub;
pub mod messages;
pub mod session;

pub use event_bridge::{NotificationBridge, ROUTED_EVENT_TYPES};
pub use handler::{websocket_router, ws_handler, ConnectParams, WebSocketState};
pub use hub::{ClientConnection, ConnectionHub, ConnectionId, OutboundReceiver};
pub use messages::{ClientMessage, MessageType, NotificationPayload, OutboundMessage};
pub use session::{ClientSession, SessionSettings};
