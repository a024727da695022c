//! WebSocket message types for real-time client notifications.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: `{id, type, payload, timestamp}` envelopes
//! - Client → Server: `{type, ...}` frames, of which only `ping` is acted on

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::Timestamp;

// ============================================
// Server → Client Messages
// ============================================

/// Fixed set of outbound message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "task.update")]
    TaskUpdate,
    #[serde(rename = "task.created")]
    TaskCreated,
    #[serde(rename = "task.completed")]
    TaskCompleted,
    #[serde(rename = "employee.update")]
    EmployeeUpdate,
    #[serde(rename = "employee.online")]
    EmployeeOnline,
    #[serde(rename = "employee.offline")]
    EmployeeOffline,
    #[serde(rename = "chat.message")]
    ChatMessage,
    #[serde(rename = "chat.response")]
    ChatResponse,
    #[serde(rename = "notification")]
    Notification,
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "pong")]
    Pong,
}

/// Envelope delivered to clients.
///
/// Built once per routing call and shared between recipients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    pub timestamp: Timestamp,
}

impl OutboundMessage {
    /// New message with a fresh id and the current time.
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message_type,
            payload,
            timestamp: Timestamp::now(),
        }
    }

    /// Liveness reply to a client `ping`.
    pub fn pong() -> Self {
        Self::new(MessageType::Pong, serde_json::Value::Null)
    }

    /// Generic notification wrapping any serializable payload.
    pub fn notification<T: Serialize>(payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            MessageType::Notification,
            serde_json::to_value(payload)?,
        ))
    }

    /// Serialize to the JSON text sent on the wire.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Conventional payload for `notification` messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub message: String,
    #[serde(default = "NotificationPayload::default_level")]
    pub level: String,
}

impl NotificationPayload {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level: Self::default_level(),
        }
    }

    fn default_level() -> String {
        "info".to_string()
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat request; answered with `pong`.
    Ping,

    /// Heartbeat reply to a server `ping` message.
    Pong,

    /// Anything else a client sends; ignored.
    #[serde(other)]
    Other,
}
