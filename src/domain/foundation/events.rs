//! Event infrastructure for domain event publishing and handling.
//!
//! This module provides the core types for the in-process event pipeline:
//! - `EventType` - Closed catalogue of domain event kinds
//! - `EventId` - Unique identifier for events
//! - `EventScope` - Routing and tracing context (user, tenant, trace)
//! - `EventEnvelope` - Transport wrapper for a published domain event

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{TenantId, Timestamp, UserId, ValidationError};

// ============================================
// EventType
// ============================================

/// Every kind of domain event the pipeline knows about.
///
/// Serialized as its dotted string form (e.g. `"task.created"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "task.created")]
    TaskCreated,
    #[serde(rename = "task.assigned")]
    TaskAssigned,
    #[serde(rename = "task.started")]
    TaskStarted,
    #[serde(rename = "task.completed")]
    TaskCompleted,
    #[serde(rename = "task.failed")]
    TaskFailed,
    #[serde(rename = "task.cancelled")]
    TaskCancelled,
    #[serde(rename = "task.progress")]
    TaskProgress,

    #[serde(rename = "employee.created")]
    EmployeeCreated,
    #[serde(rename = "employee.updated")]
    EmployeeUpdated,
    #[serde(rename = "employee.deleted")]
    EmployeeDeleted,
    #[serde(rename = "employee.online")]
    EmployeeOnline,
    #[serde(rename = "employee.offline")]
    EmployeeOffline,
    #[serde(rename = "employee.busy")]
    EmployeeBusy,
    #[serde(rename = "employee.idle")]
    EmployeeIdle,

    #[serde(rename = "skillcard.created")]
    SkillCardCreated,
    #[serde(rename = "skillcard.updated")]
    SkillCardUpdated,
    #[serde(rename = "skillcard.deleted")]
    SkillCardDeleted,
    #[serde(rename = "skillcard.assigned")]
    SkillCardAssigned,

    #[serde(rename = "workflow.started")]
    WorkflowStarted,
    #[serde(rename = "workflow.completed")]
    WorkflowCompleted,
    #[serde(rename = "workflow.failed")]
    WorkflowFailed,

    #[serde(rename = "chat.message")]
    ChatMessage,
    #[serde(rename = "chat.response")]
    ChatResponse,

    #[serde(rename = "system.notification")]
    SystemNotification,
    #[serde(rename = "system.error")]
    SystemError,
}

impl EventType {
    /// All known event types, in catalogue order.
    pub const ALL: [EventType; 25] = [
        EventType::TaskCreated,
        EventType::TaskAssigned,
        EventType::TaskStarted,
        EventType::TaskCompleted,
        EventType::TaskFailed,
        EventType::TaskCancelled,
        EventType::TaskProgress,
        EventType::EmployeeCreated,
        EventType::EmployeeUpdated,
        EventType::EmployeeDeleted,
        EventType::EmployeeOnline,
        EventType::EmployeeOffline,
        EventType::EmployeeBusy,
        EventType::EmployeeIdle,
        EventType::SkillCardCreated,
        EventType::SkillCardUpdated,
        EventType::SkillCardDeleted,
        EventType::SkillCardAssigned,
        EventType::WorkflowStarted,
        EventType::WorkflowCompleted,
        EventType::WorkflowFailed,
        EventType::ChatMessage,
        EventType::ChatResponse,
        EventType::SystemNotification,
        EventType::SystemError,
    ];

    /// Returns the dotted wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TaskCreated => "task.created",
            EventType::TaskAssigned => "task.assigned",
            EventType::TaskStarted => "task.started",
            EventType::TaskCompleted => "task.completed",
            EventType::TaskFailed => "task.failed",
            EventType::TaskCancelled => "task.cancelled",
            EventType::TaskProgress => "task.progress",
            EventType::EmployeeCreated => "employee.created",
            EventType::EmployeeUpdated => "employee.updated",
            EventType::EmployeeDeleted => "employee.deleted",
            EventType::EmployeeOnline => "employee.online",
            EventType::EmployeeOffline => "employee.offline",
            EventType::EmployeeBusy => "employee.busy",
            EventType::EmployeeIdle => "employee.idle",
            EventType::SkillCardCreated => "skillcard.created",
            EventType::SkillCardUpdated => "skillcard.updated",
            EventType::SkillCardDeleted => "skillcard.deleted",
            EventType::SkillCardAssigned => "skillcard.assigned",
            EventType::WorkflowStarted => "workflow.started",
            EventType::WorkflowCompleted => "workflow.completed",
            EventType::WorkflowFailed => "workflow.failed",
            EventType::ChatMessage => "chat.message",
            EventType::ChatResponse => "chat.response",
            EventType::SystemNotification => "system.notification",
            EventType::SystemError => "system.error",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::invalid_format("event_type", format!("unknown event type '{}'", s)))
    }
}

// ============================================
// EventId
// ============================================

/// Unique identifier for events.
///
/// Uses a String internally so externally supplied ids (UUID, ULID, ...)
/// survive unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a new random EventId using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates an EventId from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================
// EventScope
// ============================================

fn default_version() -> u32 {
    1
}

/// Routing and tracing context carried by every event.
///
/// - `user_id` - Single user the event concerns (chat replies)
/// - `tenant_id` - Company the event belongs to (task and employee changes)
/// - `trace_id` - Distributed tracing identifier
/// - `version` - Payload schema version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventScope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    #[serde(default = "default_version")]
    pub version: u32,
}

impl Default for EventScope {
    fn default() -> Self {
        Self {
            user_id: None,
            tenant_id: None,
            trace_id: None,
            version: default_version(),
        }
    }
}

// ============================================
// EventEnvelope
// ============================================

/// Transport envelope for a domain event.
///
/// `event_id` and `occurred_at` stay `None` until the event bus stamps them
/// at publish time; an id supplied by the producer is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Option<EventId>,
    pub event_type: EventType,
    /// Component that produced the event (e.g. "scheduler").
    pub source: String,
    pub payload: JsonValue,
    pub scope: EventScope,
    pub occurred_at: Option<Timestamp>,
}

impl EventEnvelope {
    /// Creates an unpublished envelope with empty scope.
    pub fn new(event_type: EventType, source: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            event_id: None,
            event_type,
            source: source.into(),
            payload,
            scope: EventScope::default(),
            occurred_at: None,
        }
    }

    /// Creates an envelope by serializing a typed payload.
    pub fn from_payload<T: Serialize>(
        event_type: EventType,
        source: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(event_type, source, serde_json::to_value(payload)?))
    }

    /// Scope the event to a tenant.
    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.scope.tenant_id = Some(tenant_id);
        self
    }

    /// Scope the event to a single user.
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.scope.user_id = Some(user_id);
        self
    }

    /// Add trace ID for distributed tracing.
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.scope.trace_id = Some(id.into());
        self
    }

    /// Use a producer-supplied event id instead of a generated one.
    pub fn with_event_id(mut self, id: EventId) -> Self {
        self.event_id = Some(id);
        self
    }

    /// Fills in identity and timestamp if they are missing.
    pub fn stamp(&mut self) {
        if self.event_id.is_none() {
            self.event_id = Some(EventId::new());
        }
        if self.occurred_at.is_none() {
            self.occurred_at = Some(Timestamp::now());
        }
    }

    /// Deserialize payload to a specific type.
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_type_round_trips_through_its_string_form() {
        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
        }
    }

    #[test]
    fn event_type_serializes_as_dotted_name() {
        let json = serde_json::to_string(&EventType::EmployeeBusy).unwrap();
        assert_eq!(json, r#""employee.busy""#);
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        assert!("task.exploded".parse::<EventType>().is_err());
        assert!("*".parse::<EventType>().is_err());
    }

    #[test]
    fn new_envelope_is_unstamped_with_version_one() {
        let env = EventEnvelope::new(EventType::TaskCreated, "test", json!({}));
        assert!(env.event_id.is_none());
        assert!(env.occurred_at.is_none());
        assert_eq!(env.scope.version, 1);
    }

    #[test]
    fn stamp_keeps_existing_id() {
        let mut env = EventEnvelope::new(EventType::TaskCreated, "test", json!({}))
            .with_event_id(EventId::from_string("evt-1"));
        env.stamp();
        assert_eq!(env.event_id.unwrap().as_str(), "evt-1");
        assert!(env.occurred_at.is_some());
    }

    #[test]
    fn builders_fill_scope() {
        let env = EventEnvelope::new(EventType::ChatMessage, "chat", json!({"text": "hi"}))
            .with_user(UserId::new("u-1").unwrap())
            .with_tenant(TenantId::new("t-1").unwrap())
            .with_trace_id("trace-9");

        assert_eq!(env.scope.user_id.unwrap().as_str(), "u-1");
        assert_eq!(env.scope.tenant_id.unwrap().as_str(), "t-1");
        assert_eq!(env.scope.trace_id.as_deref(), Some("trace-9"));
    }

    #[test]
    fn from_payload_serializes_typed_payload() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Progress {
            percent: u8,
        }

        let env = EventEnvelope::from_payload(EventType::TaskProgress, "worker", &Progress { percent: 40 })
            .unwrap();
        assert_eq!(env.payload, json!({"percent": 40}));
        assert_eq!(env.payload_as::<Progress>().unwrap(), Progress { percent: 40 });
    }

    #[test]
    fn scope_version_defaults_when_missing_on_the_wire() {
        let scope: EventScope = serde_json::from_str(r#"{"tenant_id":"t"}"#).unwrap();
        assert_eq!(scope.version, 1);
    }
}
