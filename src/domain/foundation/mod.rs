//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, event types, and error types
//! that form the vocabulary of the task pipeline.

mod errors;
mod events;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{EventEnvelope, EventId, EventScope, EventType};
pub use ids::{AgentId, SkillId, TaskId, TenantId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
