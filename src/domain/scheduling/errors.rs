//! Scheduling-specific error types.

use crate::domain::foundation::{AgentId, DomainError, ErrorCode, TaskId, ValidationError};

/// Errors surfaced by `Schedule` and `ReleaseEmployee`.
///
/// "No idle agents" is deliberately absent: it is an outcome, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// Agent was not found in the directory.
    AgentNotFound(AgentId),
    /// Task was not found in the store.
    TaskNotFound(TaskId),
    /// Task or agent was not in a state that allows the operation.
    InvalidState(String),
    /// Validation failed.
    ValidationFailed { field: String, message: String },
    /// Repository or other collaborator failure.
    Infrastructure(String),
}

impl SchedulingError {
    pub fn agent_not_found(id: AgentId) -> Self {
        SchedulingError::AgentNotFound(id)
    }
    pub fn invalid_state(message: impl Into<String>) -> Self {
        SchedulingError::InvalidState(message.into())
    }
    pub fn infrastructure(message: impl Into<String>) -> Self {
        SchedulingError::Infrastructure(message.into())
    }
    pub fn code(&self) -> ErrorCode {
        match self {
            SchedulingError::AgentNotFound(_) => ErrorCode::AgentNotFound,
            SchedulingError::TaskNotFound(_) => ErrorCode::TaskNotFound,
            SchedulingError::InvalidState(_) => ErrorCode::InvalidStateTransition,
            SchedulingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SchedulingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
    pub fn message(&self) -> String {
        match self {
            SchedulingError::AgentNotFound(id) => format!("Agent not found: {}", id),
            SchedulingError::TaskNotFound(id) => format!("Task not found: {}", id),
            SchedulingError::InvalidState(msg) => format!("Invalid state: {}", msg),
            SchedulingError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SchedulingError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SchedulingError {}

impl From<DomainError> for SchedulingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidStateTransition => SchedulingError::InvalidState(err.to_string()),
            ErrorCode::ValidationFailed => SchedulingError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.to_string(),
            },
            _ => SchedulingError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for SchedulingError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidTransition { .. } => {
                SchedulingError::InvalidState(err.to_string())
            }
            ValidationError::EmptyField { ref field }
            | ValidationError::InvalidFormat { ref field, .. } => {
                SchedulingError::ValidationFailed {
                    field: field.clone(),
                    message: err.to_string(),
                }
            }
        }
    }
}
