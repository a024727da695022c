//! Task aggregate entity.
//!
//! A task is a unit of work a tenant hands to one of its employee agents.
//! Persistence lives behind the `TaskStore` port; this type only guards
//! the status machine and the fields that move with it.

use serde::{Deserialize, Serialize};

use super::{TaskPriority, TaskStatus};
use crate::domain::foundation::{
    AgentId, StateMachine, TaskId, TenantId, Timestamp, ValidationError,
};

/// Task aggregate.
///
/// # Invariants
///
/// - `title` is non-empty
/// - `assigned_agent` and `started_at` are set whenever status is not `Pending`
/// - status only moves along `TaskStatus` transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    tenant_id: TenantId,
    title: String,
    priority: TaskPriority,
    status: TaskStatus,
    assigned_agent: Option<AgentId>,
    error: Option<String>,
    created_at: Timestamp,
    started_at: Option<Timestamp>,
    completed_at: Option<Timestamp>,
}

impl Task {
    /// Create a new pending task.
    pub fn new(
        tenant_id: TenantId,
        title: impl Into<String>,
        priority: TaskPriority,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title"));
        }

        Ok(Self {
            id: TaskId::new(),
            tenant_id,
            title,
            priority,
            status: TaskStatus::Pending,
            assigned_agent: None,
            error: None,
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn assigned_agent(&self) -> Option<&AgentId> {
        self.assigned_agent.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn started_at(&self) -> Option<&Timestamp> {
        self.started_at.as_ref()
    }

    pub fn completed_at(&self) -> Option<&Timestamp> {
        self.completed_at.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a pending task on the given agent.
    ///
    /// Resuming a paused task goes through `resume` instead, so this only
    /// accepts `Pending`.
    pub fn start_on(&mut self, agent_id: AgentId) -> Result<(), ValidationError> {
        if self.status != TaskStatus::Pending {
            return Err(ValidationError::invalid_transition(
                self.status,
                TaskStatus::Running,
            ));
        }
        self.status = self.status.transition_to(TaskStatus::Running)?;
        self.assigned_agent = Some(agent_id);
        self.started_at = Some(Timestamp::now());
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(TaskStatus::Paused)?;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), ValidationError> {
        if self.status != TaskStatus::Paused {
            return Err(ValidationError::invalid_transition(
                self.status,
                TaskStatus::Running,
            ));
        }
        self.status = self.status.transition_to(TaskStatus::Running)?;
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(TaskStatus::Completed)?;
        self.completed_at = Some(Timestamp::now());
        Ok(())
    }

    /// Mark the task failed, keeping the reason for display.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(TaskStatus::Failed)?;
        self.error = Some(reason.into());
        self.completed_at = Some(Timestamp::now());
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(TaskStatus::Cancelled)?;
        self.completed_at = Some(Timestamp::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_task() -> Task {
        Task::new(TenantId::new("acme").unwrap(), "Write report", TaskPriority::High).unwrap()
    }

    #[test]
    fn new_task_is_pending_and_unassigned() {
        let task = pending_task();
        assert_eq!(task.status(), TaskStatus::Pending);
        assert!(task.assigned_agent().is_none());
        assert!(task.started_at().is_none());
    }

    #[test]
    fn new_task_rejects_blank_title() {
        let result = Task::new(TenantId::new("acme").unwrap(), "   ", TaskPriority::Low);
        assert_eq!(result.unwrap_err(), ValidationError::empty_field("title"));
    }

    #[test]
    fn start_on_records_agent_and_start_time() {
        let mut task = pending_task();
        let agent = AgentId::new();

        task.start_on(agent).unwrap();

        assert_eq!(task.status(), TaskStatus::Running);
        assert_eq!(task.assigned_agent(), Some(&agent));
        assert!(task.started_at().is_some());
    }

    #[test]
    fn start_on_rejects_running_task() {
        let mut task = pending_task();
        task.start_on(AgentId::new()).unwrap();

        assert!(task.start_on(AgentId::new()).is_err());
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let mut task = pending_task();
        task.start_on(AgentId::new()).unwrap();

        task.pause().unwrap();
        assert_eq!(task.status(), TaskStatus::Paused);
        task.resume().unwrap();
        assert_eq!(task.status(), TaskStatus::Running);
    }

    #[test]
    fn resume_requires_paused() {
        let mut task = pending_task();
        assert!(task.resume().is_err());
    }

    #[test]
    fn fail_keeps_reason() {
        let mut task = pending_task();
        task.start_on(AgentId::new()).unwrap();
        task.fail("skill card crashed").unwrap();

        assert_eq!(task.status(), TaskStatus::Failed);
        assert_eq!(task.error(), Some("skill card crashed"));
        assert!(task.completed_at().is_some());
    }

    #[test]
    fn pending_task_cannot_complete_or_cancel() {
        let mut task = pending_task();
        assert!(task.complete().is_err());
        assert!(task.cancel().is_err());
        assert_eq!(task.status(), TaskStatus::Pending);
    }
}
