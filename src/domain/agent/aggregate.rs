//! Employee agent entity.
//!
//! Agents execute skill cards against tasks. The scheduler only cares about
//! three things: whether the agent is idle, how many tasks it has finished,
//! and how often those tasks succeeded.

use serde::{Deserialize, Serialize};

use super::AgentStatus;
use crate::domain::foundation::{
    AgentId, SkillId, StateMachine, TaskId, TenantId, Timestamp, ValidationError,
};

/// Employee agent.
///
/// # Invariants
///
/// - `success_rate` stays within `[0, 1]`
/// - `current_task` is set exactly when status is `Working`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    id: AgentId,
    tenant_id: TenantId,
    name: String,
    status: AgentStatus,
    current_task: Option<TaskId>,
    total_tasks: u64,
    success_rate: f64,
    updated_at: Timestamp,
}

impl Agent {
    /// Hire a new idle agent with a perfect track record.
    pub fn new(tenant_id: TenantId, name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }

        Ok(Self {
            id: AgentId::new(),
            tenant_id,
            name,
            status: AgentStatus::Idle,
            current_task: None,
            total_tasks: 0,
            success_rate: 1.0,
            updated_at: Timestamp::now(),
        })
    }

    /// Override the track record. Used when seeding directories.
    pub fn with_track_record(mut self, total_tasks: u64, success_rate: f64) -> Self {
        self.total_tasks = total_tasks;
        self.success_rate = success_rate.clamp(0.0, 1.0);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn current_task(&self) -> Option<&TaskId> {
        self.current_task.as_ref()
    }

    pub fn total_tasks(&self) -> u64 {
        self.total_tasks
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Returns true if the agent can take a new task.
    pub fn is_available(&self) -> bool {
        self.status == AgentStatus::Idle
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Put the agent to work on a task.
    pub fn assign_task(&mut self, task_id: TaskId) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(AgentStatus::Working)?;
        self.current_task = Some(task_id);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Record the outcome of the current task and return to idle.
    ///
    /// A failure counts as a zero in the running mean; a success leaves the
    /// rate unchanged.
    pub fn complete_task(&mut self, success: bool) {
        self.current_task = None;
        self.status = AgentStatus::Idle;
        self.total_tasks += 1;
        if !success {
            let total = self.total_tasks as f64;
            self.success_rate = (self.success_rate * (total - 1.0)) / total;
        }
        self.updated_at = Timestamp::now();
    }

    pub fn set_offline(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(AgentStatus::Offline)?;
        self.current_task = None;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    pub fn set_online(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(AgentStatus::Idle)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}

/// A skill card assigned to an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedSkill {
    pub agent_id: AgentId,
    pub skill_id: SkillId,
    pub name: String,
    pub assigned_at: Timestamp,
}

impl AssignedSkill {
    pub fn new(agent_id: AgentId, name: impl Into<String>) -> Self {
        Self {
            agent_id,
            skill_id: SkillId::new(),
            name: name.into(),
            assigned_at: Timestamp::now(),
        }
    }
}
