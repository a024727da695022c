//! Agent directory port.
//!
//! Read/write access to employee agents and their assigned skill cards.
//! The scheduler uses it to discover idle candidates and to persist
//! status changes.

use async_trait::async_trait;

use crate::domain::agent::{Agent, AssignedSkill};
use crate::domain::foundation::{AgentId, DomainError, TenantId};

/// Repository port for employee agents.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// List every idle agent of a tenant.
    ///
    /// Order must be stable between calls; the scheduler breaks score ties
    /// by this order.
    async fn list_idle_agents(&self, tenant_id: &TenantId) -> Result<Vec<Agent>, DomainError>;

    /// Find an agent by ID.
    ///
    /// Returns `None` if not found.
    async fn get_agent(&self, id: &AgentId) -> Result<Option<Agent>, DomainError>;

    /// Persist an agent's current state.
    ///
    /// # Errors
    ///
    /// - `AgentNotFound` if the agent doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update_agent(&self, agent: &Agent) -> Result<(), DomainError>;

    /// List the skill cards assigned to an agent.
    async fn list_skills(&self, agent_id: &AgentId) -> Result<Vec<AssignedSkill>, DomainError>;
}
