//! In-Memory Agent Directory Adapter
//!
//! Keeps agents in insertion order so idle-agent listings are stable.
//! Used by tests and by the standalone binary.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::agent::{Agent, AssignedSkill};
use crate::domain::foundation::{AgentId, DomainError, ErrorCode, TenantId};
use crate::ports::AgentDirectory;

/// In-memory storage for employee agents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAgentDirectory {
    agents: Arc<RwLock<Vec<Agent>>>,
    skills: Arc<RwLock<HashMap<AgentId, Vec<AssignedSkill>>>>,
}

impl InMemoryAgentDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent, replacing any existing agent with the same id
    pub async fn insert(&self, agent: Agent) {
        let mut agents = self.agents.write().await;
        match agents.iter_mut().find(|a| a.id() == agent.id()) {
            Some(existing) => *existing = agent,
            None => agents.push(agent),
        }
    }

    /// Assign a skill card to an agent
    pub async fn assign_skill(&self, skill: AssignedSkill) {
        self.skills
            .write()
            .await
            .entry(skill.agent_id)
            .or_default()
            .push(skill);
    }
}

#[async_trait]
impl AgentDirectory for InMemoryAgentDirectory {
    async fn list_idle_agents(&self, tenant_id: &TenantId) -> Result<Vec<Agent>, DomainError> {
        let agents = self.agents.read().await;
        Ok(agents
            .iter()
            .filter(|a| a.tenant_id() == tenant_id && a.is_available())
            .cloned()
            .collect())
    }

    async fn get_agent(&self, id: &AgentId) -> Result<Option<Agent>, DomainError> {
        let agents = self.agents.read().await;
        Ok(agents.iter().find(|a| a.id() == id).cloned())
    }

    async fn update_agent(&self, agent: &Agent) -> Result<(), DomainError> {
        let mut agents = self.agents.write().await;
        let existing = agents
            .iter_mut()
            .find(|a| a.id() == agent.id())
            .ok_or_else(|| {
                DomainError::new(ErrorCode::AgentNotFound, "Agent not found")
                    .with_detail("agent_id", agent.id().to_string())
            })?;
        *existing = agent.clone();
        Ok(())
    }

    async fn list_skills(&self, agent_id: &AgentId) -> Result<Vec<AssignedSkill>, DomainError> {
        let skills = self.skills.read().await;
        Ok(skills.get(agent_id).cloned().unwrap_or_default())
    }
}
