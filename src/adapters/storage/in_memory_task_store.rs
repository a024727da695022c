//! In-Memory Task Store Adapter
//!
//! Tasks are kept in insertion order, which doubles as creation order for
//! pending-task listings.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, TaskId, TenantId};
use crate::domain::task::{Task, TaskStatus};
use crate::ports::TaskStore;

/// In-memory storage for tasks
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl InMemoryTaskStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task, replacing any existing task with the same id
    pub async fn insert(&self, task: Task) {
        let mut tasks = self.tasks.write().await;
        match tasks.iter_mut().find(|t| t.id() == task.id()) {
            Some(existing) => *existing = task,
            None => tasks.push(task),
        }
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn update_task(&self, task: &Task) -> Result<(), DomainError> {
        let mut tasks = self.tasks.write().await;
        let existing = tasks.iter_mut().find(|t| t.id() == task.id()).ok_or_else(|| {
            DomainError::new(ErrorCode::TaskNotFound, "Task not found")
                .with_detail("task_id", task.id().to_string())
        })?;
        *existing = task.clone();
        Ok(())
    }

    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>, DomainError> {
        Ok(self.tasks.read().await.iter().find(|t| t.id() == id).cloned())
    }

    async fn list_pending(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<Task>, DomainError> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .filter(|t| t.tenant_id() == tenant_id && t.status() == TaskStatus::Pending)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn tenants_with_pending(&self) -> Result<Vec<TenantId>, DomainError> {
        let tasks = self.tasks.read().await;
        let tenants: BTreeSet<TenantId> = tasks
            .iter()
            .filter(|t| t.status() == TaskStatus::Pending)
            .map(|t| t.tenant_id().clone())
            .collect();
        Ok(tenants.into_iter().collect())
    }
}
