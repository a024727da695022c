//! Task store port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TaskId, TenantId};
use crate::domain::task::Task;

/// Repository port for tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a task's current state.
    ///
    /// # Errors
    ///
    /// - `TaskNotFound` if the task doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update_task(&self, task: &Task) -> Result<(), DomainError>;

    /// Find a task by ID.
    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>, DomainError>;

    /// Pending tasks of a tenant, oldest first, at most `limit`.
    async fn list_pending(&self, tenant_id: &TenantId, limit: usize)
        -> Result<Vec<Task>, DomainError>;

    /// Tenants that currently have at least one pending task.
    async fn tenants_with_pending(&self) -> Result<Vec<TenantId>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_store_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn TaskStore) {}
    }
}
