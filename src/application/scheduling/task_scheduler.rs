//! TaskScheduler - Matches pending tasks to idle agents.
//!
//! For one task the scheduler:
//! 1. Lists the tenant's idle agents
//! 2. Scores each candidate (see `domain::scheduling`)
//! 3. Starts the task on the best agent and puts that agent to work
//! 4. Persists task, then agent (the task is put back to pending if the
//!    agent write fails)
//! 5. Publishes `task.assigned` and `employee.busy`
//!
//! Steps 1-4 run under one exclusive lock so concurrent passes never hand
//! the same idle agent two tasks. The stored task is re-checked under the
//! lock, so a stale copy that another pass already started is rejected.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::agent::Agent;
use crate::domain::foundation::{AgentId, EventEnvelope, EventType, TenantId};
use crate::domain::scheduling::{score_candidate, select_best, CandidateScore, SchedulingError};
use crate::domain::task::{Task, TaskStatus};
use crate::ports::{AgentDirectory, EventPublisher, TaskStore};

/// Event source recorded on scheduler events.
pub const SCHEDULER_SOURCE: &str = "scheduler";

/// Default number of pending tasks examined per tenant pass.
pub const DEFAULT_BATCH_LIMIT: usize = 100;

/// Result of a scheduling attempt that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleOutcome {
    /// Task is running on the winning candidate.
    Assigned(CandidateScore),
    /// Nobody was idle; the task stays pending.
    NoIdleAgents,
}

impl ScheduleOutcome {
    pub fn is_assigned(&self) -> bool {
        matches!(self, ScheduleOutcome::Assigned(_))
    }
}

/// Scheduler service for one process.
pub struct TaskScheduler {
    agents: Arc<dyn AgentDirectory>,
    tasks: Arc<dyn TaskStore>,
    events: Arc<dyn EventPublisher>,
    batch_limit: usize,
    assignment_lock: Mutex<()>,
}

impl TaskScheduler {
    pub fn new(
        agents: Arc<dyn AgentDirectory>,
        tasks: Arc<dyn TaskStore>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            agents,
            tasks,
            events,
            batch_limit: DEFAULT_BATCH_LIMIT,
            assignment_lock: Mutex::new(()),
        }
    }

    /// Limit how many pending tasks `process_pending_tasks` looks at.
    pub fn with_batch_limit(mut self, batch_limit: usize) -> Self {
        self.batch_limit = batch_limit.max(1);
        self
    }

    /// Try to assign `task` to the best idle agent of its tenant.
    ///
    /// On success `task` is updated in place to the persisted running state.
    /// On error neither `task` nor its stored row leave pending.
    pub async fn schedule(&self, task: &mut Task) -> Result<ScheduleOutcome, SchedulingError> {
        let _guard = self.assignment_lock.lock().await;

        // A batch may hold a stale copy of a task another pass already took.
        let stored = self
            .tasks
            .get_task(task.id())
            .await?
            .ok_or(SchedulingError::TaskNotFound(*task.id()))?;
        if stored.status() != TaskStatus::Pending {
            return Err(SchedulingError::invalid_state(format!(
                "task {} is {:?}, not pending",
                task.id(),
                stored.status()
            )));
        }

        let idle: Vec<Agent> = self
            .agents
            .list_idle_agents(task.tenant_id())
            .await?
            .into_iter()
            .filter(Agent::is_available)
            .collect();

        if idle.is_empty() {
            debug!(task_id = %task.id(), tenant_id = %task.tenant_id(), "No idle agents, task stays pending");
            return Ok(ScheduleOutcome::NoIdleAgents);
        }

        let mut candidates = Vec::with_capacity(idle.len());
        for agent in &idle {
            let skill_count = match self.agents.list_skills(agent.id()).await {
                Ok(skills) => Some(skills.len()),
                Err(e) => {
                    warn!(agent_id = %agent.id(), error = %e, "Skill lookup failed, using neutral skill score");
                    None
                }
            };
            candidates.push(score_candidate(agent, skill_count, task.priority()));
        }

        let Some(best) = select_best(candidates) else {
            return Ok(ScheduleOutcome::NoIdleAgents);
        };
        let mut agent = idle
            .into_iter()
            .find(|a| *a.id() == best.agent_id)
            .ok_or_else(|| SchedulingError::agent_not_found(best.agent_id))?;

        let mut updated = task.clone();
        updated.start_on(*agent.id())?;
        agent.assign_task(*updated.id())?;

        self.tasks.update_task(&updated).await?;
        if let Err(e) = self.agents.update_agent(&agent).await {
            if let Err(restore) = self.tasks.update_task(&stored).await {
                warn!(
                    task_id = %task.id(),
                    agent_id = %agent.id(),
                    error = %restore,
                    "Failed to put task back to pending after agent update failed"
                );
            }
            return Err(e.into());
        }
        *task = updated;

        info!(
            task_id = %task.id(),
            agent_id = %agent.id(),
            score = best.score,
            "Task assigned"
        );

        self.publish_assignment(task, &agent, &best).await;
        Ok(ScheduleOutcome::Assigned(best))
    }

    /// Return an agent to the idle pool after it finished a task.
    pub async fn release_employee(
        &self,
        agent_id: &AgentId,
        success: bool,
    ) -> Result<Agent, SchedulingError> {
        let _guard = self.assignment_lock.lock().await;

        let mut agent = self
            .agents
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| SchedulingError::agent_not_found(*agent_id))?;

        let finished_task = agent.current_task().copied();
        agent.complete_task(success);
        self.agents.update_agent(&agent).await?;

        info!(
            agent_id = %agent.id(),
            success,
            success_rate = agent.success_rate(),
            "Employee released"
        );

        let event = EventEnvelope::new(
            EventType::EmployeeIdle,
            SCHEDULER_SOURCE,
            json!({
                "agent_id": agent.id(),
                "task_id": finished_task,
                "success": success,
                "total_tasks": agent.total_tasks(),
                "success_rate": agent.success_rate(),
            }),
        )
        .with_tenant(agent.tenant_id().clone());
        self.publish(event).await;

        Ok(agent)
    }

    /// Attempt to schedule every pending task of a tenant, up to the batch limit.
    ///
    /// A failure on one task is logged and skipped. Returns how many tasks
    /// were assigned.
    pub async fn process_pending_tasks(&self, tenant_id: &TenantId) -> Result<usize, SchedulingError> {
        let pending = self.tasks.list_pending(tenant_id, self.batch_limit).await?;
        let mut assigned = 0;

        for mut task in pending {
            match self.schedule(&mut task).await {
                Ok(ScheduleOutcome::Assigned(_)) => assigned += 1,
                Ok(ScheduleOutcome::NoIdleAgents) => {}
                Err(SchedulingError::InvalidState(reason)) => {
                    debug!(task_id = %task.id(), %reason, "Task no longer schedulable, skipping");
                }
                Err(e) => {
                    warn!(task_id = %task.id(), code = %e.code(), error = %e, "Scheduling failed, skipping task");
                }
            }
        }

        if assigned > 0 {
            info!(tenant_id = %tenant_id, assigned, "Processed pending tasks");
        }
        Ok(assigned)
    }

    async fn publish_assignment(&self, task: &Task, agent: &Agent, score: &CandidateScore) {
        let assigned = EventEnvelope::new(
            EventType::TaskAssigned,
            SCHEDULER_SOURCE,
            json!({
                "task_id": task.id(),
                "agent_id": agent.id(),
                "score": score.score,
                "rationale": score.rationale,
            }),
        )
        .with_tenant(task.tenant_id().clone());

        let busy = EventEnvelope::new(
            EventType::EmployeeBusy,
            SCHEDULER_SOURCE,
            json!({
                "agent_id": agent.id(),
                "task_id": task.id(),
            }),
        )
        .with_tenant(agent.tenant_id().clone());

        self.publish(assigned).await;
        self.publish(busy).await;
    }

    /// Scheduler events never fail the operation that produced them.
    async fn publish(&self, event: EventEnvelope) {
        let event_type = event.event_type;
        if let Err(e) = self.events.publish(event).await {
            warn!(event_type = %event_type, error = %e, "Failed to publish scheduler event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::storage::{InMemoryAgentDirectory, InMemoryTaskStore};
    use crate::domain::agent::{AgentStatus, AssignedSkill};
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::domain::task::TaskPriority;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn acme() -> TenantId {
        TenantId::new("acme").unwrap()
    }

    struct Fixture {
        agents: Arc<InMemoryAgentDirectory>,
        tasks: Arc<InMemoryTaskStore>,
        bus: Arc<InMemoryEventBus>,
        scheduler: Arc<TaskScheduler>,
    }

    fn fixture() -> Fixture {
        let agents = Arc::new(InMemoryAgentDirectory::new());
        let tasks = Arc::new(InMemoryTaskStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let scheduler = Arc::new(TaskScheduler::new(agents.clone(), tasks.clone(), bus.clone()));
        Fixture {
            agents,
            tasks,
            bus,
            scheduler,
        }
    }

    async fn add_agent(f: &Fixture, name: &str, total: u64, rate: f64) -> Agent {
        let agent = Agent::new(acme(), name).unwrap().with_track_record(total, rate);
        f.agents.insert(agent.clone()).await;
        agent
    }

    async fn add_task(f: &Fixture, priority: TaskPriority) -> Task {
        let task = Task::new(acme(), "Summarize tickets", priority).unwrap();
        f.tasks.insert(task.clone()).await;
        task
    }

    /// Directory whose every call fails.
    struct BrokenDirectory;

    #[async_trait]
    impl AgentDirectory for BrokenDirectory {
        async fn list_idle_agents(&self, _: &TenantId) -> Result<Vec<Agent>, DomainError> {
            Err(DomainError::new(ErrorCode::DatabaseError, "directory offline"))
        }
        async fn get_agent(&self, _: &AgentId) -> Result<Option<Agent>, DomainError> {
            Err(DomainError::new(ErrorCode::DatabaseError, "directory offline"))
        }
        async fn update_agent(&self, _: &Agent) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::DatabaseError, "directory offline"))
        }
        async fn list_skills(&self, _: &AgentId) -> Result<Vec<AssignedSkill>, DomainError> {
            Err(DomainError::new(ErrorCode::DatabaseError, "directory offline"))
        }
    }

    /// Directory whose first `update_agent` fails.
    struct FlakyDirectory {
        inner: InMemoryAgentDirectory,
        failed: AtomicBool,
    }

    impl FlakyDirectory {
        fn new() -> Self {
            Self {
                inner: InMemoryAgentDirectory::new(),
                failed: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl AgentDirectory for FlakyDirectory {
        async fn list_idle_agents(&self, tenant_id: &TenantId) -> Result<Vec<Agent>, DomainError> {
            self.inner.list_idle_agents(tenant_id).await
        }
        async fn get_agent(&self, id: &AgentId) -> Result<Option<Agent>, DomainError> {
            self.inner.get_agent(id).await
        }
        async fn update_agent(&self, agent: &Agent) -> Result<(), DomainError> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(DomainError::new(ErrorCode::DatabaseError, "write timed out"));
            }
            self.inner.update_agent(agent).await
        }
        async fn list_skills(&self, agent_id: &AgentId) -> Result<Vec<AssignedSkill>, DomainError> {
            self.inner.list_skills(agent_id).await
        }
    }

    #[tokio::test]
    async fn no_idle_agents_leaves_task_pending() {
        let f = fixture();
        let mut task = add_task(&f, TaskPriority::High).await;

        let outcome = f.scheduler.schedule(&mut task).await.unwrap();

        assert_eq!(outcome, ScheduleOutcome::NoIdleAgents);
        assert_eq!(task.status(), TaskStatus::Pending);
        assert_eq!(f.bus.history_len(), 0);
    }

    #[tokio::test]
    async fn fresh_reliable_agent_beats_loaded_one() {
        let f = fixture();
        let a = add_agent(&f, "A", 0, 1.0).await;
        let _b = add_agent(&f, "B", 10, 0.5).await;
        let mut task = add_task(&f, TaskPriority::Urgent).await;

        let outcome = f.scheduler.schedule(&mut task).await.unwrap();

        match outcome {
            ScheduleOutcome::Assigned(score) => assert_eq!(score.agent_id, *a.id()),
            other => panic!("expected assignment, got {:?}", other),
        }
        assert_eq!(task.status(), TaskStatus::Running);
        assert_eq!(task.assigned_agent(), Some(a.id()));
        assert!(task.started_at().is_some());
    }

    #[tokio::test]
    async fn assignment_is_persisted_for_task_and_agent() {
        let f = fixture();
        let a = add_agent(&f, "A", 0, 1.0).await;
        let mut task = add_task(&f, TaskPriority::Medium).await;

        f.scheduler.schedule(&mut task).await.unwrap();

        let stored_task = f.tasks.get_task(task.id()).await.unwrap().unwrap();
        assert_eq!(stored_task.status(), TaskStatus::Running);

        let stored_agent = f.agents.get_agent(a.id()).await.unwrap().unwrap();
        assert_eq!(stored_agent.status(), AgentStatus::Working);
        assert_eq!(stored_agent.current_task(), Some(task.id()));
    }

    #[tokio::test]
    async fn assignment_publishes_assigned_and_busy() {
        let f = fixture();
        add_agent(&f, "A", 0, 1.0).await;
        let mut task = add_task(&f, TaskPriority::Low).await;

        f.scheduler.schedule(&mut task).await.unwrap();

        let assigned = f.bus.get_history_by_type(EventType::TaskAssigned, 0);
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].scope.tenant_id, Some(acme()));
        assert_eq!(assigned[0].payload["task_id"], json!(task.id()));
        assert_eq!(f.bus.get_history_by_type(EventType::EmployeeBusy, 0).len(), 1);
    }

    #[tokio::test]
    async fn skilled_agent_wins_otherwise_equal_tie() {
        let f = fixture();
        let _plain = add_agent(&f, "plain", 0, 1.0).await;
        let skilled = add_agent(&f, "skilled", 0, 1.0).await;
        f.agents
            .assign_skill(AssignedSkill::new(*skilled.id(), "triage"))
            .await;
        let mut task = add_task(&f, TaskPriority::Medium).await;

        match f.scheduler.schedule(&mut task).await.unwrap() {
            ScheduleOutcome::Assigned(score) => {
                assert_eq!(score.agent_id, *skilled.id());
                assert_eq!(score.skill_match, 80.0);
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn equal_scores_pick_first_listed_agent() {
        for _ in 0..10 {
            let f = fixture();
            let first = add_agent(&f, "first", 3, 0.9).await;
            add_agent(&f, "second", 3, 0.9).await;
            let mut task = add_task(&f, TaskPriority::High).await;

            match f.scheduler.schedule(&mut task).await.unwrap() {
                ScheduleOutcome::Assigned(score) => assert_eq!(score.agent_id, *first.id()),
                other => panic!("expected assignment, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn concurrent_passes_never_double_assign() {
        let f = fixture();
        let agent = add_agent(&f, "solo", 0, 1.0).await;
        let mut first = add_task(&f, TaskPriority::High).await;
        let mut second = add_task(&f, TaskPriority::High).await;

        let s1 = f.scheduler.clone();
        let s2 = f.scheduler.clone();
        let h1 = tokio::spawn(async move {
            let outcome = s1.schedule(&mut first).await.unwrap();
            (outcome, first)
        });
        let h2 = tokio::spawn(async move {
            let outcome = s2.schedule(&mut second).await.unwrap();
            (outcome, second)
        });
        let (o1, t1) = h1.await.unwrap();
        let (o2, t2) = h2.await.unwrap();

        assert_eq!([o1.is_assigned(), o2.is_assigned()].iter().filter(|a| **a).count(), 1);
        let running: Vec<_> = [&t1, &t2]
            .into_iter()
            .filter(|t| t.status() == TaskStatus::Running)
            .collect();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].assigned_agent(), Some(agent.id()));
        assert!([&t1, &t2].iter().any(|t| t.status() == TaskStatus::Pending));
    }

    #[tokio::test]
    async fn non_pending_task_is_rejected() {
        let f = fixture();
        add_agent(&f, "A", 0, 1.0).await;
        let mut task = Task::new(acme(), "Already running", TaskPriority::High).unwrap();
        task.start_on(AgentId::new()).unwrap();
        f.tasks.insert(task.clone()).await;

        let err = f.scheduler.schedule(&mut task).await.unwrap_err();

        assert!(matches!(err, SchedulingError::InvalidState(_)));
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
        assert_eq!(f.agents.list_idle_agents(&acme()).await.unwrap().len(), 1);
        assert_eq!(f.bus.history_len(), 0);
    }

    #[tokio::test]
    async fn stale_copy_of_started_task_is_rejected() {
        let f = fixture();
        add_agent(&f, "A", 0, 1.0).await;
        add_agent(&f, "B", 0, 1.0).await;
        let mut task = add_task(&f, TaskPriority::High).await;
        let mut stale = task.clone();

        f.scheduler.schedule(&mut task).await.unwrap();
        let err = f.scheduler.schedule(&mut stale).await.unwrap_err();

        assert!(matches!(err, SchedulingError::InvalidState(_)));
        assert_eq!(f.agents.list_idle_agents(&acme()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn directory_failure_is_surfaced() {
        let tasks = Arc::new(InMemoryTaskStore::new());
        let scheduler = TaskScheduler::new(
            Arc::new(BrokenDirectory),
            tasks.clone(),
            Arc::new(InMemoryEventBus::new()),
        );
        let mut task = Task::new(acme(), "t", TaskPriority::High).unwrap();
        tasks.insert(task.clone()).await;

        let err = scheduler.schedule(&mut task).await.unwrap_err();

        assert!(matches!(err, SchedulingError::Infrastructure(_)));
        assert_eq!(task.status(), TaskStatus::Pending);
    }

    #[tokio::test]
    async fn release_records_failure_and_publishes_idle() {
        let f = fixture();
        let agent = add_agent(&f, "A", 4, 1.0).await;
        let mut task = add_task(&f, TaskPriority::High).await;
        f.scheduler.schedule(&mut task).await.unwrap();

        let released = f.scheduler.release_employee(agent.id(), false).await.unwrap();

        assert_eq!(released.status(), AgentStatus::Idle);
        assert_eq!(released.current_task(), None);
        assert_eq!(released.total_tasks(), 5);
        assert!((released.success_rate() - 0.8).abs() < 1e-9);

        let idle = f.bus.get_history_by_type(EventType::EmployeeIdle, 0);
        assert_eq!(idle.len(), 1);
        assert_eq!(idle[0].payload["success"], json!(false));
    }

    #[tokio::test]
    async fn release_unknown_agent_fails() {
        let f = fixture();
        let missing = AgentId::new();

        let err = f.scheduler.release_employee(&missing, true).await.unwrap_err();

        assert_eq!(err, SchedulingError::AgentNotFound(missing));
    }

    #[tokio::test]
    async fn pending_batch_assigns_as_many_as_agents_allow() {
        let f = fixture();
        add_agent(&f, "A", 0, 1.0).await;
        add_agent(&f, "B", 0, 1.0).await;
        for _ in 0..3 {
            add_task(&f, TaskPriority::Medium).await;
        }

        let assigned = f.scheduler.process_pending_tasks(&acme()).await.unwrap();

        assert_eq!(assigned, 2);
        assert_eq!(f.tasks.list_pending(&acme(), 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pending_batch_respects_limit() {
        let agents = Arc::new(InMemoryAgentDirectory::new());
        let tasks = Arc::new(InMemoryTaskStore::new());
        let scheduler = TaskScheduler::new(agents.clone(), tasks.clone(), Arc::new(InMemoryEventBus::new()))
            .with_batch_limit(1);
        for name in ["A", "B"] {
            agents.insert(Agent::new(acme(), name).unwrap()).await;
        }
        for _ in 0..2 {
            tasks.insert(Task::new(acme(), "t", TaskPriority::Low).unwrap()).await;
        }

        assert_eq!(scheduler.process_pending_tasks(&acme()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let f = fixture();
        add_agent(&f, "A", 0, 1.0).await;
        let mut orphan = Task::new(acme(), "never stored", TaskPriority::High).unwrap();

        let err = f.scheduler.schedule(&mut orphan).await.unwrap_err();

        assert_eq!(err, SchedulingError::TaskNotFound(*orphan.id()));
        assert_eq!(orphan.status(), TaskStatus::Pending);
        assert_eq!(f.agents.list_idle_agents(&acme()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_agent_write_puts_task_back_to_pending() {
        let agents = Arc::new(FlakyDirectory::new());
        let tasks = Arc::new(InMemoryTaskStore::new());
        let scheduler =
            TaskScheduler::new(agents.clone(), tasks.clone(), Arc::new(InMemoryEventBus::new()));
        let solo = Agent::new(acme(), "solo").unwrap();
        agents.inner.insert(solo.clone()).await;
        let mut first = Task::new(acme(), "first", TaskPriority::High).unwrap();
        let mut second = Task::new(acme(), "second", TaskPriority::High).unwrap();
        tasks.insert(first.clone()).await;
        tasks.insert(second.clone()).await;

        let err = scheduler.schedule(&mut first).await.unwrap_err();
        assert!(matches!(err, SchedulingError::Infrastructure(_)));
        assert_eq!(first.status(), TaskStatus::Pending);
        let stored_first = tasks.get_task(first.id()).await.unwrap().unwrap();
        assert_eq!(stored_first.status(), TaskStatus::Pending);
        assert_eq!(stored_first.assigned_agent(), None);

        let outcome = scheduler.schedule(&mut second).await.unwrap();
        assert!(outcome.is_assigned());
        assert!(!scheduler.schedule(&mut first).await.unwrap().is_assigned());

        let mut running_on_solo = 0;
        for id in [first.id(), second.id()] {
            let stored = tasks.get_task(id).await.unwrap().unwrap();
            if stored.assigned_agent() == Some(solo.id()) {
                running_on_solo += 1;
            }
        }
        assert_eq!(running_on_solo, 1);
        assert_eq!(tasks.list_pending(&acme(), 10).await.unwrap().len(), 1);
    }
}
