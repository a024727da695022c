//! BackgroundScheduler - Periodic scheduling of pending tasks.
//!
//! Every tick asks the task store which tenants have pending work and runs
//! `TaskScheduler::process_pending_tasks` for each of them.
//!
//! ## Graceful Shutdown
//!
//! The loop listens on a `watch` channel and stops once it reads `true` or
//! the sender goes away. A tick in progress is allowed to finish.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::scheduling::SchedulingError;
use crate::ports::TaskStore;

use super::task_scheduler::TaskScheduler;

/// Drives a `TaskScheduler` on a fixed interval.
pub struct BackgroundScheduler {
    scheduler: Arc<TaskScheduler>,
    tasks: Arc<dyn TaskStore>,
    interval: Duration,
}

impl BackgroundScheduler {
    pub fn new(scheduler: Arc<TaskScheduler>, tasks: Arc<dyn TaskStore>, interval: Duration) -> Self {
        Self {
            scheduler,
            tasks,
            interval,
        }
    }

    /// Run the scheduling loop until shutdown is signalled.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = self.interval.as_millis() as u64, "Background scheduler started");

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        warn!(code = %e.code(), error = %e, "Scheduling tick failed");
                    }
                }
            }
        }

        info!("Background scheduler stopped");
    }

    /// Run one scheduling pass over every tenant with pending tasks.
    ///
    /// Returns the total number of tasks assigned. A failing tenant is
    /// logged and skipped.
    pub async fn tick(&self) -> Result<usize, SchedulingError> {
        let tenants = self.tasks.tenants_with_pending().await?;
        let mut assigned = 0;

        for tenant_id in &tenants {
            match self.scheduler.process_pending_tasks(tenant_id).await {
                Ok(count) => assigned += count,
                Err(e) => warn!(tenant_id = %tenant_id, error = %e, "Tenant scheduling pass failed"),
            }
        }

        debug!(tenants = tenants.len(), assigned, "Scheduling tick complete");
        Ok(assigned)
    }
}
