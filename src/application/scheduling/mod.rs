//! Task scheduling services.
//!
//! - `TaskScheduler` - scores idle agents and assigns tasks
//! - `BackgroundScheduler` - periodic passes over tenants with pending work

mod background;
mod task_scheduler;

pub use background::BackgroundScheduler;
pub use task_scheduler::{ScheduleOutcome, TaskScheduler, DEFAULT_BATCH_LIMIT, SCHEDULER_SOURCE};
