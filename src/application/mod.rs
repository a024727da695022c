//! Application layer - Services that orchestrate domain operations.
//!
//! This layer coordinates between ports; it owns no I/O of its own.

pub mod scheduling;

pub use scheduling::{BackgroundScheduler, ScheduleOutcome, TaskScheduler};
