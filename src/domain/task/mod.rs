//! Task domain module.
//!
//! Holds the `Task` aggregate and its status machine:
//! `pending → running → {completed | failed | paused | cancelled}`, with
//! `paused → running` also legal.

mod aggregate;
mod status;

pub use aggregate::Task;
pub use status::{TaskPriority, TaskStatus};
