//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, events, errors, state machine)
//! - `task` - Task aggregate and its status machine
//! - `agent` - Employee agents and their availability
//! - `scheduling` - Pure candidate scoring used by the task scheduler

pub mod agent;
pub mod foundation;
pub mod scheduling;
pub mod task;
