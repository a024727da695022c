//! Employee agent domain module.

mod aggregate;
mod status;

pub use aggregate::{Agent, AssignedSkill};
pub use status::AgentStatus;
