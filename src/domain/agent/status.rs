//! AgentStatus enum for employee availability.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Availability of an employee agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Working,
    Offline,
    Error,
}

impl StateMachine for AgentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use AgentStatus::*;
        matches!(
            (self, target),
            (Idle, Working)
                | (Working, Idle)
                | (Idle, Offline)
                | (Working, Offline)
                | (Error, Offline)
                | (Offline, Idle)
                | (Idle, Error)
                | (Working, Error)
                | (Error, Idle)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use AgentStatus::*;
        match self {
            Idle => vec![Working, Offline, Error],
            Working => vec![Idle, Offline, Error],
            Offline => vec![Idle],
            Error => vec![Idle, Offline],
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Working => "working",
            AgentStatus::Offline => "offline",
            AgentStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}
