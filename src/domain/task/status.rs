//! TaskStatus and TaskPriority enums.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a task.
///
/// ```text
/// pending ──► running ──► completed | failed | cancelled
///               ▲  │
///               │  ▼
///              paused
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl StateMachine for TaskStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use TaskStatus::*;
        matches!(
            (self, target),
            (Pending, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Paused)
                | (Running, Cancelled)
                | (Paused, Running)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use TaskStatus::*;
        match self {
            Pending => vec![Running],
            Running => vec![Completed, Failed, Paused, Cancelled],
            Paused => vec![Running],
            Completed | Failed | Cancelled => vec![],
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Paused => "paused",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Urgency of a task. Feeds the priority bonus of the scoring pass.
///
/// Unrecognized wire values deserialize to `Unspecified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
    #[serde(other)]
    Unspecified,
}

impl TaskPriority {
    /// Fixed bonus used by the scheduler's weighted score.
    pub fn priority_bonus(&self) -> f64 {
        match self {
            TaskPriority::Urgent => 100.0,
            TaskPriority::High => 75.0,
            TaskPriority::Medium => 50.0,
            TaskPriority::Low => 25.0,
            TaskPriority::Unspecified => 50.0,
        }
    }
}
