//! Weighted candidate scoring for task assignment.
//!
//! ```text
//! score = 0.4 * skill_match
//!       + 0.3 * load_score
//!       + 0.2 * success_rate * 100
//!       + 0.1 * priority_bonus
//! ```
//!
//! Pure functions only; the scheduler service feeds them agents pulled from
//! the agent directory.

use serde::Serialize;

use crate::domain::agent::Agent;
use crate::domain::foundation::AgentId;
use crate::domain::task::TaskPriority;

pub const SKILL_WEIGHT: f64 = 0.4;
pub const LOAD_WEIGHT: f64 = 0.3;
pub const SUCCESS_WEIGHT: f64 = 0.2;
pub const PRIORITY_WEIGHT: f64 = 0.1;

/// Skill score for an agent with at least one assigned skill card.
pub const SKILLED_SCORE: f64 = 80.0;
/// Skill score for an agent with no skill cards.
pub const UNSKILLED_SCORE: f64 = 30.0;
/// Skill score when the agent's skills could not be listed.
pub const UNKNOWN_SKILL_SCORE: f64 = 50.0;

/// Skill match in `[0, 100]`.
///
/// Only checks whether the agent has any skills at all, not whether they
/// cover the task. `None` means the lookup failed.
pub fn skill_match(skill_count: Option<usize>) -> f64 {
    match skill_count {
        None => UNKNOWN_SKILL_SCORE,
        Some(0) => UNSKILLED_SCORE,
        Some(_) => SKILLED_SCORE,
    }
}

/// Favors less loaded agents; `100` for a fresh agent, approaching zero.
pub fn load_score(total_tasks: u64) -> f64 {
    100.0 / (total_tasks as f64 + 1.0)
}

/// Ranking artifact for one agent within one scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub agent_id: AgentId,
    pub score: f64,
    pub skill_match: f64,
    pub load_score: f64,
    pub success_score: f64,
    pub priority_bonus: f64,
    pub rationale: String,
}

/// Score one idle agent for a task of the given priority.
pub fn score_candidate(
    agent: &Agent,
    skill_count: Option<usize>,
    priority: TaskPriority,
) -> CandidateScore {
    let skill = skill_match(skill_count);
    let load = load_score(agent.total_tasks());
    let success = agent.success_rate() * 100.0;
    let bonus = priority.priority_bonus();

    let score = SKILL_WEIGHT * skill
        + LOAD_WEIGHT * load
        + SUCCESS_WEIGHT * success
        + PRIORITY_WEIGHT * bonus;

    CandidateScore {
        agent_id: *agent.id(),
        score,
        skill_match: skill,
        load_score: load,
        success_score: success,
        priority_bonus: bonus,
        rationale: format!(
            "skill={:.1} load={:.1} success={:.1} priority={:.1} => {:.2}",
            skill, load, success, bonus, score
        ),
    }
}

/// Pick the strictly highest score; on ties the earliest candidate wins.
pub fn select_best<I>(candidates: I) -> Option<CandidateScore>
where
    I: IntoIterator<Item = CandidateScore>,
{
    let mut best: Option<CandidateScore> = None;
    for candidate in candidates {
        match &best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }
    best
}
