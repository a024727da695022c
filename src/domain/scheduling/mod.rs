//! Scheduling domain: candidate scoring and scheduler errors.

mod errors;
mod scoring;

pub use errors::SchedulingError;
pub use scoring::{
    load_score, score_candidate, select_best, skill_match, CandidateScore, LOAD_WEIGHT,
    PRIORITY_WEIGHT, SKILLED_SCORE, SKILL_WEIGHT, SUCCESS_WEIGHT, UNKNOWN_SKILL_SCORE,
    UNSKILLED_SCORE,
};
