// Planning outcomes that are not a usable path
//
// None of these are fatal: the agent controller maps each one to a fallback
// behaviour. Only grid construction errors (see `types::GridError`) are
// treated as broken preconditions.

use thiserror::Error;

use crate::search::PlanningMode;
use crate::types::Position;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The open set emptied before the goal was popped
    #[error("no {mode:?} path to ({}, {})", .goal.row, .goal.col)]
    PathNotFound { goal: Position, mode: PlanningMode },

    /// No tail-end body segment produced a long enough survival path
    #[error("survival search exhausted for a body of length {body_len}")]
    SurvivalExhausted { body_len: usize },

    /// Consecutive path positions are not one orthogonal step apart
    #[error(
        "malformed move delta from ({}, {}) to ({}, {})",
        .from.row, .from.col, .to.row, .to.col
    )]
    MalformedMoveDelta { from: Position, to: Position },
}
