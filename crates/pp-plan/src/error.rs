// error.rs: Error types for the planning engine.
//
// Every failure falls into one of three kinds the caller can act on:
// bad input (don't retry), nothing there yet, or a broken store.

use std::path::PathBuf;

use pp_goal::GoalError;
use pp_store::{RecordId, StoreError};
use thiserror::Error;

/// Errors that can occur while planning, linking or tracking progress.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Missing or malformed caller input (empty task list, zero horizon, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested association, plan or goal does not exist yet.
    #[error("not found: {0}")]
    NotFound(String),

    /// An association points at a row that is not in the store.
    #[error("dangling reference: {table} row {id} is missing")]
    DanglingReference { table: &'static str, id: RecordId },

    /// A goal lifecycle operation failed.
    #[error(transparent)]
    Goal(#[from] GoalError),

    /// The backing store failed.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    /// The planner configuration file is unreadable or invalid.
    #[error("invalid config at {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

/// Coarse classification of a [`PlanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    StoreFailure,
}

impl ErrorKind {
    /// Status code a transport layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::InvalidInput => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::StoreFailure => 500,
        }
    }
}

impl PlanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlanError::InvalidInput(_) | PlanError::Config { .. } => ErrorKind::InvalidInput,
            PlanError::NotFound(_) => ErrorKind::NotFound,
            PlanError::DanglingReference { .. } | PlanError::Store(_) => ErrorKind::StoreFailure,
            PlanError::Goal(goal) => match goal {
                GoalError::InvalidInput(_) | GoalError::InvalidTransition { .. } => {
                    ErrorKind::InvalidInput
                }
                GoalError::NotFound(_) | GoalError::NoCurrentGoal { .. } => ErrorKind::NotFound,
                _ => ErrorKind::StoreFailure,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pp_goal::{CurrentGoalPolicy, GoalStatus};

    #[test]
    fn kinds_map_to_status_codes() {
        let cases = [
            (PlanError::InvalidInput("empty".into()), 400),
            (PlanError::NotFound("association 9".into()), 404),
            (
                PlanError::DanglingReference {
                    table: "plans_ids",
                    id: 3,
                },
                500,
            ),
            (PlanError::Store(StoreError::Poisoned), 500),
            (PlanError::Goal(GoalError::NotFound(1)), 404),
            (
                PlanError::Goal(GoalError::NoCurrentGoal {
                    policy: CurrentGoalPolicy::LatestAccepted,
                }),
                404,
            ),
            (
                PlanError::Goal(GoalError::InvalidTransition {
                    goal_id: 1,
                    from: GoalStatus::Accepted,
                    to: GoalStatus::Accepted,
                }),
                400,
            ),
            (PlanError::Goal(GoalError::Store(StoreError::Poisoned)), 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.kind().http_status(), status, "{err}");
        }
    }
}
