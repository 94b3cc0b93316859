// error.rs: Error types for the goal lifecycle subsystem.

use pp_store::{RecordId, StoreError};
use thiserror::Error;

use crate::goal::{CurrentGoalPolicy, GoalStatus};

/// Errors that can occur during goal lifecycle operations.
#[derive(Debug, Error)]
pub enum GoalError {
    /// A caller-supplied field was missing or malformed.
    #[error("invalid goal input: {0}")]
    InvalidInput(String),

    /// The requested goal does not exist.
    #[error("goal not found: {0}")]
    NotFound(RecordId),

    /// No goal matches the current-goal policy yet.
    #[error("no current goal under policy {policy}")]
    NoCurrentGoal { policy: CurrentGoalPolicy },

    /// Invalid state transition.
    #[error("invalid transition from {from} to {to} for goal {goal_id}")]
    InvalidTransition {
        goal_id: RecordId,
        from: GoalStatus,
        to: GoalStatus,
    },

    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize an event.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A notification sink could not deliver an event.
    #[error("notification error: {0}")]
    NotificationError(String),
}
