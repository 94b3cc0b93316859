// goal.rs: Goal, its status machine, and the current-goal policy.
//
// The lifecycle is deliberately small:
//   Proposed → Accepted
// and acceptance happens at most once per goal.

use std::fmt;

use chrono::{DateTime, Utc};
use pp_store::RecordId;
use serde::{Deserialize, Serialize};

/// Where a goal stands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Suggested with a plan, not yet taken on.
    Proposed,

    /// Taken on by the user. Terminal.
    Accepted,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Proposed => "proposed",
            GoalStatus::Accepted => "accepted",
        }
    }

    /// Only `Proposed → Accepted` is a valid transition.
    pub fn can_transition_to(&self, next: GoalStatus) -> bool {
        matches!((self, next), (GoalStatus::Proposed, GoalStatus::Accepted))
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The objective a plan is built around.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Goal {
    /// Store-assigned identifier.
    pub id: RecordId,

    /// What the user is working towards (e.g. "computer").
    pub name: String,

    /// Points needed to reach the goal.
    pub target_points: u32,

    pub status: GoalStatus,

    /// Stored as integer microseconds so every backend orders it numerically.
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn is_accepted(&self) -> bool {
        self.status == GoalStatus::Accepted
    }
}

/// How "the current goal" is chosen among stored goals.
///
/// Both variants pick the most recently created goal; they differ in which
/// goals are eligible.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CurrentGoalPolicy {
    /// Newest goal with status `accepted`.
    #[default]
    LatestAccepted,

    /// Newest goal regardless of status.
    #[serde(rename = "latest")]
    LatestAny,
}

impl CurrentGoalPolicy {
    /// Status a goal must have to be eligible, if any.
    pub fn required_status(&self) -> Option<GoalStatus> {
        match self {
            CurrentGoalPolicy::LatestAccepted => Some(GoalStatus::Accepted),
            CurrentGoalPolicy::LatestAny => None,
        }
    }
}

impl fmt::Display for CurrentGoalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrentGoalPolicy::LatestAccepted => f.write_str("latest_accepted"),
            CurrentGoalPolicy::LatestAny => f.write_str("latest"),
        }
    }
}
