// wire.rs: JSON request/response shapes.
//
// These are the bodies a transport layer exchanges with clients. The `pp`
// CLI reads requests from files and prints responses with them; no server
// lives in this workspace.

use std::collections::BTreeMap;

use pp_store::RecordId;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::model::{AssociationHandle, Completion, PlanEntry, ResolvedPlan, Task, TaskRef, TaskSpec};
use crate::planner::ProgressCheck;

pub const ON_TRACK_MESSAGE: &str = "Plans are on track";
pub const NEEDS_ADJUSTMENT_MESSAGE: &str = "Plans need adjustment";
pub const RECEIVED_MESSAGE: &str = "Data received successfully";
pub const ACCEPTED_MESSAGE: &str = "Plan accepted";

/// One task in a suggest request. `point` is accepted as an alias of `award`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub task: String,
    #[serde(alias = "point")]
    pub award: u32,
}

/// Body of a plan suggestion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub goal: String,
    pub goal_points: u32,
    pub tasks: Vec<TaskItem>,
}

impl SuggestRequest {
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.goal.trim().is_empty() {
            return Err(PlanError::InvalidInput("goal is empty".to_string()));
        }
        if self.tasks.is_empty() {
            return Err(PlanError::InvalidInput("tasks list is empty".to_string()));
        }
        if let Some(pos) = self.tasks.iter().position(|t| t.task.trim().is_empty()) {
            return Err(PlanError::InvalidInput(format!("task {} has no description", pos + 1)));
        }
        Ok(())
    }

    pub fn task_specs(&self) -> Vec<TaskSpec> {
        self.tasks
            .iter()
            .map(|t| TaskSpec::new(t.task.trim(), t.award))
            .collect()
    }
}

/// One scheduled occurrence as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanItem {
    pub task_id: RecordId,
    pub task: String,
    pub award: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    pub plans_today: Vec<PlanItem>,
}

/// Group `(day, item)` pairs into ascending days.
fn group_days(items: impl IntoIterator<Item = (u32, PlanItem)>) -> Vec<DayPlan> {
    let mut days: BTreeMap<u32, Vec<PlanItem>> = BTreeMap::new();
    for (day, item) in items {
        days.entry(day).or_default().push(item);
    }
    days.into_iter()
        .map(|(day, plans_today)| DayPlan { day, plans_today })
        .collect()
}

/// A linked plan, as returned by suggest and plan lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub goal_id: RecordId,
    pub handle: AssociationHandle,
    pub tasks_ids_id: RecordId,
    pub plans_ids_id: RecordId,
    pub plans: Vec<DayPlan>,
}

impl SuggestResponse {
    pub fn from_plan(plan: &ResolvedPlan) -> Self {
        let items = plan.entries.iter().map(|entry| {
            (
                entry.day,
                PlanItem {
                    task_id: entry.task_id,
                    task: entry.task.clone(),
                    award: entry.points,
                },
            )
        });
        Self {
            goal_id: plan.goal_id,
            handle: plan.handle,
            tasks_ids_id: plan.tasks_ids_id,
            plans_ids_id: plan.plans_ids_id,
            plans: group_days(items),
        }
    }
}

/// Body of a daily point-total submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotalRequest {
    pub goal_id: RecordId,
    pub day: u32,
    pub total_points: u32,
}

/// One task's state in a daily completion submission. Either `task_id` or
/// the task's description in `task` names it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    pub status: bool,
}

/// Body of a daily completion submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRequest {
    pub day: u32,
    pub daily: Vec<DailyItem>,
}

impl DailyRequest {
    pub fn completions(&self) -> Result<Vec<Completion>, PlanError> {
        self.daily
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let task = match (item.task_id, &item.task) {
                    (Some(id), _) => TaskRef::Id(id),
                    (None, Some(name)) if !name.trim().is_empty() => {
                        TaskRef::Name(name.trim().to_string())
                    }
                    _ => {
                        return Err(PlanError::InvalidInput(format!(
                            "daily item {} names no task",
                            i + 1
                        )))
                    }
                };
                Ok(Completion {
                    task,
                    done: item.status,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsResponse {
    pub points: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    /// Acknowledges a recorded day.
    pub fn received() -> Self {
        Self {
            message: RECEIVED_MESSAGE.to_string(),
        }
    }

    /// Acknowledges an accepted goal.
    pub fn accepted() -> Self {
        Self {
            message: ACCEPTED_MESSAGE.to_string(),
        }
    }
}

/// Answer to an on-track check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub message: String,
    pub earned: u64,
    pub expected: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adjusted_plans: Vec<DayPlan>,
}

impl CheckResponse {
    pub fn from_check(check: &ProgressCheck) -> Self {
        let message = if check.pace.is_on_track() {
            ON_TRACK_MESSAGE
        } else {
            NEEDS_ADJUSTMENT_MESSAGE
        };
        Self {
            message: message.to_string(),
            earned: check.earned,
            expected: check.expected,
            adjusted_plans: group_days(adjusted_items(&check.adjusted_plan, &check.tasks)),
        }
    }
}

fn adjusted_items<'a>(
    entries: &'a [PlanEntry],
    tasks: &'a [Task],
) -> impl Iterator<Item = (u32, PlanItem)> + 'a {
    entries.iter().map(move |entry| {
        let task = tasks
            .iter()
            .find(|t| t.id == entry.task_id)
            .map(|t| t.description.clone())
            .unwrap_or_default();
        (
            entry.day,
            PlanItem {
                task_id: entry.task_id,
                task,
                award: entry.points,
            },
        )
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<&PlanError> for ErrorBody {
    fn from(err: &PlanError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}
