// model.rs: Entities stored and produced by the planning engine.
//
// Field names on the serde side are the column names of the logical tables
// (`task`, `point`, `tasks_ids_id`, ...), so rows written by one backend are
// readable by any other.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use pp_store::RecordId;
use serde::{Deserialize, Serialize};

/// A task as supplied by the caller, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub description: String,
    pub points: u32,
}

impl TaskSpec {
    pub fn new(description: impl Into<String>, points: u32) -> Self {
        Self {
            description: description.into(),
            points,
        }
    }
}

/// A reward-bearing activity belonging to one goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: RecordId,
    pub goal_id: RecordId,
    #[serde(rename = "task")]
    pub description: String,
    /// Declared value. Scheduled occurrences draw their own points.
    #[serde(rename = "point")]
    pub points: u32,
}

/// One day/task/points assignment produced by distribution, not yet stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanEntry {
    pub day: u32,
    pub task_id: RecordId,
    #[serde(rename = "point")]
    pub points: u32,
}

/// A stored plan entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanRow {
    pub id: RecordId,
    pub day: u32,
    pub task_id: RecordId,
    #[serde(rename = "point")]
    pub points: u32,
}

/// A stored, ordered list of ids produced by one distribution run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdList {
    pub id: RecordId,
    pub ids: Vec<RecordId>,
}

/// Opaque handle to one linked distribution run.
///
/// It is the id of the association row; resolving it always yields exactly
/// the task and plan ids that were linked together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AssociationHandle(pub RecordId);

impl AssociationHandle {
    pub fn id(&self) -> RecordId {
        self.0
    }
}

impl fmt::Display for AssociationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Join row tying a goal to the id-lists of one distribution run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Association {
    pub id: RecordId,
    pub goal_id: RecordId,
    pub tasks_ids_id: RecordId,
    pub plans_ids_id: RecordId,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: DateTime<Utc>,
}

impl Association {
    pub fn handle(&self) -> AssociationHandle {
        AssociationHandle(self.id)
    }
}

/// One day's submitted point total. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEntry {
    pub id: RecordId,
    pub goal_id: RecordId,
    pub day: u32,
    pub total_points: u32,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub recorded_at: DateTime<Utc>,
}

/// A plan entry joined with its task, ready for presentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledTask {
    pub plan_id: RecordId,
    pub day: u32,
    pub task_id: RecordId,
    pub task: String,
    /// The task's declared value.
    pub base_points: u32,
    /// The value awarded for this occurrence.
    pub points: u32,
}

/// Everything one association handle resolves to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedPlan {
    pub handle: AssociationHandle,
    pub goal_id: RecordId,
    pub tasks_ids_id: RecordId,
    pub plans_ids_id: RecordId,
    /// Task ids exactly as linked.
    pub task_ids: Vec<RecordId>,
    /// Plan ids exactly as linked.
    pub plan_ids: Vec<RecordId>,
    /// Joined entries ordered by day, id-list order within a day.
    /// Restricted to one day when resolved with a day filter.
    pub entries: Vec<ScheduledTask>,
}

impl ResolvedPlan {
    /// Entries grouped by day.
    pub fn days(&self) -> BTreeMap<u32, Vec<&ScheduledTask>> {
        let mut days: BTreeMap<u32, Vec<&ScheduledTask>> = BTreeMap::new();
        for entry in &self.entries {
            days.entry(entry.day).or_default().push(entry);
        }
        days
    }

    /// Last scheduled day; the horizon when resolved without a day filter.
    pub fn horizon_days(&self) -> u32 {
        self.entries.iter().map(|e| e.day).max().unwrap_or(0)
    }

    /// Sum of awarded points over the (possibly filtered) entries.
    pub fn total_points(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.points)).sum()
    }
}

/// How a submitted completion names its task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRef {
    Id(RecordId),
    Name(String),
}

/// One task's done/not-done state for a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub task: TaskRef,
    pub done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled(plan_id: RecordId, day: u32, points: u32) -> ScheduledTask {
        ScheduledTask {
            plan_id,
            day,
            task_id: 1,
            task: "cleaning".to_string(),
            base_points: 5,
            points,
        }
    }

    #[test]
    fn task_uses_table_column_names() {
        let task = Task {
            id: 4,
            goal_id: 1,
            description: "wash dishes".to_string(),
            points: 2,
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["task"], "wash dishes");
        assert_eq!(json["point"], 2);
    }

    #[test]
    fn handle_serializes_as_bare_id() {
        let json = serde_json::to_string(&AssociationHandle(12)).unwrap();
        assert_eq!(json, "12");
        assert_eq!(AssociationHandle(12).to_string(), "12");
    }

    #[test]
    fn resolved_plan_groups_and_sums() {
        let plan = ResolvedPlan {
            handle: AssociationHandle(1),
            goal_id: 1,
            tasks_ids_id: 2,
            plans_ids_id: 3,
            task_ids: vec![1],
            plan_ids: vec![10, 11, 12],
            entries: vec![scheduled(10, 1, 3), scheduled(11, 1, 4), scheduled(12, 3, 5)],
        };

        let days = plan.days();
        assert_eq!(days.len(), 2);
        assert_eq!(days[&1].len(), 2);
        assert_eq!(plan.horizon_days(), 3);
        assert_eq!(plan.total_points(), 12);
    }
}
