// tables.rs: Logical table names used by the engine.

/// Goal rows: name, target points, status, creation time.
pub const GOALS: &str = "goals";

/// Task rows, each owned by one goal.
pub const TASKS: &str = "tasks";

/// Id-lists of task ids produced by one distribution run.
pub const TASKS_IDS: &str = "tasks_ids";

/// Scheduled plan entries (day, task, awarded points).
pub const PLANS: &str = "plans";

/// Id-lists of plan ids produced by one distribution run.
pub const PLANS_IDS: &str = "plans_ids";

/// Association rows tying a goal to one task id-list and one plan id-list.
pub const GOALS_RELATIONS: &str = "goals_relations";

/// Append-only daily point submissions.
pub const PROGRESS: &str = "progress";
