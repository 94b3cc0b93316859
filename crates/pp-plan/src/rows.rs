// rows.rs: Task and plan-row persistence.
//
// Thin typed wrappers over the `tasks` and `plans` tables. Loads by id
// return maps so callers can detect which referenced rows are missing.

use std::collections::HashMap;

use pp_store::{from_record, record_from, tables, Filter, Query, RecordId, RecordStore, ID};
use serde_json::json;

use crate::error::PlanError;
use crate::model::{PlanEntry, PlanRow, Task, TaskSpec};

/// Store `specs` as tasks of `goal_id`, in order.
pub fn insert_tasks(
    store: &dyn RecordStore,
    goal_id: RecordId,
    specs: &[TaskSpec],
) -> Result<Vec<Task>, PlanError> {
    let rows = specs
        .iter()
        .map(|spec| {
            record_from(&json!({
                "goal_id": goal_id,
                "task": spec.description,
                "point": spec.points,
            }))
        })
        .collect::<Result<Vec<_>, _>>()?;

    store
        .insert(tables::TASKS, rows)?
        .into_iter()
        .map(|row| Ok(from_record(tables::TASKS, row)?))
        .collect()
}

/// Store distributed entries as plan rows, in order.
pub fn insert_plan_rows(
    store: &dyn RecordStore,
    entries: &[PlanEntry],
) -> Result<Vec<PlanRow>, PlanError> {
    let rows = entries
        .iter()
        .map(record_from)
        .collect::<Result<Vec<_>, _>>()?;

    store
        .insert(tables::PLANS, rows)?
        .into_iter()
        .map(|row| Ok(from_record(tables::PLANS, row)?))
        .collect()
}

/// Tasks with the given ids, keyed by id. Missing ids are simply absent.
pub fn load_tasks(
    store: &dyn RecordStore,
    ids: &[RecordId],
) -> Result<HashMap<RecordId, Task>, PlanError> {
    load_by_ids(store, tables::TASKS, ids)?
        .into_iter()
        .map(|task: Task| Ok((task.id, task)))
        .collect()
}

/// Plan rows with the given ids, keyed by id. Missing ids are simply absent.
pub fn load_plan_rows(
    store: &dyn RecordStore,
    ids: &[RecordId],
) -> Result<HashMap<RecordId, PlanRow>, PlanError> {
    load_by_ids(store, tables::PLANS, ids)?
        .into_iter()
        .map(|row: PlanRow| Ok((row.id, row)))
        .collect()
}

fn load_by_ids<T: serde::de::DeserializeOwned>(
    store: &dyn RecordStore,
    table: &str,
    ids: &[RecordId],
) -> Result<Vec<T>, PlanError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let query = Query::new(Filter::all().is_in(ID, ids.iter().copied()));
    store
        .select(table, &query)?
        .into_iter()
        .map(|row| Ok(from_record(table, row)?))
        .collect()
}
