// linker.rs: AssociationLinker, tying a goal to one distribution run.
//
// The store cannot write several rows atomically, so the link is a sequence
// of three independent inserts:
//
//   tasks_ids (ordered task ids) -> plans_ids (ordered plan ids)
//     -> goals_relations {goal_id, tasks_ids_id, plans_ids_id, created_at}
//
// The association row is written last. Until it exists nothing can reach the
// id-lists, so a failure part-way leaves orphaned lists that every read path
// ignores. The id of the association row is the handle callers keep.

use std::sync::Arc;

use chrono::Utc;
use pp_store::{from_record, record_from, tables, Filter, Order, Query, RecordId, RecordStore, ID};
use serde_json::json;

use crate::error::PlanError;
use crate::model::{Association, AssociationHandle, IdList, ResolvedPlan, ScheduledTask};
use crate::rows;

/// Writes and resolves association records.
#[derive(Clone)]
pub struct AssociationLinker {
    store: Arc<dyn RecordStore>,
}

impl AssociationLinker {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Persist the linkage for one distribution run and return its handle.
    pub fn link(
        &self,
        goal_id: RecordId,
        task_ids: &[RecordId],
        plan_ids: &[RecordId],
    ) -> Result<AssociationHandle, PlanError> {
        let tasks_ids_id = self.insert_id_list(tables::TASKS_IDS, task_ids)?;

        let plans_ids_id = match self.insert_id_list(tables::PLANS_IDS, plan_ids) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    goal_id,
                    orphan_tasks_ids = tasks_ids_id,
                    "link aborted after tasks_ids insert: {}",
                    e
                );
                return Err(e);
            }
        };

        let row = record_from(&json!({
            "goal_id": goal_id,
            "tasks_ids_id": tasks_ids_id,
            "plans_ids_id": plans_ids_id,
            "created_at": Utc::now().timestamp_micros(),
        }))?;
        let stored = match self.store.insert_one(tables::GOALS_RELATIONS, row) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(
                    goal_id,
                    orphan_tasks_ids = tasks_ids_id,
                    orphan_plans_ids = plans_ids_id,
                    "link aborted before association insert: {}",
                    e
                );
                return Err(e.into());
            }
        };
        let association: Association = from_record(tables::GOALS_RELATIONS, stored)?;

        tracing::info!(
            goal_id,
            handle = association.id,
            tasks = task_ids.len(),
            plans = plan_ids.len(),
            "linked plan to goal"
        );
        Ok(association.handle())
    }

    /// Load the association behind `handle`.
    pub fn association(&self, handle: AssociationHandle) -> Result<Association, PlanError> {
        let query = Query::new(Filter::all().eq(ID, handle.id())).limit(1);
        match self.store.select(tables::GOALS_RELATIONS, &query)?.pop() {
            Some(row) => Ok(from_record(tables::GOALS_RELATIONS, row)?),
            None => Err(PlanError::NotFound(format!("association {handle}"))),
        }
    }

    /// Resolve a handle into its joined plan, optionally restricted to `day`.
    pub fn resolve(
        &self,
        handle: AssociationHandle,
        day: Option<u32>,
    ) -> Result<ResolvedPlan, PlanError> {
        let association = self.association(handle)?;
        let task_ids = self.load_id_list(tables::TASKS_IDS, association.tasks_ids_id)?;
        let plan_ids = self.load_id_list(tables::PLANS_IDS, association.plans_ids_id)?;

        let plan_rows = rows::load_plan_rows(self.store.as_ref(), &plan_ids)?;
        let mut referenced: Vec<RecordId> = task_ids.clone();
        referenced.extend(plan_rows.values().map(|row| row.task_id));
        referenced.sort_unstable();
        referenced.dedup();
        let tasks = rows::load_tasks(self.store.as_ref(), &referenced)?;

        if let Some(missing) = task_ids.iter().find(|id| !tasks.contains_key(*id)) {
            return Err(PlanError::DanglingReference {
                table: tables::TASKS,
                id: *missing,
            });
        }

        let mut entries = Vec::with_capacity(plan_ids.len());
        for plan_id in &plan_ids {
            let row = plan_rows.get(plan_id).ok_or(PlanError::DanglingReference {
                table: tables::PLANS,
                id: *plan_id,
            })?;
            if day.is_some_and(|d| d != row.day) {
                continue;
            }
            let task = tasks.get(&row.task_id).ok_or(PlanError::DanglingReference {
                table: tables::TASKS,
                id: row.task_id,
            })?;
            entries.push(ScheduledTask {
                plan_id: row.id,
                day: row.day,
                task_id: task.id,
                task: task.description.clone(),
                base_points: task.points,
                points: row.points,
            });
        }
        entries.sort_by_key(|entry| entry.day);

        Ok(ResolvedPlan {
            handle,
            goal_id: association.goal_id,
            tasks_ids_id: association.tasks_ids_id,
            plans_ids_id: association.plans_ids_id,
            task_ids,
            plan_ids,
            entries,
        })
    }

    /// Handle of the most recently linked run for `goal_id`.
    pub fn latest_handle(&self, goal_id: RecordId) -> Result<AssociationHandle, PlanError> {
        let query = Query::new(Filter::all().eq("goal_id", goal_id))
            .order_by(Order::desc("created_at"))
            .order_by(Order::desc(ID))
            .limit(1);
        match self.store.select(tables::GOALS_RELATIONS, &query)?.pop() {
            Some(row) => {
                let association: Association = from_record(tables::GOALS_RELATIONS, row)?;
                Ok(association.handle())
            }
            None => Err(PlanError::NotFound(format!("no plan linked to goal {goal_id}"))),
        }
    }

    /// Recency fallback: resolve the newest run linked to `goal_id`.
    pub fn resolve_current_plan(
        &self,
        goal_id: RecordId,
        day: Option<u32>,
    ) -> Result<ResolvedPlan, PlanError> {
        let handle = self.latest_handle(goal_id)?;
        tracing::debug!(goal_id, %handle, "resolving plan by recency");
        self.resolve(handle, day)
    }

    fn insert_id_list(&self, table: &'static str, ids: &[RecordId]) -> Result<RecordId, PlanError> {
        let stored = self
            .store
            .insert_one(table, record_from(&json!({ "ids": ids }))?)?;
        let list: IdList = from_record(table, stored)?;
        Ok(list.id)
    }

    fn load_id_list(&self, table: &'static str, id: RecordId) -> Result<Vec<RecordId>, PlanError> {
        let query = Query::new(Filter::all().eq(ID, id)).limit(1);
        match self.store.select(table, &query)?.pop() {
            Some(row) => Ok(from_record::<IdList>(table, row)?.ids),
            None => Err(PlanError::DanglingReference { table, id }),
        }
    }
}
