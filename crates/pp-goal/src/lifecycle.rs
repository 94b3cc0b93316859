// lifecycle.rs: GoalLifecycle, goal persistence over a RecordStore.
//
// Goals live in the `goals` table. Acceptance is a conditional update
// (`status = proposed` is part of the filter), so two racing accepts for the
// same goal cannot both succeed even though the store has no transactions.

use std::sync::Arc;

use chrono::Utc;
use pp_store::{from_record, record_from, tables, Filter, Order, Query, RecordId, RecordStore, ID};
use serde_json::json;

use crate::error::GoalError;
use crate::events::{EventDispatcher, PlanEvent};
use crate::goal::{CurrentGoalPolicy, Goal, GoalStatus};

/// Creates, accepts and looks up goals.
#[derive(Clone)]
pub struct GoalLifecycle {
    store: Arc<dyn RecordStore>,
    events: Arc<EventDispatcher>,
}

impl GoalLifecycle {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            events: Arc::new(EventDispatcher::new()),
        }
    }

    /// Route lifecycle events to `events` instead of the silent default.
    pub fn with_dispatcher(mut self, events: Arc<EventDispatcher>) -> Self {
        self.events = events;
        self
    }

    /// Propose a new goal.
    pub fn create(&self, name: &str, target_points: u32) -> Result<Goal, GoalError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GoalError::InvalidInput("goal name is empty".to_string()));
        }

        let row = record_from(&json!({
            "name": name,
            "target_points": target_points,
            "status": GoalStatus::Proposed,
            "created_at": Utc::now().timestamp_micros(),
        }))?;
        let stored = self.store.insert_one(tables::GOALS, row)?;
        let goal: Goal = from_record(tables::GOALS, stored)?;

        tracing::info!(goal_id = goal.id, "proposed goal {:?} ({} points)", goal.name, goal.target_points);
        self.events.dispatch(&PlanEvent::goal_created(&goal));
        Ok(goal)
    }

    /// Look up a goal by id.
    pub fn get(&self, goal_id: RecordId) -> Result<Option<Goal>, GoalError> {
        let query = Query::new(Filter::all().eq(ID, goal_id)).limit(1);
        let mut rows = self.store.select(tables::GOALS, &query)?;
        match rows.pop() {
            Some(row) => Ok(Some(from_record(tables::GOALS, row)?)),
            None => Ok(None),
        }
    }

    /// Look up a goal that must exist.
    pub fn require(&self, goal_id: RecordId) -> Result<Goal, GoalError> {
        self.get(goal_id)?.ok_or(GoalError::NotFound(goal_id))
    }

    /// All goals, newest first.
    pub fn list(&self) -> Result<Vec<Goal>, GoalError> {
        self.select_newest_first(Filter::all(), None)
    }

    /// Goals with the given status, newest first.
    pub fn list_by_status(&self, status: GoalStatus) -> Result<Vec<Goal>, GoalError> {
        self.select_newest_first(Filter::all().eq("status", status.as_str()), None)
    }

    /// Move a proposed goal to accepted.
    ///
    /// Fails with `InvalidTransition` if the goal was already accepted.
    pub fn accept(&self, goal_id: RecordId) -> Result<Goal, GoalError> {
        let current = self.require(goal_id)?;
        if !current.status.can_transition_to(GoalStatus::Accepted) {
            return Err(GoalError::InvalidTransition {
                goal_id,
                from: current.status,
                to: GoalStatus::Accepted,
            });
        }

        let filter = Filter::all()
            .eq(ID, goal_id)
            .eq("status", GoalStatus::Proposed.as_str());
        let patch = record_from(&json!({ "status": GoalStatus::Accepted }))?;
        let changed = self.store.update(tables::GOALS, &filter, patch)?;
        if changed == 0 {
            // Someone else accepted it between our read and our write.
            return Err(GoalError::InvalidTransition {
                goal_id,
                from: GoalStatus::Accepted,
                to: GoalStatus::Accepted,
            });
        }

        let goal = self.require(goal_id)?;
        tracing::info!(goal_id, "accepted goal {:?}", goal.name);
        self.events.dispatch(&PlanEvent::goal_status_changed(
            goal_id,
            GoalStatus::Proposed,
            GoalStatus::Accepted,
        ));
        Ok(goal)
    }

    /// The most recently created goal eligible under `policy`.
    pub fn current_goal(&self, policy: CurrentGoalPolicy) -> Result<Goal, GoalError> {
        let filter = match policy.required_status() {
            Some(status) => Filter::all().eq("status", status.as_str()),
            None => Filter::all(),
        };
        self.select_newest_first(filter, Some(1))?
            .pop()
            .ok_or(GoalError::NoCurrentGoal { policy })
    }

    fn select_newest_first(&self, filter: Filter, limit: Option<usize>) -> Result<Vec<Goal>, GoalError> {
        let mut query = Query::new(filter)
            .order_by(Order::desc("created_at"))
            .order_by(Order::desc(ID));
        query.limit = limit;
        self.store
            .select(tables::GOALS, &query)?
            .into_iter()
            .map(|row| from_record(tables::GOALS, row).map_err(GoalError::from))
            .collect()
    }
}
