// progress.rs: ProgressAggregator, daily point submissions per goal.

use std::sync::Arc;

use chrono::Utc;
use pp_store::{from_record, record_from, tables, Filter, Order, Query, RecordId, RecordStore, ID};
use serde_json::json;

use crate::error::PlanError;
use crate::model::ProgressEntry;

/// Appends daily totals and sums them.
///
/// Entries are never merged: submitting the same day twice counts twice.
#[derive(Clone)]
pub struct ProgressAggregator {
    store: Arc<dyn RecordStore>,
}

impl ProgressAggregator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn record_daily_total(
        &self,
        goal_id: RecordId,
        day: u32,
        total_points: u32,
    ) -> Result<ProgressEntry, PlanError> {
        if day == 0 {
            return Err(PlanError::InvalidInput("days are numbered from 1".to_string()));
        }
        let row = record_from(&json!({
            "goal_id": goal_id,
            "day": day,
            "total_points": total_points,
            "recorded_at": Utc::now().timestamp_micros(),
        }))?;
        let entry: ProgressEntry = from_record(tables::PROGRESS, self.store.insert_one(tables::PROGRESS, row)?)?;
        tracing::info!(goal_id, day, total_points, "recorded daily total");
        Ok(entry)
    }

    /// Every entry for `goal_id`, oldest first.
    pub fn entries(&self, goal_id: RecordId) -> Result<Vec<ProgressEntry>, PlanError> {
        let query = Query::new(Filter::all().eq("goal_id", goal_id))
            .order_by(Order::asc("recorded_at"))
            .order_by(Order::asc(ID));
        self.store
            .select(tables::PROGRESS, &query)?
            .into_iter()
            .map(|row| Ok(from_record(tables::PROGRESS, row)?))
            .collect()
    }

    pub fn total_points(&self, goal_id: RecordId) -> Result<u64, PlanError> {
        Ok(self
            .entries(goal_id)?
            .iter()
            .map(|entry| u64::from(entry.total_points))
            .sum())
    }

    /// Highest day submitted so far, 0 when nothing was submitted.
    pub fn day_reached(&self, goal_id: RecordId) -> Result<u32, PlanError> {
        Ok(self
            .entries(goal_id)?
            .iter()
            .map(|entry| entry.day)
            .max()
            .unwrap_or(0))
    }
}
