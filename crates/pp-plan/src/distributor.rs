// distributor.rs: PlanDistributor, spreading a goal's tasks over a horizon.
//
// Three passes:
//   1. coverage: every day 1..=H gets one task drawn with replacement;
//   2. surplus: when there are more tasks than days, the extra
//      `len(tasks) - H` draws land on random days with random tasks;
//   3. points: every occurrence asks the allocator for its award.
// The result is a sample, not a partition: a task may appear several times
// or not at all.

use pp_goal::Goal;
use rand::{Rng, RngCore};

use crate::allocator::PointAllocator;
use crate::error::PlanError;
use crate::model::{PlanEntry, Task};

/// Produces day-indexed schedules from a task list.
pub struct PlanDistributor {
    allocator: Box<dyn PointAllocator>,
}

impl PlanDistributor {
    pub fn new(allocator: Box<dyn PointAllocator>) -> Self {
        Self { allocator }
    }

    pub fn allocator(&self) -> &dyn PointAllocator {
        self.allocator.as_ref()
    }

    /// Schedule `tasks` over days `1..=horizon_days`.
    ///
    /// Returns `horizon_days + max(0, tasks.len() - horizon_days)` entries
    /// sorted by day; every day has at least one entry.
    pub fn distribute(
        &self,
        goal: &Goal,
        tasks: &[Task],
        horizon_days: u32,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<PlanEntry>, PlanError> {
        if horizon_days == 0 {
            return Err(PlanError::InvalidInput(
                "horizon must be at least one day".to_string(),
            ));
        }
        if tasks.is_empty() {
            return Err(PlanError::InvalidInput(format!(
                "goal {} has no tasks to schedule",
                goal.id
            )));
        }

        let horizon = usize::try_from(horizon_days).unwrap_or(usize::MAX);
        let surplus = tasks.len().saturating_sub(horizon);
        let mut picks: Vec<(u32, &Task)> = Vec::with_capacity(horizon + surplus);

        for day in 1..=horizon_days {
            picks.push((day, pick(tasks, rng)));
        }
        for _ in 0..surplus {
            let day = rng.gen_range(1..=horizon_days);
            picks.push((day, pick(tasks, rng)));
        }

        let mut entries = Vec::with_capacity(picks.len());
        for (day, task) in picks {
            entries.push(PlanEntry {
                day,
                task_id: task.id,
                points: self.allocator.allocate(rng),
            });
        }
        entries.sort_by_key(|entry| entry.day);

        tracing::debug!(
            goal_id = goal.id,
            horizon_days,
            surplus,
            entries = entries.len(),
            "distributed {} task(s)",
            tasks.len()
        );
        Ok(entries)
    }
}

fn pick<'a>(tasks: &'a [Task], rng: &mut dyn RngCore) -> &'a Task {
    &tasks[rng.gen_range(0..tasks.len())]
}
