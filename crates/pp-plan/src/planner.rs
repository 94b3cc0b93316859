// planner.rs: Planner, the facade callers drive.
//
// Composes goal lifecycle, distribution, linking, progress and pace into the
// suggest / accept / submit / check flows. Holds no state of its own besides
// the store and configuration.

use std::collections::HashSet;
use std::sync::Arc;

use pp_goal::{EventDispatcher, Goal, GoalLifecycle, PlanEvent};
use pp_store::{RecordId, RecordStore};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;

use crate::allocator::{PointAllocator, UniformPoints};
use crate::config::PlannerConfig;
use crate::distributor::PlanDistributor;
use crate::error::PlanError;
use crate::linker::AssociationLinker;
use crate::model::{
    AssociationHandle, Completion, PlanEntry, ProgressEntry, ResolvedPlan, Task, TaskRef,
};
use crate::pace::{CumulativePace, OnTrackRule, Pace, PaceSnapshot};
use crate::progress::ProgressAggregator;
use crate::rows;
use crate::wire::SuggestRequest;

/// A freshly created goal and the plan linked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedPlan {
    pub goal: Goal,
    pub plan: ResolvedPlan,
}

/// Outcome of an on-track check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressCheck {
    pub goal_id: RecordId,
    pub day: u32,
    pub earned: u64,
    pub expected: u64,
    pub pace: Pace,
    /// Unsaved redistribution over the remaining days when behind.
    pub adjusted_plan: Vec<PlanEntry>,
    /// Tasks the adjusted plan draws from.
    pub tasks: Vec<Task>,
}

pub struct Planner {
    store: Arc<dyn RecordStore>,
    config: PlannerConfig,
    lifecycle: GoalLifecycle,
    distributor: PlanDistributor,
    linker: AssociationLinker,
    progress: ProgressAggregator,
    rule: Box<dyn OnTrackRule>,
    events: Arc<EventDispatcher>,
}

impl Planner {
    /// Build a planner with the configured point range and the linear pace rule.
    pub fn new(store: Arc<dyn RecordStore>, config: PlannerConfig) -> Result<Self, PlanError> {
        config.validate()?;
        let allocator = UniformPoints::new(config.points)?;
        let events = Arc::new(EventDispatcher::new());
        Ok(Self {
            lifecycle: GoalLifecycle::new(store.clone()).with_dispatcher(events.clone()),
            distributor: PlanDistributor::new(Box::new(allocator)),
            linker: AssociationLinker::new(store.clone()),
            progress: ProgressAggregator::new(store.clone()),
            rule: Box::new(CumulativePace),
            events,
            store,
            config,
        })
    }

    pub fn with_allocator(mut self, allocator: Box<dyn PointAllocator>) -> Self {
        self.distributor = PlanDistributor::new(allocator);
        self
    }

    pub fn with_rule(mut self, rule: Box<dyn OnTrackRule>) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_dispatcher(mut self, events: Arc<EventDispatcher>) -> Self {
        self.lifecycle = GoalLifecycle::new(self.store.clone()).with_dispatcher(events.clone());
        self.events = events;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &GoalLifecycle {
        &self.lifecycle
    }

    pub fn progress(&self) -> &ProgressAggregator {
        &self.progress
    }

    /// Create a goal with its tasks, distribute them and link the result.
    pub fn suggest(&self, request: &SuggestRequest) -> Result<SuggestedPlan, PlanError> {
        self.suggest_with_rng(request, &mut StdRng::from_entropy())
    }

    pub fn suggest_with_rng(
        &self,
        request: &SuggestRequest,
        rng: &mut dyn RngCore,
    ) -> Result<SuggestedPlan, PlanError> {
        request.validate()?;

        let goal = self.lifecycle.create(&request.goal, request.goal_points)?;
        let handle = match self.build_plan(&goal, request, rng) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(
                    orphan_goal_id = goal.id,
                    "suggest aborted after goal insert, goal has no plan: {}",
                    e
                );
                return Err(e);
            }
        };

        let plan = self.linker.resolve(handle, None)?;
        self.events.dispatch(&PlanEvent::PlanLinked {
            goal_id: goal.id,
            handle: handle.id(),
            tasks_ids_id: plan.tasks_ids_id,
            plans_ids_id: plan.plans_ids_id,
            entries: plan.entries.len(),
            timestamp: chrono::Utc::now(),
        });
        Ok(SuggestedPlan { goal, plan })
    }

    /// Store tasks and plan rows for a fresh goal and link them.
    fn build_plan(
        &self,
        goal: &Goal,
        request: &SuggestRequest,
        rng: &mut dyn RngCore,
    ) -> Result<AssociationHandle, PlanError> {
        let store = self.store.as_ref();
        let tasks = rows::insert_tasks(store, goal.id, &request.task_specs())?;
        let entries = self
            .distributor
            .distribute(goal, &tasks, self.config.horizon_days, rng)?;
        let plan_rows = rows::insert_plan_rows(store, &entries)?;

        let task_ids: Vec<RecordId> = tasks.iter().map(|t| t.id).collect();
        let plan_ids: Vec<RecordId> = plan_rows.iter().map(|p| p.id).collect();
        self.linker.link(goal.id, &task_ids, &plan_ids)
    }

    pub fn accept(&self, goal_id: RecordId) -> Result<Goal, PlanError> {
        Ok(self.lifecycle.accept(goal_id)?)
    }

    /// The current goal under the configured policy.
    pub fn current_goal(&self) -> Result<Goal, PlanError> {
        Ok(self.lifecycle.current_goal(self.config.current_goal)?)
    }

    /// Resolve a plan by the handle returned from [`Planner::suggest`].
    pub fn plan(&self, handle: AssociationHandle, day: Option<u32>) -> Result<ResolvedPlan, PlanError> {
        self.linker.resolve(handle, day)
    }

    /// Newest plan of the current goal.
    pub fn current_plan(&self, day: Option<u32>) -> Result<ResolvedPlan, PlanError> {
        let goal = self.current_goal()?;
        self.linker.resolve_current_plan(goal.id, day)
    }

    /// Record a day's point total for an existing goal.
    pub fn submit_total(
        &self,
        goal_id: RecordId,
        day: u32,
        total_points: u32,
    ) -> Result<ProgressEntry, PlanError> {
        self.lifecycle.require(goal_id)?;
        let entry = self.progress.record_daily_total(goal_id, day, total_points)?;
        self.events.dispatch(&PlanEvent::ProgressRecorded {
            goal_id,
            day,
            total_points,
            timestamp: entry.recorded_at,
        });
        Ok(entry)
    }

    /// Record a day's total from per-task completion flags.
    ///
    /// Every occurrence on `day` of a task marked done counts once, however
    /// many times the task is listed. A description names every task that
    /// carries it.
    pub fn submit_completions(
        &self,
        handle: AssociationHandle,
        day: u32,
        completions: &[Completion],
    ) -> Result<ProgressEntry, PlanError> {
        if day == 0 {
            return Err(PlanError::InvalidInput("days are numbered from 1".to_string()));
        }
        let plan = self.linker.resolve(handle, Some(day))?;

        let mut done: HashSet<RecordId> = HashSet::new();
        for completion in completions {
            // A description may be shared by several tasks; it names all of them.
            let matched: Vec<RecordId> = plan
                .entries
                .iter()
                .filter(|entry| match &completion.task {
                    TaskRef::Id(id) => entry.task_id == *id,
                    TaskRef::Name(name) => entry.task == *name,
                })
                .map(|entry| entry.task_id)
                .collect();
            if matched.is_empty() {
                return Err(PlanError::InvalidInput(format!(
                    "task {} is not scheduled on day {day}",
                    describe(&completion.task)
                )));
            }
            if completion.done {
                done.extend(matched);
            }
        }

        let earned: u64 = plan
            .entries
            .iter()
            .filter(|entry| done.contains(&entry.task_id))
            .map(|entry| u64::from(entry.points))
            .sum();
        let total = u32::try_from(earned)
            .map_err(|_| PlanError::InvalidInput(format!("day total {earned} is too large")))?;
        self.submit_total(plan.goal_id, day, total)
    }

    pub fn total_points(&self, goal_id: RecordId) -> Result<u64, PlanError> {
        self.progress.total_points(goal_id)
    }

    /// Judge progress of the plan behind `handle` as of `day`.
    pub fn check(&self, handle: AssociationHandle, day: u32) -> Result<ProgressCheck, PlanError> {
        self.check_with_rng(handle, day, &mut StdRng::from_entropy())
    }

    pub fn check_with_rng(
        &self,
        handle: AssociationHandle,
        day: u32,
        rng: &mut dyn RngCore,
    ) -> Result<ProgressCheck, PlanError> {
        if day == 0 {
            return Err(PlanError::InvalidInput("days are numbered from 1".to_string()));
        }
        let plan = self.linker.resolve(handle, None)?;
        let goal = self.lifecycle.require(plan.goal_id)?;
        let horizon_days = plan.horizon_days();
        let earned = self.progress.total_points(goal.id)?;

        let snapshot = PaceSnapshot {
            target_points: goal.target_points,
            horizon_days,
            day,
            earned_points: earned,
        };
        let expected = self.rule.expected_points(&snapshot);
        let pace = self.rule.evaluate(&snapshot);

        let mut tasks = Vec::new();
        let mut adjusted_plan = Vec::new();
        if !pace.is_on_track() && day < horizon_days {
            let loaded = rows::load_tasks(self.store.as_ref(), &plan.task_ids)?;
            tasks = plan
                .task_ids
                .iter()
                .filter_map(|id| loaded.get(id).cloned())
                .collect();
            adjusted_plan = self
                .distributor
                .distribute(&goal, &tasks, horizon_days - day, rng)?;
            for entry in &mut adjusted_plan {
                entry.day += day;
            }
        }

        tracing::info!(
            goal_id = goal.id,
            %handle,
            day,
            earned,
            expected,
            rule = self.rule.name(),
            "checked progress: {:?}",
            pace
        );
        Ok(ProgressCheck {
            goal_id: goal.id,
            day,
            earned,
            expected,
            pace,
            adjusted_plan,
            tasks,
        })
    }
}

fn describe(task: &TaskRef) -> String {
    match task {
        TaskRef::Id(id) => format!("#{id}"),
        TaskRef::Name(name) => format!("{name:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pp_goal::{CurrentGoalPolicy, GoalError, GoalStatus};
    use pp_store::{tables, Filter, MemoryStore, Query, Record, StoreError};

    use crate::allocator::FixedPoints;
    use crate::model::TaskSpec;
    use crate::wire::TaskItem;

    /// Delegates to a MemoryStore but refuses inserts into one table.
    struct FailingStore {
        inner: MemoryStore,
        fail_table: &'static str,
    }

    impl RecordStore for FailingStore {
        fn insert(&self, table: &str, rows: Vec<Record>) -> Result<Vec<Record>, StoreError> {
            if table == self.fail_table {
                return Err(StoreError::Backend(format!("{table} is read-only")));
            }
            self.inner.insert(table, rows)
        }

        fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
            self.inner.select(table, query)
        }

        fn update(&self, table: &str, filter: &Filter, patch: Record) -> Result<usize, StoreError> {
            self.inner.update(table, filter, patch)
        }
    }

    fn planner() -> Planner {
        Planner::new(Arc::new(MemoryStore::new()), PlannerConfig::default()).unwrap()
    }

    fn request(goal: &str, points: u32, tasks: &[(&str, u32)]) -> SuggestRequest {
        SuggestRequest {
            goal: goal.to_string(),
            goal_points: points,
            tasks: tasks
                .iter()
                .map(|(task, award)| TaskItem {
                    task: task.to_string(),
                    award: *award,
                })
                .collect(),
        }
    }

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(17)
    }

    #[test]
    fn suggest_links_a_full_horizon() {
        let planner = planner();
        let suggested = planner
            .suggest_with_rng(
                &request("computer", 100, &[("cleaning", 5), ("wash dishes", 2)]),
                &mut seeded(),
            )
            .unwrap();

        assert_eq!(suggested.goal.status, GoalStatus::Proposed);
        assert_eq!(suggested.plan.goal_id, suggested.goal.id);
        assert_eq!(suggested.plan.task_ids.len(), 2);
        assert_eq!(suggested.plan.entries.len(), 7);
        assert_eq!(suggested.plan.horizon_days(), 7);
        assert_eq!(planner.plan(suggested.plan.handle, None).unwrap(), suggested.plan);
    }

    #[test]
    fn suggest_rejects_empty_tasks_before_writing() {
        let planner = planner();
        let err = planner.suggest(&request("computer", 100, &[])).unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput(_)));
        assert!(planner.lifecycle().list().unwrap().is_empty());
    }

    #[test]
    fn current_plan_follows_accepted_goal() {
        let planner = planner();
        let first = planner
            .suggest_with_rng(&request("computer", 100, &[("cleaning", 5)]), &mut seeded())
            .unwrap();
        planner
            .suggest_with_rng(&request("bike", 50, &[("laundry", 3)]), &mut seeded())
            .unwrap();

        assert!(matches!(
            planner.current_plan(None),
            Err(PlanError::Goal(GoalError::NoCurrentGoal { .. }))
        ));
        planner.accept(first.goal.id).unwrap();
        assert_eq!(planner.current_goal().unwrap().id, first.goal.id);
        assert_eq!(planner.current_plan(None).unwrap().handle, first.plan.handle);
    }

    #[test]
    fn latest_policy_picks_newest_goal() {
        let config = PlannerConfig {
            current_goal: CurrentGoalPolicy::LatestAny,
            ..PlannerConfig::default()
        };
        let planner = Planner::new(Arc::new(MemoryStore::new()), config).unwrap();
        planner
            .suggest_with_rng(&request("computer", 100, &[("cleaning", 5)]), &mut seeded())
            .unwrap();
        let newer = planner
            .suggest_with_rng(&request("bike", 50, &[("laundry", 3)]), &mut seeded())
            .unwrap();
        assert_eq!(planner.current_goal().unwrap().id, newer.goal.id);
    }

    #[test]
    fn submit_total_requires_an_existing_goal() {
        let planner = planner();
        let err = planner.submit_total(42, 1, 5).unwrap_err();
        assert_eq!(err.kind().http_status(), 404);
    }

    #[test]
    fn completions_sum_awarded_points_of_done_tasks() {
        let planner = planner().with_allocator(Box::new(FixedPoints(3)));
        let suggested = planner
            .suggest_with_rng(&request("computer", 100, &[("cleaning", 5)]), &mut seeded())
            .unwrap();
        let handle = suggested.plan.handle;
        let task_id = suggested.plan.task_ids[0];

        let done = [
            Completion {
                task: TaskRef::Id(task_id),
                done: true,
            },
            Completion {
                task: TaskRef::Name("cleaning".to_string()),
                done: true,
            },
        ];
        let entry = planner.submit_completions(handle, 1, &done).unwrap();
        assert_eq!(entry.total_points, 3);

        let skipped = [Completion {
            task: TaskRef::Id(task_id),
            done: false,
        }];
        assert_eq!(planner.submit_completions(handle, 2, &skipped).unwrap().total_points, 0);
        assert_eq!(planner.total_points(suggested.goal.id).unwrap(), 3);
    }

    #[test]
    fn completion_for_unscheduled_task_is_invalid() {
        let planner = planner();
        let suggested = planner
            .suggest_with_rng(&request("computer", 100, &[("cleaning", 5)]), &mut seeded())
            .unwrap();
        let unknown = [Completion {
            task: TaskRef::Name("juggling".to_string()),
            done: true,
        }];
        let err = planner
            .submit_completions(suggested.plan.handle, 1, &unknown)
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput(_)));
        assert_eq!(planner.total_points(suggested.goal.id).unwrap(), 0);
    }

    #[test]
    fn check_on_track_has_no_adjustment() {
        let planner = planner();
        let suggested = planner
            .suggest_with_rng(&request("computer", 70, &[("cleaning", 5)]), &mut seeded())
            .unwrap();
        planner.submit_total(suggested.goal.id, 1, 10).unwrap();
        planner.submit_total(suggested.goal.id, 2, 25).unwrap();

        let check = planner.check_with_rng(suggested.plan.handle, 3, &mut seeded()).unwrap();
        assert_eq!(check.expected, 30);
        assert_eq!(check.earned, 35);
        assert_eq!(check.pace, Pace::OnTrack);
        assert!(check.adjusted_plan.is_empty());
    }

    #[test]
    fn check_behind_redistributes_remaining_days() {
        let planner = planner();
        let suggested = planner
            .suggest_with_rng(
                &request("computer", 70, &[("cleaning", 5), ("wash dishes", 2)]),
                &mut seeded(),
            )
            .unwrap();
        planner.submit_total(suggested.goal.id, 1, 4).unwrap();

        let check = planner.check_with_rng(suggested.plan.handle, 3, &mut seeded()).unwrap();
        assert_eq!(check.pace, Pace::Behind { shortfall: 26 });
        let days: Vec<u32> = check.adjusted_plan.iter().map(|e| e.day).collect();
        assert_eq!(days, vec![4, 5, 6, 7]);
        assert_eq!(check.tasks.len(), 2);

        // Nothing was stored for the adjustment.
        assert_eq!(planner.plan(suggested.plan.handle, None).unwrap(), suggested.plan);
    }

    #[test]
    fn check_on_last_day_never_adjusts() {
        let planner = planner();
        let suggested = planner
            .suggest_with_rng(&request("computer", 70, &[("cleaning", 5)]), &mut seeded())
            .unwrap();
        let check = planner.check_with_rng(suggested.plan.handle, 7, &mut seeded()).unwrap();
        assert!(!check.pace.is_on_track());
        assert!(check.adjusted_plan.is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PlannerConfig {
            horizon_days: 0,
            ..PlannerConfig::default()
        };
        assert!(Planner::new(Arc::new(MemoryStore::new()), config).is_err());
    }

    #[test]
    fn shared_description_credits_every_task_carrying_it() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let planner = Planner::new(store.clone(), PlannerConfig::default()).unwrap();
        let goal = planner.lifecycle().create("computer", 100).unwrap();
        let tasks = rows::insert_tasks(
            store.as_ref(),
            goal.id,
            &[TaskSpec::new("cleaning", 1), TaskSpec::new("cleaning", 1)],
        )
        .unwrap();
        let entries: Vec<PlanEntry> = tasks
            .iter()
            .map(|t| PlanEntry {
                day: 1,
                task_id: t.id,
                points: 3,
            })
            .collect();
        let plan_rows = rows::insert_plan_rows(store.as_ref(), &entries).unwrap();
        let handle = AssociationLinker::new(store.clone())
            .link(
                goal.id,
                &tasks.iter().map(|t| t.id).collect::<Vec<_>>(),
                &plan_rows.iter().map(|p| p.id).collect::<Vec<_>>(),
            )
            .unwrap();

        let done = [Completion {
            task: TaskRef::Name("cleaning".to_string()),
            done: true,
        }];
        let entry = planner.submit_completions(handle, 1, &done).unwrap();
        assert_eq!(entry.total_points, 6);
    }

    #[test]
    fn failed_plan_write_leaves_goal_without_plan() {
        let store = Arc::new(FailingStore {
            inner: MemoryStore::new(),
            fail_table: tables::PLANS,
        });
        let planner = Planner::new(store, PlannerConfig::default()).unwrap();

        let err = planner
            .suggest_with_rng(&request("computer", 100, &[("cleaning", 5)]), &mut seeded())
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::StoreFailure);

        let goals = planner.lifecycle().list().unwrap();
        assert_eq!(goals.len(), 1);
        assert!(matches!(
            planner.linker.latest_handle(goals[0].id),
            Err(PlanError::NotFound(_))
        ));
    }
}
