//! # pp-plan
//!
//! The plan-distribution and association engine of pointplan.
//!
//! A goal's tasks are spread over a fixed day horizon by the
//! [`PlanDistributor`], each scheduled occurrence getting its reward from a
//! [`PointAllocator`]. Because the backing store cannot write several rows
//! atomically, the ids produced by one run are stored as id-list rows and
//! joined to the goal by an association row; the [`AssociationLinker`] hands
//! back that row's id as an [`AssociationHandle`], and every later read goes
//! through it. Daily point submissions are summed by the
//! [`ProgressAggregator`] and judged by an [`OnTrackRule`].
//!
//! [`Planner`] composes all of it into the suggest / accept / submit / check
//! flows; [`wire`] holds the JSON request and response shapes.

pub mod allocator;
pub mod config;
pub mod distributor;
pub mod error;
pub mod linker;
pub mod model;
pub mod pace;
pub mod planner;
pub mod progress;
pub mod rows;
pub mod wire;

pub use allocator::{FixedPoints, PointAllocator, PointRange, UniformPoints};
pub use config::{PlannerConfig, ProjectLayout, StoreConfig};
pub use distributor::PlanDistributor;
pub use error::{ErrorKind, PlanError};
pub use linker::AssociationLinker;
pub use model::{
    Association, AssociationHandle, Completion, IdList, PlanEntry, PlanRow, ProgressEntry,
    ResolvedPlan, ScheduledTask, Task, TaskRef, TaskSpec,
};
pub use pace::{CumulativePace, OnTrackRule, Pace, PaceSnapshot};
pub use planner::{Planner, ProgressCheck, SuggestedPlan};
pub use progress::ProgressAggregator;
