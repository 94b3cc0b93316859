//! # pp-goal
//!
//! Goal lifecycle management and event dispatch for pointplan.
//!
//! A [`Goal`] is the objective a plan is built around: a name and a target
//! point value. Goals start out `proposed` and move to `accepted` exactly
//! once. Which goal is "current" is decided by a [`CurrentGoalPolicy`]
//! rather than a hidden constant.
//!
//! ## Key components
//!
//! - [`Goal`], [`GoalStatus`]: the entity and its two-state machine
//! - [`GoalLifecycle`]: create / accept / list / current-goal over a
//!   [`pp_store::RecordStore`]
//! - [`PlanEvent`]: events emitted at lifecycle points
//! - [`EventDispatcher`], [`NotificationSink`], [`LogSink`]: event fan-out

pub mod error;
pub mod events;
pub mod goal;
pub mod lifecycle;

pub use error::GoalError;
pub use events::{EventDispatcher, LogSink, NotificationSink, PlanEvent};
pub use goal::{CurrentGoalPolicy, Goal, GoalStatus};
pub use lifecycle::GoalLifecycle;
