// progress.rs: Progress subcommands: submit, complete, total, check.

use std::path::PathBuf;

use clap::Subcommand;
use pp_plan::wire::{
    CheckResponse, DailyRequest, DailyTotalRequest, MessageResponse, PointsResponse,
};
use pp_plan::{AssociationHandle, Completion, Planner, ScheduledTask, TaskRef};

use super::{print_json, read_json};

#[derive(Subcommand)]
pub enum ProgressCommands {
    /// Record a day's point total for a goal.
    Submit {
        /// JSON body {"goal_id", "day", "total_points"}. Overrides the flags.
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        goal: Option<i64>,
        #[arg(long)]
        day: Option<u32>,
        #[arg(long)]
        points: Option<u32>,
    },
    /// Record a day from the tasks that were done.
    Complete {
        /// Plan handle printed by `pp plan suggest`.
        #[arg(long)]
        handle: i64,
        /// JSON body {"day", "daily": [{"task_id", "status"}]}. Overrides the flags.
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        day: Option<u32>,
        /// Task description or ID that was done. Repeatable. A value matching
        /// a description scheduled that day is a description, even if numeric.
        #[arg(long = "done")]
        done: Vec<String>,
    },
    /// Total points earned for a goal (defaults to the current goal).
    Total {
        #[arg(long)]
        goal: Option<i64>,
    },
    /// Check whether a plan is on pace as of a day.
    Check {
        /// Plan handle (defaults to the current goal's newest plan).
        #[arg(long)]
        handle: Option<i64>,
        #[arg(long)]
        day: u32,
    },
}

pub fn execute(cmd: &ProgressCommands, planner: &Planner) -> anyhow::Result<()> {
    match cmd {
        ProgressCommands::Submit {
            file,
            goal,
            day,
            points,
        } => {
            let request = match file {
                Some(path) => read_json(path)?,
                None => DailyTotalRequest {
                    goal_id: required(*goal, "--goal")?,
                    day: required(*day, "--day")?,
                    total_points: required(*points, "--points")?,
                },
            };
            planner.submit_total(request.goal_id, request.day, request.total_points)?;
            print_json(&PointsResponse {
                points: planner.total_points(request.goal_id)?,
            })
        }
        ProgressCommands::Complete {
            handle,
            file,
            day,
            done,
        } => {
            let (day, completions) = match file {
                Some(path) => {
                    let request: DailyRequest = read_json(path)?;
                    (request.day, request.completions()?)
                }
                None => {
                    let day = required(*day, "--day")?;
                    let scheduled = planner.plan(AssociationHandle(*handle), Some(day))?;
                    (day, completions_from_flags(done, &scheduled.entries))
                }
            };
            let entry = planner.submit_completions(AssociationHandle(*handle), day, &completions)?;
            println!("Day {} recorded: {} point(s).", entry.day, entry.total_points);
            print_json(&MessageResponse::received())
        }
        ProgressCommands::Total { goal } => {
            let goal_id = match goal {
                Some(id) => *id,
                None => planner.current_goal()?.id,
            };
            print_json(&PointsResponse {
                points: planner.total_points(goal_id)?,
            })
        }
        ProgressCommands::Check { handle, day } => {
            let handle = match handle {
                Some(id) => AssociationHandle(*id),
                None => planner.current_plan(None)?.handle,
            };
            let check = planner.check(handle, *day)?;
            print_json(&CheckResponse::from_check(&check))
        }
    }
}

fn required<T>(value: Option<T>, flag: &str) -> anyhow::Result<T> {
    value.ok_or_else(|| anyhow::anyhow!("{flag} is required without --file"))
}

/// Every named task is marked done. A flag is a description when one of
/// the day's tasks carries it, else a task ID when numeric.
fn completions_from_flags(done: &[String], scheduled: &[ScheduledTask]) -> Vec<Completion> {
    done.iter()
        .map(|d| {
            let d = d.trim();
            let task = if scheduled.iter().any(|e| e.task == d) {
                TaskRef::Name(d.to_string())
            } else {
                match d.parse::<i64>() {
                    Ok(id) => TaskRef::Id(id),
                    Err(_) => TaskRef::Name(d.to_string()),
                }
            };
            Completion { task, done: true }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled(task_id: i64, task: &str) -> ScheduledTask {
        ScheduledTask {
            plan_id: task_id + 100,
            day: 1,
            task_id,
            task: task.to_string(),
            base_points: 2,
            points: 2,
        }
    }

    fn done(task: TaskRef) -> Completion {
        Completion { task, done: true }
    }

    #[test]
    fn done_flags_become_completions() {
        let flags = vec!["12".to_string(), " wash dishes ".to_string()];
        assert_eq!(
            completions_from_flags(&flags, &[]),
            vec![
                done(TaskRef::Id(12)),
                done(TaskRef::Name("wash dishes".to_string())),
            ]
        );
    }

    #[test]
    fn numeric_description_scheduled_that_day_wins_over_id() {
        let day = vec![scheduled(7, "42"), scheduled(8, "cleaning")];
        let flags = vec!["42".to_string(), "7".to_string(), "cleaning".to_string()];
        assert_eq!(
            completions_from_flags(&flags, &day),
            vec![
                done(TaskRef::Name("42".to_string())),
                done(TaskRef::Id(7)),
                done(TaskRef::Name("cleaning".to_string())),
            ]
        );
    }

    #[test]
    fn missing_flag_is_named() {
        let err = required::<u32>(None, "--day").unwrap_err();
        assert!(err.to_string().contains("--day"));
    }
}
