// plan.rs: Plan subcommands: suggest, show.
//
// `pp plan suggest` takes either a JSON request file
//   {"goal": "computer", "goal_points": 100, "tasks": [{"task": "cleaning", "award": 5}]}
// or the same data as flags (`--goal computer --points 100 --task cleaning=5`),
// and prints the linked plan. Keep the printed `handle`; later commands
// resolve the plan through it.

use std::path::PathBuf;

use clap::Subcommand;
use pp_plan::wire::{SuggestRequest, SuggestResponse, TaskItem};
use pp_plan::{AssociationHandle, Planner, ResolvedPlan};

use super::{print_json, read_json, truncate};

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a goal and distribute its tasks over the horizon.
    Suggest {
        /// JSON request file. Overrides the other flags.
        #[arg(long)]
        file: Option<PathBuf>,
        /// What the points are saved up for.
        #[arg(long)]
        goal: Option<String>,
        /// Points needed to reach the goal.
        #[arg(long)]
        points: Option<u32>,
        /// A task as NAME=POINTS. Repeatable.
        #[arg(long = "task")]
        tasks: Vec<String>,
    },
    /// Show a plan by handle, or the current goal's newest plan.
    Show {
        #[arg(long)]
        handle: Option<i64>,
        /// Only this day.
        #[arg(long)]
        day: Option<u32>,
        /// Print the wire JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(cmd: &PlanCommands, planner: &Planner) -> anyhow::Result<()> {
    match cmd {
        PlanCommands::Suggest {
            file,
            goal,
            points,
            tasks,
        } => {
            let request = match file {
                Some(path) => read_json(path)?,
                None => request_from_flags(goal.as_deref(), *points, tasks)?,
            };
            let suggested = planner.suggest(&request)?;
            print_json(&SuggestResponse::from_plan(&suggested.plan))
        }
        PlanCommands::Show { handle, day, json } => {
            let plan = match handle {
                Some(id) => planner.plan(AssociationHandle(*id), *day)?,
                None => planner.current_plan(*day)?,
            };
            if *json {
                print_json(&SuggestResponse::from_plan(&plan))
            } else {
                print_plan(&plan);
                Ok(())
            }
        }
    }
}

fn request_from_flags(
    goal: Option<&str>,
    points: Option<u32>,
    tasks: &[String],
) -> anyhow::Result<SuggestRequest> {
    let goal = goal.ok_or_else(|| anyhow::anyhow!("--goal is required without --file"))?;
    let goal_points = points.ok_or_else(|| anyhow::anyhow!("--points is required without --file"))?;
    let tasks = tasks
        .iter()
        .map(|t| parse_task(t))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(SuggestRequest {
        goal: goal.to_string(),
        goal_points,
        tasks,
    })
}

/// Parse `NAME=POINTS`. The name may itself contain `=`.
fn parse_task(spec: &str) -> anyhow::Result<TaskItem> {
    let (name, award) = spec
        .rsplit_once('=')
        .ok_or_else(|| anyhow::anyhow!("task {spec:?} is not NAME=POINTS"))?;
    let award = award
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("task {spec:?} has non-numeric points"))?;
    Ok(TaskItem {
        task: name.trim().to_string(),
        award,
    })
}

fn print_plan(plan: &ResolvedPlan) {
    println!("Plan {} for goal {}", plan.handle, plan.goal_id);
    if plan.entries.is_empty() {
        println!("Nothing scheduled.");
        return;
    }

    println!("{:<5} {:<8} {:<30} {:<6} {:<6}", "DAY", "TASK", "DESCRIPTION", "AWARD", "BASE");
    println!("{}", "-".repeat(59));
    for (day, entries) in plan.days() {
        for e in entries {
            println!(
                "{:<5} {:<8} {:<30} {:<6} {:<6}",
                day,
                e.task_id,
                truncate(&e.task, 28),
                e.points,
                e.base_points,
            );
        }
    }
    println!("\n{} point(s) scheduled.", plan.total_points());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_flags_parse() {
        let item = parse_task("wash dishes=2").unwrap();
        assert_eq!(item.task, "wash dishes");
        assert_eq!(item.award, 2);

        let item = parse_task("a=b = 4").unwrap();
        assert_eq!(item.task, "a=b");
        assert_eq!(item.award, 4);

        assert!(parse_task("cleaning").is_err());
        assert!(parse_task("cleaning=lots").is_err());
    }

    #[test]
    fn flags_need_goal_and_points() {
        let tasks = vec!["cleaning=5".to_string()];
        assert!(request_from_flags(None, Some(10), &tasks).is_err());
        assert!(request_from_flags(Some("bike"), None, &tasks).is_err());

        let request = request_from_flags(Some("bike"), Some(10), &tasks).unwrap();
        assert_eq!(request.goal_points, 10);
        assert_eq!(request.tasks.len(), 1);
    }
}
