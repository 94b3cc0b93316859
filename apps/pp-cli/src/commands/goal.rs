// goal.rs: Goal subcommands: list, accept, current.

use clap::Subcommand;
use pp_goal::{CurrentGoalPolicy, Goal, GoalStatus};
use pp_plan::wire::MessageResponse;
use pp_plan::Planner;

use super::{print_json, truncate};

#[derive(Subcommand)]
pub enum GoalCommands {
    /// List goals, newest first.
    List {
        /// Only goals with this status ("proposed" or "accepted").
        #[arg(long)]
        status: Option<String>,
    },
    /// Accept a proposed goal.
    Accept {
        /// Goal ID.
        id: i64,
    },
    /// Show the current goal.
    Current {
        /// Consider every goal, not only accepted ones.
        #[arg(long)]
        any: bool,
    },
}

pub fn execute(cmd: &GoalCommands, planner: &Planner) -> anyhow::Result<()> {
    match cmd {
        GoalCommands::List { status } => list_goals(planner, status.as_deref()),
        GoalCommands::Accept { id } => {
            let goal = planner.accept(*id)?;
            println!("Goal {} accepted: {}", goal.id, goal.name);
            print_json(&MessageResponse::accepted())
        }
        GoalCommands::Current { any } => {
            let goal = if *any {
                planner.lifecycle().current_goal(CurrentGoalPolicy::LatestAny)?
            } else {
                planner.current_goal()?
            };
            show_goal(planner, &goal)
        }
    }
}

fn parse_status(s: &str) -> anyhow::Result<GoalStatus> {
    match s {
        "proposed" => Ok(GoalStatus::Proposed),
        "accepted" => Ok(GoalStatus::Accepted),
        other => anyhow::bail!("unknown goal status {other:?} (expected proposed or accepted)"),
    }
}

fn list_goals(planner: &Planner, status: Option<&str>) -> anyhow::Result<()> {
    let goals = match status {
        Some(s) => planner.lifecycle().list_by_status(parse_status(s)?)?,
        None => planner.lifecycle().list()?,
    };

    if goals.is_empty() {
        println!("No goals found.");
        return Ok(());
    }

    println!("{:<8} {:<30} {:<10} {:<10}", "ID", "NAME", "TARGET", "STATUS");
    println!("{}", "-".repeat(60));
    for g in &goals {
        println!(
            "{:<8} {:<30} {:<10} {:<10}",
            g.id,
            truncate(&g.name, 28),
            g.target_points,
            g.status.to_string(),
        );
    }
    println!("\n{} goal(s) total.", goals.len());
    Ok(())
}

fn show_goal(planner: &Planner, goal: &Goal) -> anyhow::Result<()> {
    let earned = planner.total_points(goal.id)?;
    println!("Goal:    {}", goal.id);
    println!("Name:    {}", goal.name);
    println!("Status:  {}", goal.status);
    println!("Points:  {} / {}", earned, goal.target_points);
    println!("Created: {}", goal.created_at.to_rfc3339());
    Ok(())
}
