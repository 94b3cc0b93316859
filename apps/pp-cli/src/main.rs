//! # pp-cli
//!
//! Command-line front end for pointplan.
//!
//! - `pp goal list/accept/current`: inspect and accept goals
//! - `pp plan suggest/show`: create a goal with a distributed plan, view plans
//! - `pp progress submit/complete/total/check`: record and judge progress
//!
//! State lives under `<project-root>/.pp/`. JSON responses go to stdout,
//! logs to stderr.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pp_plan::ProjectLayout;
use tracing_subscriber::EnvFilter;

/// Plan a goal's tasks over the coming days and track earned points.
#[derive(Parser)]
#[command(name = "pp", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and accept goals.
    Goal {
        #[command(subcommand)]
        command: commands::goal::GoalCommands,
    },
    /// Suggest and view plans.
    Plan {
        #[command(subcommand)]
        command: commands::plan::PlanCommands,
    },
    /// Record and check progress.
    Progress {
        #[command(subcommand)]
        command: commands::progress::ProgressCommands,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("pp_plan=info".parse()?)
                .add_directive("pp_goal=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let layout = ProjectLayout::for_project(&project_root);
    let planner = commands::open_planner(&layout)?;

    match &cli.command {
        Commands::Goal { command } => commands::goal::execute(command, &planner),
        Commands::Plan { command } => commands::plan::execute(command, &planner),
        Commands::Progress { command } => commands::progress::execute(command, &planner),
    }
}
