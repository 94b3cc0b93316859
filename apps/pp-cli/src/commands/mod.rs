// mod.rs: Shared setup for pp subcommands.

pub mod goal;
pub mod plan;
pub mod progress;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use pp_goal::{EventDispatcher, LogSink};
use pp_plan::{Planner, PlannerConfig, ProjectLayout};
use pp_store::{RecordStore, SqliteStore};
use serde::Serialize;

/// Build a SQLite-backed planner for the project, appending events to its log.
pub fn open_planner(layout: &ProjectLayout) -> anyhow::Result<Planner> {
    let config = PlannerConfig::load_or_default(&layout.config_file)?;
    let store: Arc<dyn RecordStore> = Arc::new(
        SqliteStore::open(&layout.store_file, config.store_timeout())
            .with_context(|| format!("opening store {}", layout.store_file.display()))?,
    );

    let mut events = EventDispatcher::new();
    events.add_sink(Box::new(LogSink::new(&layout.events_log)));

    tracing::debug!(root = %layout.root.display(), "planner ready");
    Ok(Planner::new(store, config)?.with_dispatcher(Arc::new(events)))
}

/// Read a JSON request body from `path`.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
