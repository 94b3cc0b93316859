//! Planner configuration from `.pp/planner.toml`.
//!
//! Every field has a serde default, so an empty or partial file is valid.
//!
//! ```toml
//! horizon_days = 7
//! current_goal = "latest_accepted"   # or "latest"
//!
//! [points]
//! min = 1
//! max = 5
//!
//! [store]
//! timeout_ms = 5000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use pp_goal::CurrentGoalPolicy;
use serde::{Deserialize, Serialize};

use crate::allocator::PointRange;
use crate::error::PlanError;

/// Top-level planner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Number of days one plan covers.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,

    /// Range each scheduled occurrence draws its points from.
    #[serde(default)]
    pub points: PointRange,

    /// Which goal counts as "current" when the caller names none.
    #[serde(default)]
    pub current_goal: CurrentGoalPolicy,

    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            points: PointRange::default(),
            current_goal: CurrentGoalPolicy::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// How long a store call may wait on a locked database.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

// Serde default functions
fn default_horizon_days() -> u32 {
    7
}

fn default_timeout_ms() -> u64 {
    5000
}

impl PlannerConfig {
    /// Load and validate config from `path`.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path).map_err(|e| PlanError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| PlanError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate().map_err(|e| PlanError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Load config, returning defaults if the file doesn't exist.
    ///
    /// A file that exists but can't be parsed is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, PlanError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no planner config, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.horizon_days == 0 {
            return Err(PlanError::InvalidInput(
                "horizon_days must be at least 1".to_string(),
            ));
        }
        self.points.validate()
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store.timeout_ms)
    }
}

/// Where a project keeps its planner files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub store_file: PathBuf,
    pub events_log: PathBuf,
}

impl ProjectLayout {
    /// Standard layout under `<project_root>/.pp/`.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let root = project_root.as_ref().to_path_buf();
        let pp_dir = root.join(".pp");
        Self {
            root,
            config_file: pp_dir.join("planner.toml"),
            store_file: pp_dir.join("planner.sqlite"),
            events_log: pp_dir.join("events.jsonl"),
        }
    }
}
