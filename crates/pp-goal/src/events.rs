// events.rs: Event model and notification dispatch.
//
// The engine emits an event at each durable step a user would care about:
// a goal was created or accepted, a plan was linked to its goal, a day's
// points were recorded. Sinks subscribe to these events. Dispatch is
// synchronous and best-effort: a failing sink is logged and skipped, it never
// fails the operation that produced the event.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pp_store::RecordId;
use serde::{Deserialize, Serialize};

use crate::error::GoalError;
use crate::goal::{Goal, GoalStatus};

/// Events emitted at key lifecycle points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PlanEvent {
    /// A new goal was proposed.
    GoalCreated {
        goal_id: RecordId,
        name: String,
        target_points: u32,
        timestamp: DateTime<Utc>,
    },

    /// A goal changed status.
    GoalStatusChanged {
        goal_id: RecordId,
        from_status: GoalStatus,
        to_status: GoalStatus,
        timestamp: DateTime<Utc>,
    },

    /// A distribution run was linked to its goal.
    PlanLinked {
        goal_id: RecordId,
        handle: RecordId,
        tasks_ids_id: RecordId,
        plans_ids_id: RecordId,
        entries: usize,
        timestamp: DateTime<Utc>,
    },

    /// A day's point total was recorded.
    ProgressRecorded {
        goal_id: RecordId,
        day: u32,
        total_points: u32,
        timestamp: DateTime<Utc>,
    },
}

impl PlanEvent {
    /// Get the event type name as a string.
    pub fn event_type(&self) -> &str {
        match self {
            PlanEvent::GoalCreated { .. } => "goal_created",
            PlanEvent::GoalStatusChanged { .. } => "goal_status_changed",
            PlanEvent::PlanLinked { .. } => "plan_linked",
            PlanEvent::ProgressRecorded { .. } => "progress_recorded",
        }
    }

    pub fn goal_created(goal: &Goal) -> Self {
        PlanEvent::GoalCreated {
            goal_id: goal.id,
            name: goal.name.clone(),
            target_points: goal.target_points,
            timestamp: Utc::now(),
        }
    }

    pub fn goal_status_changed(goal_id: RecordId, from: GoalStatus, to: GoalStatus) -> Self {
        PlanEvent::GoalStatusChanged {
            goal_id,
            from_status: from,
            to_status: to,
            timestamp: Utc::now(),
        }
    }
}

/// Receives engine events.
///
/// Implementations decide what to do with each event: append to a file,
/// forward to a webhook, and so on.
pub trait NotificationSink: Send + Sync {
    /// Handle an event. Errors are logged but don't stop the system.
    fn send(&self, event: &PlanEvent) -> Result<(), GoalError>;
}

/// Appends events as JSONL to a file.
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl NotificationSink for LogSink {
    fn send(&self, event: &PlanEvent) -> Result<(), GoalError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| GoalError::IoError {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| GoalError::IoError {
                path: self.path.display().to_string(),
                source,
            })?;

        let json = serde_json::to_string(event)?;
        writeln!(file, "{}", json).map_err(|source| GoalError::IoError {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(())
    }
}

/// Fans events out to every registered sink.
#[derive(Default)]
pub struct EventDispatcher {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    pub fn dispatch(&self, event: &PlanEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(event) {
                tracing::warn!(event = event.event_type(), "notification sink error: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn sample_goal(id: RecordId) -> Goal {
        Goal {
            id,
            name: "computer".to_string(),
            target_points: 100,
            status: GoalStatus::Proposed,
            created_at: Utc::now(),
        }
    }

    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl NotificationSink for Recorder {
        fn send(&self, event: &PlanEvent) -> Result<(), GoalError> {
            self.0.lock().unwrap().push(event.event_type().to_string());
            Ok(())
        }
    }

    struct Broken;

    impl NotificationSink for Broken {
        fn send(&self, _event: &PlanEvent) -> Result<(), GoalError> {
            Err(GoalError::NotificationError("sink offline".to_string()))
        }
    }

    #[test]
    fn events_are_tagged_by_type() {
        let event = PlanEvent::goal_created(&sample_goal(1));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"goal_created\""));

        let restored: PlanEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.event_type(), "goal_created");
    }

    #[test]
    fn log_sink_appends_one_line_per_event() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");
        let sink = LogSink::new(&path);

        sink.send(&PlanEvent::goal_created(&sample_goal(1))).unwrap();
        sink.send(&PlanEvent::goal_status_changed(
            1,
            GoalStatus::Proposed,
            GoalStatus::Accepted,
        ))
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("goal_status_changed"));
    }

    #[test]
    fn failing_sink_does_not_block_others() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_sink(Box::new(Broken));
        dispatcher.add_sink(Box::new(Recorder(Arc::clone(&seen))));

        dispatcher.dispatch(&PlanEvent::goal_created(&sample_goal(7)));

        assert_eq!(*seen.lock().unwrap(), vec!["goal_created".to_string()]);
    }
}
