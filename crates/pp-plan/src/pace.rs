// pace.rs: On-track rules.

use serde::{Deserialize, Serialize};

/// What a rule looks at when judging progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaceSnapshot {
    pub target_points: u32,
    pub horizon_days: u32,
    /// The day being checked, 1-based.
    pub day: u32,
    pub earned_points: u64,
}

/// Verdict of an [`OnTrackRule`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "pace", rename_all = "snake_case")]
pub enum Pace {
    OnTrack,
    Behind { shortfall: u64 },
}

impl Pace {
    pub fn is_on_track(&self) -> bool {
        matches!(self, Pace::OnTrack)
    }
}

/// Decides whether a goal's progress is on pace.
pub trait OnTrackRule: Send + Sync {
    /// Points a goal should have earned by `snapshot.day`.
    fn expected_points(&self, snapshot: &PaceSnapshot) -> u64;

    fn evaluate(&self, snapshot: &PaceSnapshot) -> Pace {
        let expected = self.expected_points(snapshot);
        if snapshot.earned_points >= expected {
            Pace::OnTrack
        } else {
            Pace::Behind {
                shortfall: expected - snapshot.earned_points,
            }
        }
    }

    fn name(&self) -> &str;
}

/// Linear pace: by day N a goal should have `target * N / horizon` points.
#[derive(Debug, Clone, Copy, Default)]
pub struct CumulativePace;

impl OnTrackRule for CumulativePace {
    fn expected_points(&self, snapshot: &PaceSnapshot) -> u64 {
        if snapshot.horizon_days == 0 {
            return u64::from(snapshot.target_points);
        }
        let day = snapshot.day.min(snapshot.horizon_days);
        u64::from(snapshot.target_points) * u64::from(day) / u64::from(snapshot.horizon_days)
    }

    fn name(&self) -> &str {
        "cumulative"
    }
}
