//! Analytics report types produced by the fatigue analyzer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trailing aggregation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadWindow {
    Day,
    Week,
    Month,
}

impl LoadWindow {
    pub const ALL: [Self; 3] = [Self::Day, Self::Week, Self::Month];

    pub fn duration(&self) -> chrono::Duration {
        match self {
            Self::Day => chrono::Duration::days(1),
            Self::Week => chrono::Duration::days(7),
            Self::Month => chrono::Duration::days(30),
        }
    }

    /// Scaling applied to the daily listen cap for this window.
    pub fn cap_multiplier(&self) -> u64 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
        }
    }
}

/// Workload classification, ordered from best to worst so the overall
/// status is simply the maximum across windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Keeping up with demand.
    Optimal,
    /// Listening well below the incoming volume.
    Sleeping,
    /// Approaching the fatigue threshold.
    Warning,
    /// Raw listen count at or past the threshold.
    Fatigued,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::Sleeping => write!(f, "sleeping"),
            Self::Warning => write!(f, "warning"),
            Self::Fatigued => write!(f, "fatigued"),
        }
    }
}

/// Per-window load figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowLoad {
    /// Uncapped listen count.
    pub raw_listens: u64,
    /// Listen count after the per-window cap.
    pub capped_listens: u64,
    /// Tracks submitted workspace-wide in the window.
    pub demand: u64,
    /// capped / max(demand, 1) × 100; 100 when demand is zero.
    pub relative_pct: f64,
    pub status: LoadStatus,
}

/// Cognitive-load report for one staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub staff_id: Uuid,
    pub day: WindowLoad,
    pub week: WindowLoad,
    pub month: WindowLoad,
    pub overall: LoadStatus,
    pub computed_at: DateTime<Utc>,
}

impl LoadReport {
    pub fn window(&self, window: LoadWindow) -> &WindowLoad {
        match window {
            LoadWindow::Day => &self.day,
            LoadWindow::Week => &self.week,
            LoadWindow::Month => &self.month,
        }
    }
}

/// Company-wide staffing health for one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub organization_id: Uuid,
    pub staff_count: u64,
    pub active_staff_count: u64,
    /// Demos submitted in the trailing day.
    pub daily_demo_volume: u64,
    pub demos_per_staff: f64,
    /// Daily volume per head exceeds the listen cap.
    pub staffing_alert: bool,
    /// Members whose weekly raw listens meet the weekly threshold.
    pub fatigued_staff_count: u64,
    /// 0-100, higher is healthier.
    pub health_score: f64,
    pub computed_at: DateTime<Utc>,
}
