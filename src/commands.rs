use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::HydrationManager;

/// What the home screen shows, derived from the manager's current state
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub total_intake: u32,
    pub daily_goal: u32,
    /// Unrounded, in `[0, 100]`
    pub progress_percentage: f64,
    pub custom_amounts: Vec<u32>,
    pub next_reminder_at: Option<DateTime<Utc>>,
    pub is_loading: bool,
}

impl DashboardView {
    /// `"750ml / 2000ml"`
    pub fn intake_label(&self) -> String {
        format!("{}ml / {}ml", self.total_intake, self.daily_goal)
    }

    /// `"38% of daily goal"`
    pub fn progress_label(&self) -> String {
        format!("{}% of daily goal", self.progress_percentage.round())
    }
}

pub fn dashboard(manager: &HydrationManager, now: DateTime<Utc>) -> DashboardView {
    let snapshot = manager.snapshot();

    DashboardView {
        total_intake: snapshot.record.total_intake,
        daily_goal: snapshot.record.daily_goal,
        progress_percentage: snapshot.record.progress_percentage(),
        custom_amounts: snapshot.settings.custom_amounts,
        next_reminder_at: manager.next_reminder_at(now),
        is_loading: snapshot.is_loading,
    }
}
