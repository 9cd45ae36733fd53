use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

use super::settings::Settings;

/// Live tracking state for the current day.
///
/// `daily_goal`, `reminder_interval_minutes` and `reminder_enabled` are copies of
/// the matching [`Settings`] fields. They are never authoritative; see [`reconcile`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HydrationRecord {
    /// Amount of water drank since the last reset, in milliliters
    pub total_intake: u32,

    /// When the last drink was recorded
    #[serde(rename = "lastDrink")]
    pub last_drink_at: DateTime<Utc>,

    pub daily_goal: u32,

    #[serde(rename = "reminderInterval")]
    pub reminder_interval_minutes: u32,

    #[serde(rename = "isReminderEnabled")]
    pub reminder_enabled: bool,
}

impl Default for HydrationRecord {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl HydrationRecord {
    /// A fresh record with no intake, mirroring `settings`
    pub fn new(settings: &Settings) -> Self {
        Self {
            total_intake: 0,
            last_drink_at: Utc::now(),
            daily_goal: settings.daily_goal,
            reminder_interval_minutes: settings.reminder_interval_minutes,
            reminder_enabled: settings.reminder_enabled,
        }
    }

    pub fn add_intake(&mut self, amount: u32, at: DateTime<Utc>) {
        self.total_intake = self.total_intake.saturating_add(amount);
        self.last_drink_at = at;
    }

    pub fn reset(&mut self, at: DateTime<Utc>) {
        self.total_intake = 0;
        self.last_drink_at = at;
    }

    /// Share of the daily goal reached, clamped to `[0, 100]`.
    ///
    /// A zero goal reports 0% instead of dividing by zero.
    pub fn progress_percentage(&self) -> f64 {
        if self.daily_goal == 0 {
            return 0.0;
        }

        let percent = f64::from(self.total_intake) / f64::from(self.daily_goal) * 100.0;
        percent.min(100.0)
    }
}

/// Overwrites the mirrored fields of `record` from `settings`.
///
/// This is a full overwrite, never a merge with the record's previous values.
pub fn reconcile(mut record: HydrationRecord, settings: &Settings) -> HydrationRecord {
    record.daily_goal = settings.daily_goal;
    record.reminder_interval_minutes = settings.reminder_interval_minutes;
    record.reminder_enabled = settings.reminder_enabled;
    record
}
