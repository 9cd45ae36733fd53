use serde::{Deserialize, Serialize};

use crate::error::HydrationError;

/// Most quick-add buttons a user can configure
pub const MAX_CUSTOM_AMOUNTS: usize = 5;
/// Fewest quick-add buttons a user can configure
pub const MIN_CUSTOM_AMOUNTS: usize = 1;

/// User configuration. Source of truth for the goal and reminder fields
/// mirrored onto [`HydrationRecord`](super::hydration_record::HydrationRecord).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Daily intake target in milliliters
    pub daily_goal: u32,

    /// Minutes between repeating reminders
    #[serde(rename = "reminderInterval")]
    pub reminder_interval_minutes: u32,

    #[serde(rename = "isReminderEnabled")]
    pub reminder_enabled: bool,

    /// Quick-add volumes in milliliters, in display order
    pub custom_amounts: Vec<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_goal: 2000,
            reminder_interval_minutes: 60,
            reminder_enabled: true,
            custom_amounts: vec![250, 500, 1000],
        }
    }
}

impl Settings {
    /// Checks every bound a stored or user-supplied settings value must hold.
    pub fn validate(&self) -> Result<(), HydrationError> {
        if self.daily_goal == 0 {
            return Err(HydrationError::InvalidInput(
                "daily goal must be greater than zero".into(),
            ));
        }
        if self.reminder_interval_minutes == 0 {
            return Err(HydrationError::InvalidInput(
                "reminder interval must be greater than zero".into(),
            ));
        }

        let len = self.custom_amounts.len();
        if !(MIN_CUSTOM_AMOUNTS..=MAX_CUSTOM_AMOUNTS).contains(&len) {
            return Err(HydrationError::InvalidInput(format!(
                "expected between {MIN_CUSTOM_AMOUNTS} and {MAX_CUSTOM_AMOUNTS} custom amounts, got {len}"
            )));
        }
        if self.custom_amounts.contains(&0) {
            return Err(HydrationError::InvalidInput(
                "custom amounts must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Whether `other` differs in anything the reminder scheduler cares about
    pub fn reminder_changed(&self, other: &Settings) -> bool {
        self.reminder_enabled != other.reminder_enabled
            || self.reminder_interval_minutes != other.reminder_interval_minutes
    }

    /// Appends a quick-add amount. Returns `false` when the list is already full.
    pub fn push_custom_amount(&mut self, value: u32) -> bool {
        if self.custom_amounts.len() >= MAX_CUSTOM_AMOUNTS {
            return false;
        }

        self.custom_amounts.push(value);
        true
    }

    /// Removes the quick-add amount at `index`. Returns `false` when only one is left.
    ///
    /// The caller is expected to have bounds-checked `index`.
    pub fn remove_custom_amount(&mut self, index: usize) -> bool {
        if self.custom_amounts.len() <= MIN_CUSTOM_AMOUNTS {
            return false;
        }

        self.custom_amounts.remove(index);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.daily_goal, 2000);
        assert_eq!(settings.reminder_interval_minutes, 60);
        assert!(settings.reminder_enabled);
        assert_eq!(settings.custom_amounts, vec![250, 500, 1000]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_serializes_with_stored_field_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["dailyGoal"], 2000);
        assert_eq!(json["reminderInterval"], 60);
        assert_eq!(json["isReminderEnabled"], true);
        assert_eq!(json["customAmounts"], serde_json::json!([250, 500, 1000]));
    }

    #[test]
    fn test_validate_rejects_zero_goal() {
        let settings = Settings {
            daily_goal: 0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(HydrationError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_rejects_custom_amount_bounds() {
        let empty = Settings {
            custom_amounts: vec![],
            ..Settings::default()
        };
        assert!(empty.validate().is_err());

        let too_many = Settings {
            custom_amounts: vec![100; 6],
            ..Settings::default()
        };
        assert!(too_many.validate().is_err());

        let zero = Settings {
            custom_amounts: vec![250, 0],
            ..Settings::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_push_custom_amount_stops_at_five() {
        let mut settings = Settings::default();
        assert!(settings.push_custom_amount(250));
        assert!(settings.push_custom_amount(250));
        assert!(!settings.push_custom_amount(750));
        assert_eq!(settings.custom_amounts, vec![250, 500, 1000, 250, 250]);
    }

    #[test]
    fn test_remove_custom_amount_keeps_one() {
        let mut settings = Settings {
            custom_amounts: vec![300],
            ..Settings::default()
        };
        assert!(!settings.remove_custom_amount(0));
        assert_eq!(settings.custom_amounts, vec![300]);
    }

    #[test]
    fn test_reminder_changed_ignores_goal_and_amounts() {
        let base = Settings::default();
        let goal_only = Settings {
            daily_goal: 3000,
            custom_amounts: vec![100],
            ..base.clone()
        };
        assert!(!base.reminder_changed(&goal_only));

        let interval = Settings {
            reminder_interval_minutes: 30,
            ..base.clone()
        };
        assert!(base.reminder_changed(&interval));
    }
}
