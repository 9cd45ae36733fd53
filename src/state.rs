use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::{
    error::HydrationError,
    storage::{read_json, write_json, KeyValueStore, HYDRATION_DATA_KEY, SETTINGS_KEY},
    structs::{reconcile, HydrationRecord, Settings},
    tasks::notification::{ReminderContent, ReminderScheduler},
};

/// Everything the presentation layer renders from
#[derive(Debug, Clone, PartialEq)]
pub struct HydrationSnapshot {
    pub record: HydrationRecord,
    pub settings: Settings,
    /// `true` until [`HydrationManager::load`] has finished once
    pub is_loading: bool,
    /// Whether a repeating reminder is actually scheduled. Stays `false`
    /// while reminders are enabled but notification permission is missing.
    pub reminders_active: bool,
}

impl Default for HydrationSnapshot {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            record: HydrationRecord::new(&settings),
            settings,
            is_loading: true,
            reminders_active: false,
        }
    }
}

/// Single owner of the intake record and the settings.
///
/// Mutations are serialized through one lock and write through to the
/// [`KeyValueStore`]. Storage and scheduler failures are logged and never undo
/// the in-memory change. Reads go through a `watch` channel and never wait on
/// a running mutation.
///
/// Mutations that get their turn before [`load`](Self::load) has completed
/// are rejected with [`HydrationError::NotLoaded`].
pub struct HydrationManager {
    store: Arc<dyn KeyValueStore>,
    scheduler: Arc<dyn ReminderScheduler>,
    write_lock: Mutex<()>,
    state: watch::Sender<HydrationSnapshot>,
}

impl HydrationManager {
    pub fn new(store: Arc<dyn KeyValueStore>, scheduler: Arc<dyn ReminderScheduler>) -> Self {
        let (state, _) = watch::channel(HydrationSnapshot::default());

        Self {
            store,
            scheduler,
            write_lock: Mutex::new(()),
            state,
        }
    }

    pub fn snapshot(&self) -> HydrationSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified after every completed load or mutation
    pub fn subscribe(&self) -> watch::Receiver<HydrationSnapshot> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Share of the daily goal reached, in `[0, 100]`
    pub fn progress_percentage(&self) -> f64 {
        self.state.borrow().record.progress_percentage()
    }

    /// When the next reminder fires if reminders were (re)scheduled at `now`.
    /// `None` when no reminder is actually scheduled.
    pub fn next_reminder_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let state = self.state.borrow();
        if !state.settings.reminder_enabled || !state.reminders_active {
            return None;
        }

        Some(now + chrono::Duration::minutes(i64::from(state.settings.reminder_interval_minutes)))
    }

    /// Reads both records from storage, reconciles them and applies the
    /// reminder schedule. Settings are fully read before the record is touched.
    #[instrument(skip(self))]
    pub async fn load(&self) -> HydrationSnapshot {
        let _guard = self.write_lock.lock().await;

        let settings = self.load_settings().await;
        let record = match read_json::<HydrationRecord>(&*self.store, HYDRATION_DATA_KEY).await {
            Ok(Some(stored)) => reconcile(stored, &settings),
            Ok(None) => {
                info!("No stored hydration data, starting a fresh record");
                HydrationRecord::new(&settings)
            }
            Err(e) => {
                warn!("Unable to read hydration data, starting a fresh record: {e}");
                HydrationRecord::new(&settings)
            }
        };
        self.persist(HYDRATION_DATA_KEY, &record).await;
        info!(
            total_intake = record.total_intake,
            daily_goal = settings.daily_goal,
            "Hydration data loaded"
        );

        let reminders_active = self.apply_reminders(&settings).await;
        let snapshot = HydrationSnapshot {
            record,
            settings,
            is_loading: false,
            reminders_active,
        };
        self.state.send_replace(snapshot.clone());
        snapshot
    }

    #[instrument(skip(self))]
    pub async fn add_intake(&self, amount: u32) -> Result<HydrationRecord, HydrationError> {
        if amount == 0 {
            return Err(HydrationError::InvalidInput(
                "intake amount must be greater than zero".into(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let mut current = self.loaded_state()?;

        current.record.add_intake(amount, Utc::now());
        debug!(total_intake = current.record.total_intake, "Recorded drink");

        self.commit_record(current).await
    }

    #[instrument(skip(self))]
    pub async fn reset_daily(&self) -> Result<HydrationRecord, HydrationError> {
        let _guard = self.write_lock.lock().await;
        let mut current = self.loaded_state()?;

        current.record.reset(Utc::now());
        info!("Daily intake reset");

        self.commit_record(current).await
    }

    /// Replaces the settings wholesale. Reminders are rescheduled when the
    /// enabled flag or the interval changes, or when the scheduled state does
    /// not match the enabled flag (e.g. permission was granted since load).
    #[instrument(skip(self))]
    pub async fn update_settings(
        &self,
        settings: Settings,
    ) -> Result<HydrationSnapshot, HydrationError> {
        settings.validate()?;

        let _guard = self.write_lock.lock().await;
        let current = self.loaded_state()?;

        // Only an explicit change to the reminder fields is refused without
        // permission; a pending reschedule just retries and may stay inactive
        let reminder_changed = current.settings.reminder_changed(&settings);
        if reminder_changed && settings.reminder_enabled {
            self.ensure_permission().await?;
        }
        let reschedule =
            reminder_changed || current.reminders_active != settings.reminder_enabled;

        Ok(self.commit_settings(current, settings, reschedule).await)
    }

    /// Puts every setting back to its default value
    pub async fn reset_settings(&self) -> Result<HydrationSnapshot, HydrationError> {
        self.update_settings(Settings::default()).await
    }

    /// Appends a quick-add amount. A no-op once five are configured.
    #[instrument(skip(self))]
    pub async fn add_custom_amount(&self, value: u32) -> Result<Settings, HydrationError> {
        if value == 0 {
            return Err(HydrationError::InvalidInput(
                "custom amount must be greater than zero".into(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let current = self.loaded_state()?;

        let mut settings = current.settings.clone();
        if !settings.push_custom_amount(value) {
            debug!("Custom amounts already full, ignoring");
            return Ok(current.settings);
        }

        Ok(self.commit_settings(current, settings, false).await.settings)
    }

    /// Removes the quick-add amount at `index`. A no-op when only one is left.
    #[instrument(skip(self))]
    pub async fn remove_custom_amount(&self, index: usize) -> Result<Settings, HydrationError> {
        let _guard = self.write_lock.lock().await;
        let current = self.loaded_state()?;
        check_index(&current.settings, index)?;

        let mut settings = current.settings.clone();
        if !settings.remove_custom_amount(index) {
            debug!("Only one custom amount left, ignoring");
            return Ok(current.settings);
        }

        Ok(self.commit_settings(current, settings, false).await.settings)
    }

    #[instrument(skip(self))]
    pub async fn update_custom_amount(
        &self,
        index: usize,
        value: u32,
    ) -> Result<Settings, HydrationError> {
        if value == 0 {
            return Err(HydrationError::InvalidInput(
                "custom amount must be greater than zero".into(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let current = self.loaded_state()?;
        check_index(&current.settings, index)?;

        let mut settings = current.settings.clone();
        settings.custom_amounts[index] = value;

        Ok(self.commit_settings(current, settings, false).await.settings)
    }

    fn loaded_state(&self) -> Result<HydrationSnapshot, HydrationError> {
        let current = self.state.borrow().clone();
        if current.is_loading {
            return Err(HydrationError::NotLoaded);
        }
        Ok(current)
    }

    async fn commit_record(
        &self,
        snapshot: HydrationSnapshot,
    ) -> Result<HydrationRecord, HydrationError> {
        self.state.send_replace(snapshot.clone());
        self.persist(HYDRATION_DATA_KEY, &snapshot.record).await;
        Ok(snapshot.record)
    }

    async fn commit_settings(
        &self,
        current: HydrationSnapshot,
        settings: Settings,
        reschedule: bool,
    ) -> HydrationSnapshot {
        let mut snapshot = HydrationSnapshot {
            record: reconcile(current.record, &settings),
            settings,
            is_loading: false,
            reminders_active: current.reminders_active,
        };
        self.state.send_replace(snapshot.clone());

        self.persist(SETTINGS_KEY, &snapshot.settings).await;
        self.persist(HYDRATION_DATA_KEY, &snapshot.record).await;

        if reschedule {
            snapshot.reminders_active = self.apply_reminders(&snapshot.settings).await;
            self.state.send_replace(snapshot.clone());
        }
        snapshot
    }

    async fn load_settings(&self) -> Settings {
        match read_json::<Settings>(&*self.store, SETTINGS_KEY).await {
            Ok(Some(settings)) => match settings.validate() {
                Ok(()) => settings,
                Err(e) => {
                    warn!("Stored settings are invalid, using defaults: {e}");
                    Settings::default()
                }
            },
            Ok(None) => {
                info!("No stored settings, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!("Unable to read settings, using defaults: {e}");
                Settings::default()
            }
        }
    }

    async fn persist<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = write_json(&*self.store, key, value).await {
            error!("Unable to save {key}, keeping the change in memory only: {e}");
        }
    }

    async fn ensure_permission(&self) -> Result<(), HydrationError> {
        if self.scheduler.permission_status().await.is_granted() {
            return Ok(());
        }

        trace!("Notification permission missing, requesting it");
        if self.scheduler.request_permission().await.is_granted() {
            return Ok(());
        }

        warn!("Notification permission denied");
        Err(HydrationError::PermissionDenied)
    }

    /// Cancels every reminder, then schedules one repeating reminder if enabled.
    /// Running it twice with the same settings still leaves a single reminder.
    /// Returns whether a reminder is now scheduled.
    async fn apply_reminders(&self, settings: &Settings) -> bool {
        if let Err(e) = self.scheduler.cancel_all().await {
            warn!("Unable to cancel reminders: {e}");
        }

        if !settings.reminder_enabled {
            info!("Reminders disabled");
            return false;
        }

        if self.ensure_permission().await.is_err() {
            warn!("Reminders stay off until notification permission is granted");
            return false;
        }

        let interval = Duration::from_secs(u64::from(settings.reminder_interval_minutes) * 60);
        match self
            .scheduler
            .schedule_repeating(interval, &ReminderContent::default())
            .await
        {
            Ok(()) => {
                info!(
                    interval_minutes = settings.reminder_interval_minutes,
                    "Reminder scheduled"
                );
                true
            }
            Err(e) => {
                warn!("Unable to schedule reminder: {e}");
                false
            }
        }
    }
}

fn check_index(settings: &Settings, index: usize) -> Result<(), HydrationError> {
    let len = settings.custom_amounts.len();
    if index >= len {
        return Err(HydrationError::InvalidInput(format!(
            "custom amount index {index} out of range (have {len})"
        )));
    }
    Ok(())
}
