use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{info, instrument, trace, warn};

use crate::error::SchedulerError;

/// Whether the OS lets us post notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }
}

/// What a reminder says when it fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderContent {
    pub title: String,
    pub body: String,
}

impl Default for ReminderContent {
    fn default() -> Self {
        Self {
            title: "Time to Hydrate! 💧".to_string(),
            body: "Your body needs water. Take a sip to stay healthy!".to_string(),
        }
    }
}

/// Schedules local repeating reminders. Every call is best effort.
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    async fn permission_status(&self) -> PermissionStatus;

    /// Asks the user for permission if it has not been decided yet
    async fn request_permission(&self) -> PermissionStatus;

    /// Drops every scheduled reminder
    async fn cancel_all(&self) -> Result<(), SchedulerError>;

    /// Adds a reminder firing every `interval` until cancelled
    async fn schedule_repeating(
        &self,
        interval: Duration,
        content: &ReminderContent,
    ) -> Result<(), SchedulerError>;
}

/// Delivers a single notification to the user.
///
/// Called from inside the runtime, so implementations must return quickly.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, content: &ReminderContent) -> Result<(), SchedulerError>;

    fn permission_status(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn request_permission(&self) -> PermissionStatus {
        self.permission_status()
    }
}

/// Native desktop notifications
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_id: String,
}

impl DesktopNotifier {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, content: &ReminderContent) -> Result<(), SchedulerError> {
        trace!(app_id = %self.app_id, "Delivering reminder");

        #[cfg(target_os = "macos")]
        {
            mac_notification_sys::Notification::new()
                .title(&content.title)
                .message(&content.body)
                .send()
                .map_err(|e| SchedulerError::Delivery(e.to_string()))?;
        }

        #[cfg(target_os = "windows")]
        {
            winrt_notification::Toast::new(&self.app_id)
                .title(&content.title)
                .text1(&content.body)
                .duration(winrt_notification::Duration::Short)
                .show()
                .map_err(|e| SchedulerError::Delivery(e.to_string()))?;
        }

        // TODO: Deliver through a desktop notification daemon on Linux
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        info!(title = %content.title, "{}", content.body);

        Ok(())
    }
}

/// Runs each repeating reminder as a tokio task that sleeps for its
/// interval and then hands the content to a [`Notifier`].
pub struct LocalReminderScheduler<N> {
    notifier: Arc<N>,
    reminders: Mutex<Vec<JoinHandle<()>>>,
}

impl<N: Notifier> LocalReminderScheduler<N> {
    pub fn new(notifier: N) -> Self {
        Self {
            notifier: Arc::new(notifier),
            reminders: Mutex::new(Vec::new()),
        }
    }

    /// Number of repeating reminders currently alive
    pub fn active_reminders(&self) -> usize {
        self.reminders
            .lock()
            .map(|reminders| reminders.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    fn lock_reminders(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Vec<JoinHandle<()>>>, SchedulerError> {
        self.reminders
            .lock()
            .map_err(|_| SchedulerError::Delivery("reminder list lock poisoned".into()))
    }
}

#[async_trait]
impl<N: Notifier> ReminderScheduler for LocalReminderScheduler<N> {
    async fn permission_status(&self) -> PermissionStatus {
        self.notifier.permission_status()
    }

    async fn request_permission(&self) -> PermissionStatus {
        self.notifier.request_permission()
    }

    async fn cancel_all(&self) -> Result<(), SchedulerError> {
        let mut reminders = self.lock_reminders()?;
        trace!("Cancelling {} scheduled reminder(s)", reminders.len());

        for handle in reminders.drain(..) {
            handle.abort();
        }
        Ok(())
    }

    async fn schedule_repeating(
        &self,
        interval: Duration,
        content: &ReminderContent,
    ) -> Result<(), SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::Delivery(
                "reminder interval must be greater than zero".into(),
            ));
        }

        // Take the lock before spawning so every task is tracked for `cancel_all`
        let mut reminders = self.lock_reminders()?;
        reminders.push(tokio::spawn(reminder_loop(
            self.notifier.clone(),
            interval,
            content.clone(),
        )));
        drop(reminders);

        trace!("Scheduled reminder every {interval:?}");
        Ok(())
    }
}

impl<N> Drop for LocalReminderScheduler<N> {
    fn drop(&mut self) {
        if let Ok(reminders) = self.reminders.get_mut() {
            for handle in reminders.drain(..) {
                handle.abort();
            }
        }
    }
}

#[instrument(skip(notifier, content))]
async fn reminder_loop<N: Notifier>(
    notifier: Arc<N>,
    interval: Duration,
    content: ReminderContent,
) {
    loop {
        tokio::time::sleep(interval).await;

        match notifier.notify(&content) {
            Ok(()) => trace!("Reminder delivered, waiting for the next one"),
            Err(e) => warn!("Unable to deliver reminder: {e}"),
        }
    }
}

/// Scheduler for targets without local notifications (the web build).
/// Every call succeeds and does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReminderScheduler;

#[async_trait]
impl ReminderScheduler for NoopReminderScheduler {
    async fn permission_status(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn cancel_all(&self) -> Result<(), SchedulerError> {
        Ok(())
    }

    async fn schedule_repeating(
        &self,
        _interval: Duration,
        _content: &ReminderContent,
    ) -> Result<(), SchedulerError> {
        Ok(())
    }
}
