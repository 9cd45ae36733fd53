use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Failures of a [`KeyValueStore`](crate::storage::KeyValueStore).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Unable to (de)serialize `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Failures of a [`ReminderScheduler`](crate::tasks::notification::ReminderScheduler).
/// These are logged, never surfaced to the presentation layer.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Unable to deliver reminder: {0}")]
    Delivery(String),
}

/// Errors the state manager reports back to its caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HydrationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Notification permission is required to enable reminders")]
    PermissionDenied,

    #[error("Hydration data has not finished loading")]
    NotLoaded,
}
