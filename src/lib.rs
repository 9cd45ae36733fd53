//! Hydration tracking core: the day's intake, the user's settings and the
//! drink reminders, kept consistent and written through to local storage.

pub mod commands;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;
pub mod structs;
pub mod tasks;

pub use error::{HydrationError, SchedulerError, StorageError};
pub use state::{HydrationManager, HydrationSnapshot};
pub use structs::{reconcile, HydrationRecord, Settings};
