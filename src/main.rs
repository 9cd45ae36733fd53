use std::sync::Arc;

use hydrate_sync::{
    commands::dashboard,
    config::{AppConfig, Platform, PROJECT_IDENTIFIER},
    state::HydrationManager,
    storage::{FileStore, KeyValueStore, TimeoutStore},
    tasks::notification::{
        DesktopNotifier, LocalReminderScheduler, NoopReminderScheduler, ReminderScheduler,
    },
};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(config: &AppConfig) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "hydrate-sync.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    guard
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let _log_guard = init_logging(&config);

    info!(
        data_dir = ?config.data_dir.value,
        data_dir_source = %config.data_dir.source,
        platform = ?config.platform.value,
        "Starting hydrate-sync"
    );

    let store: Arc<dyn KeyValueStore> = Arc::new(TimeoutStore::new(
        FileStore::new(config.data_dir.value.clone()),
        config.storage_timeout.value,
    ));
    let scheduler: Arc<dyn ReminderScheduler> = match config.platform.value {
        Platform::Web => Arc::new(NoopReminderScheduler),
        Platform::Mobile | Platform::Desktop => Arc::new(LocalReminderScheduler::new(
            DesktopNotifier::new(PROJECT_IDENTIFIER),
        )),
    };

    let manager = HydrationManager::new(store, scheduler);
    manager.load().await;

    let view = dashboard(&manager, chrono::Utc::now());
    info!(
        next_reminder_at = ?view.next_reminder_at,
        "{} ({})",
        view.intake_label(),
        view.progress_label()
    );

    // Reminders run on their own tasks until we are told to stop
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for shutdown signal: {e}");
    }
    info!("Shutting down");
}
