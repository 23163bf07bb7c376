use std::sync::Arc;

use anyhow::Context;

use heyreminder_core::alarm::{LogNotificationPresenter, TokioAlarmBackend};
use heyreminder_core::appsettings::AppSettings;
use heyreminder_core::scheduler::ReminderScheduler;
use heyreminder_core::storage::InMemoryReminderStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::load().context("Failed to load settings")?;
    let timezone = settings.timezone()?;
    log::info!("Scheduling reminders in {timezone}");

    let storage = Arc::new(InMemoryReminderStorage::new());
    let (backend, fired_rx) = TokioAlarmBackend::new(64);
    let presenter = Arc::new(LogNotificationPresenter);
    let scheduler = Arc::new(ReminderScheduler::new(
        Arc::clone(&storage),
        backend,
        presenter,
        timezone,
    ));

    // Registered alarms do not survive a restart; re-derive them all.
    scheduler.bootstrap().await?;

    let fire_loop = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.run(fired_rx).await })
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    log::info!("Shutting down");
    fire_loop.abort();

    Ok(())
}
