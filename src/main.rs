use std::{net::SocketAddr, sync::Arc};
use tokio::{fs, sync::mpsc};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use water_tracker::{
    bridge::BrowserBridge,
    clock::{Clock, SystemClock},
    notifier::{spawn_dispatch_loop, NotificationDispatcher},
    rollover::DailyRolloverWatch,
    scheduler::ReminderScheduler,
    store::RecordStore,
    AppConfig, AppState, JsonFileStore, Tracker,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let store: Arc<dyn RecordStore> = Arc::new(JsonFileStore::open(&config.data_path).await);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (fire_tx, fire_rx) = mpsc::unbounded_channel();
    let scheduler = ReminderScheduler::new(Arc::clone(&clock), fire_tx);
    let tracker = Arc::new(Tracker::new(
        config.profile_id.clone(),
        store,
        clock,
        scheduler,
    ));

    // settings must resolve before anything may persist them
    tracker.load_settings().await;
    let _ = tracker.load_today().await;

    let bridge = Arc::new(BrowserBridge::new());
    let dispatcher = Arc::new(NotificationDispatcher::new(
        bridge.clone(),
        bridge.clone(),
        bridge.clone(),
        tracker.clone(),
    ));
    let dispatch_handle = spawn_dispatch_loop(fire_rx, tracker.clone(), dispatcher);
    let rollover_handle = DailyRolloverWatch::new(tracker.clone()).spawn();

    let app = water_tracker::router(AppState::new(tracker.clone(), bridge));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(profile = %config.profile_id, data = %config.data_path.display(), "listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("shutting down");
    tracker.scheduler().shutdown();
    rollover_handle.abort();
    dispatch_handle.abort();

    Ok(())
}
