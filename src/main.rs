//! Resumable Countdown - a countdown timer that survives restarts and suspension
//!
//! This is the main entry point for the resumable-countdown server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use resumable_countdown::{
    config::Config,
    state::AppState,
    api::create_router,
    services::{FileStore, SystemClock},
    tasks::{frame_driver_task, visibility_recovery_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("resumable_countdown={},tower_http=info", config.log_level()))
        .init();

    info!("Starting resumable-countdown server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, seconds={}, format={}, store={}",
          config.host, config.port, config.seconds, config.format, config.store_path.display());

    // Create application state, resuming a persisted deadline if one is still running
    let store = Arc::new(FileStore::new(&config.store_path));
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.timer_options(),
        config.resend_policy(),
        Arc::new(SystemClock),
        store,
    )?);

    // Start the background tasks driving the countdown
    let frame_state = Arc::clone(&state);
    let frame_interval = config.frame_interval();
    tokio::spawn(async move {
        frame_driver_task(frame_state, frame_interval).await;
    });

    let visibility_state = Arc::clone(&state);
    tokio::spawn(async move {
        visibility_recovery_task(visibility_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start          - Start the countdown");
    info!("  POST /timer/stop           - Stop the countdown");
    info!("  POST /timer/reset          - Reset (optional {{\"seconds\": n}})");
    info!("  POST /timer/restart        - Restart (optional {{\"seconds\": n}})");
    info!("  POST /visibility/hidden    - Simulate a hidden view");
    info!("  POST /visibility/visible   - Simulate the view becoming visible");
    info!("  POST /resend               - Resend a code if the gate allows it");
    info!("  GET  /status               - Check countdown and resend status");
    info!("  GET  /health               - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
