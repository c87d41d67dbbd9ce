//! checkout-api binary: loads config, opens the database, starts the
//! background tasks and serves HTTP until Ctrl+C / SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use checkout_api::rate_limit::{spawn_purge_task, RateLimiter};
use checkout_api::services::notification_service::{LogNotifier, NotificationDispatcher};
use checkout_api::{router, AppState, ServerConfig, StorefrontsConfig};
use storefront_db::{Database, DbConfig};

/// How often expired rate-limit windows are dropped.
const RATE_LIMIT_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "checkout_api=info,storefront_db=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting checkout API");

    let config = ServerConfig::load().context("invalid server configuration")?;
    let storefronts = StorefrontsConfig::load(&config.storefronts_config)
        .context("invalid storefront configuration")?;

    let db = Database::new(DbConfig::new(&config.database_path))
        .await
        .context("failed to open database")?;

    // A configured storefront without a brand row can quote but not sell
    for id in storefronts.storefronts.keys() {
        if !db.brands().exists(id).await? {
            warn!(storefront_id = %id, "No brand row for configured storefront; checkout will fail");
        }
    }

    let limiter = Arc::new(RateLimiter::new());
    let (purge_shutdown_tx, purge_shutdown_rx) = mpsc::channel(1);
    let purge_task = spawn_purge_task(limiter.clone(), RATE_LIMIT_PURGE_INTERVAL, purge_shutdown_rx);

    let (dispatcher, notifications) = NotificationDispatcher::new(
        db.clone(),
        Arc::new(LogNotifier),
        config.notify_batch_size,
        config.notify_poll_interval(),
    );
    let dispatcher_task = tokio::spawn(dispatcher.run());

    let state = AppState::new(db.clone(), storefronts, limiter, notifications.clone());
    let app = router(state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "checkout API listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutting down background tasks");
    notifications.shutdown().await;
    let _ = purge_shutdown_tx.send(()).await;
    if let Err(e) = dispatcher_task.await {
        warn!(error = %e, "Notification dispatcher task failed");
    }
    if let Err(e) = purge_task.await {
        warn!(error = %e, "Rate-limit purge task failed");
    }

    db.close().await;
    info!("Checkout API stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
