use std::sync::Arc;

use smm_notification::config::AppConfig;
use smm_notification::services::notification_service::NotificationService;
use smm_notification::{open_store, router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    smm_shared::middleware::init_tracing("smm-notification");

    let config = AppConfig::load()?;
    let port = config.port;

    let metrics_handle = smm_shared::middleware::init_metrics()?;

    // One store handle for the whole process; every request shares it.
    let (store, mongo) = open_store(&config).await?;
    tracing::info!(backend = store.name(), "notification store ready");

    let state = Arc::new(AppState {
        notifications: NotificationService::new(store),
        config,
        metrics_handle,
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "smm-notification starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(client) = mongo {
        client.shutdown().await;
    }
    tracing::info!("smm-notification stopped");

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("shutdown signal received");
}
