pub mod config;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use smm_shared::clients::mongo::MongoClient;
use smm_shared::errors::AppError;
use smm_shared::middleware::metrics_middleware;

use config::{AppConfig, StorageBackend};
use services::notification_service::NotificationService;
use store::{InMemoryNotificationStore, MongoNotificationStore, NotificationStore};

pub struct AppState {
    pub config: AppConfig,
    pub notifications: NotificationService,
    pub metrics_handle: PrometheusHandle,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/api/notifications", get(routes::notifications::list_notifications))
        .route_layer(axum::middleware::from_fn(metrics_middleware))
        .fallback(route_not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn route_not_found() -> AppError {
    AppError::not_found("route not found")
}

/// Storage selected by configuration. The MongoDB client is returned alongside the
/// store so the caller can shut it down once the server has drained.
pub async fn open_store(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn NotificationStore>, Option<MongoClient>)> {
    match config.storage_backend {
        StorageBackend::Mongodb => {
            let client =
                MongoClient::connect(&config.mongodb_uri, &config.database, &config.app_name)
                    .await?;
            let store = MongoNotificationStore::new(client.clone(), &config.collection);

            // Reachability is checked once; a failure only means reads fail until it comes back.
            match store.ping().await {
                Ok(()) => tracing::info!(collection = %config.collection, "connected to MongoDB"),
                Err(e) => tracing::warn!(error = %e, "MongoDB not reachable at startup"),
            }

            let store: Arc<dyn NotificationStore> = Arc::new(store);
            Ok((store, Some(client)))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory notification store; records are lost on exit");
            let store: Arc<dyn NotificationStore> = Arc::new(InMemoryNotificationStore::new());
            Ok((store, None))
        }
    }
}
