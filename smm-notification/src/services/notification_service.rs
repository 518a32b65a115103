use std::sync::Arc;

use smm_shared::errors::{AppError, AppResult};

use crate::models::{NewNotification, Notification, RecentLimit};
use crate::store::{NotificationStore, StoreError};

/// Message returned to clients whenever the store cannot answer.
pub const FETCH_FAILED_MESSAGE: &str = "An error occurred while fetching notifications";

/// Read path over the notification store. Every call is a fresh read; nothing is
/// cached and nothing is retried.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    /// The `limit` most recent notifications, newest first. `None` means
    /// [`RecentLimit::DEFAULT`]. A non-positive limit fails with `BadRequest`
    /// without reaching the store.
    pub async fn get_recent(&self, limit: Option<i64>) -> AppResult<Vec<Notification>> {
        let limit = match limit {
            Some(raw) => RecentLimit::try_from(raw).map_err(|e| AppError::bad_request(e.to_string()))?,
            None => RecentLimit::DEFAULT,
        };

        let notifications = self
            .store
            .query_recent(limit.get())
            .await
            .map_err(|e| read_error(self.store.name(), e))?;

        tracing::debug!(limit = %limit, returned = notifications.len(), "fetched recent notifications");
        Ok(notifications)
    }

    /// Persist a notification on behalf of a producer.
    pub async fn insert(&self, new: NewNotification) -> AppResult<Notification> {
        let notification = self.store.insert(new).await.map_err(|e| match e {
            StoreError::Validation(errors) => AppError::Validation(errors.to_string()),
            StoreError::InvalidArgument(msg) => AppError::bad_request(msg),
            StoreError::Unavailable(detail) => {
                tracing::error!(backend = self.store.name(), error = %detail, "failed to store notification");
                AppError::unavailable("An error occurred while storing the notification")
            }
        })?;

        tracing::info!(
            notification_id = %notification.id,
            platform = %notification.platform,
            notification_type = %notification.notification_type,
            "notification created"
        );

        Ok(notification)
    }
}

fn read_error(backend: &'static str, err: StoreError) -> AppError {
    match err {
        StoreError::InvalidArgument(msg) => AppError::bad_request(msg),
        StoreError::Unavailable(detail) => {
            tracing::error!(backend, error = %detail, "error fetching notifications");
            AppError::unavailable(FETCH_FAILED_MESSAGE)
        }
        // Reads never validate records; treat it like any other storage fault.
        StoreError::Validation(errors) => {
            tracing::error!(backend, error = %errors, "error fetching notifications");
            AppError::unavailable(FETCH_FAILED_MESSAGE)
        }
    }
}
