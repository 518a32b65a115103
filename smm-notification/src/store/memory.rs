use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use tokio::sync::RwLock;

use smm_shared::middleware::record_store_error;

use super::{NotificationStore, StoreError, StoreResult};
use crate::models::{NewNotification, Notification, RecentLimit};

/// Process-local store for development and tests.
///
/// Records are kept in insertion order; queries sort by `createdAt` descending with
/// a stable sort, so equal timestamps come back in insertion order. Flipping
/// [`InMemoryNotificationStore::set_unavailable`] makes every operation fail the way
/// an unreachable database would.
#[derive(Default)]
pub struct InMemoryNotificationStore {
    records: RwLock<Vec<Notification>>,
    unavailable: AtomicBool,
    query_calls: AtomicUsize,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `query_recent` calls that reached the store, failed or not.
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_available(&self, operation: &'static str) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            record_store_error(operation);
            return Err(StoreError::Unavailable(format!(
                "in-memory store is offline ({operation})"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, new: NewNotification) -> StoreResult<Notification> {
        let notification = new.into_notification(ObjectId::new(), Utc::now())?;
        self.check_available("insert")?;

        self.records.write().await.push(notification.clone());
        tracing::debug!(notification_id = %notification.id, "notification stored in memory");

        Ok(notification)
    }

    async fn query_recent(&self, limit: i64) -> StoreResult<Vec<Notification>> {
        let limit = RecentLimit::try_from(limit)?;
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available("query_recent")?;

        let mut records = self.records.read().await.clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(usize::try_from(limit.get()).unwrap_or(usize::MAX));

        Ok(records)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_available("ping")
    }
}
