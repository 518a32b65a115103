//! Storage adapters for notification records.
//!
//! Every adapter returns records newest first (`createdAt` descending) and breaks
//! timestamp ties by insertion order. A query either returns its full window or
//! fails; partial results are never surfaced.

use async_trait::async_trait;

use crate::models::{InvalidLimit, NewNotification, Notification};

pub mod memory;
pub mod mongo;

pub use memory::InMemoryNotificationStore;
pub use mongo::MongoNotificationStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid record: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl From<InvalidLimit> for StoreError {
    fn from(err: InvalidLimit) -> Self {
        StoreError::InvalidArgument(err.to_string())
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Short backend name used in logs and health checks.
    fn name(&self) -> &'static str;

    /// Persist a record, filling `createdAt` with the current time when absent.
    async fn insert(&self, new: NewNotification) -> StoreResult<Notification>;

    /// Up to `limit` records, newest first. `limit` must be positive.
    async fn query_recent(&self, limit: i64) -> StoreResult<Vec<Notification>>;

    async fn ping(&self) -> StoreResult<()>;
}
