use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::Collection;
use serde::{Deserialize, Serialize};

use smm_shared::clients::mongo::MongoClient;
use smm_shared::middleware::record_store_error;

use super::{NotificationStore, StoreError, StoreResult};
use crate::models::{truncate_to_millis, NewNotification, Notification, RecentLimit};

/// On-disk shape of a notification. Documents may come from external writers, so
/// every field except `_id` tolerates being absent or null.
#[derive(Debug, Serialize, Deserialize)]
struct NotificationDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    platform: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    notification_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    created_at: Option<Bson>,
}

impl NotificationDocument {
    /// `createdAt` as written, or the id's creation second when it is missing or
    /// not a date. The fallback is stable across reads.
    fn created_at(&self) -> DateTime<Utc> {
        match &self.created_at {
            Some(Bson::DateTime(dt)) => dt.to_chrono(),
            Some(Bson::String(raw)) => DateTime::parse_from_rfc3339(raw)
                .map(|ts| truncate_to_millis(ts.with_timezone(&Utc)))
                .unwrap_or_else(|_| self.id.timestamp().to_chrono()),
            _ => self.id.timestamp().to_chrono(),
        }
    }
}

impl From<Notification> for NotificationDocument {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            platform: Some(n.platform),
            notification_type: Some(n.notification_type),
            url: Some(n.url),
            created_at: Some(Bson::DateTime(bson::DateTime::from_chrono(n.created_at))),
        }
    }
}

impl From<NotificationDocument> for Notification {
    fn from(d: NotificationDocument) -> Self {
        let created_at = d.created_at();
        Self {
            id: d.id,
            platform: d.platform.unwrap_or_default(),
            notification_type: d.notification_type.unwrap_or_default(),
            url: d.url.unwrap_or_default(),
            created_at,
        }
    }
}

/// Decode a sorted window of raw documents. Documents that cannot be read at all
/// are logged and left out. The window is re-sorted by the resolved `createdAt`
/// with a stable sort, keeping the store's `_id` order for ties.
fn decode_window(documents: Vec<Document>) -> Vec<Notification> {
    let mut notifications: Vec<Notification> = documents
        .into_iter()
        .filter_map(|raw| {
            let id = raw.get("_id").cloned();
            match bson::from_document::<NotificationDocument>(raw) {
                Ok(document) => Some(Notification::from(document)),
                Err(e) => {
                    tracing::warn!(error = %e, id = ?id, "skipping unreadable notification document");
                    None
                }
            }
        })
        .collect();

    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    notifications
}

pub struct MongoNotificationStore {
    client: MongoClient,
    collection: Collection<NotificationDocument>,
}

impl MongoNotificationStore {
    pub fn new(client: MongoClient, collection: &str) -> Self {
        let collection = client.collection::<NotificationDocument>(collection);
        Self { client, collection }
    }

    fn fault(&self, operation: &'static str, err: mongodb::error::Error) -> StoreError {
        tracing::error!(
            error = %err,
            operation,
            collection = %self.collection.name(),
            "mongodb operation failed"
        );
        record_store_error(operation);
        StoreError::from(err)
    }
}

#[async_trait]
impl NotificationStore for MongoNotificationStore {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn insert(&self, new: NewNotification) -> StoreResult<Notification> {
        // Ids are issued client-side so the stored record can be returned without a re-read.
        let notification = new.into_notification(ObjectId::new(), Utc::now())?;
        let document = NotificationDocument::from(notification.clone());

        self.collection
            .insert_one(&document, None)
            .await
            .map_err(|e| self.fault("insert", e))?;

        tracing::debug!(
            notification_id = %notification.id,
            platform = %notification.platform,
            "notification stored"
        );

        Ok(notification)
    }

    async fn query_recent(&self, limit: i64) -> StoreResult<Vec<Notification>> {
        let limit = RecentLimit::try_from(limit)?;

        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": 1 })
            .limit(limit.get())
            .build();

        // Read raw documents so one malformed record cannot fail the whole window.
        let cursor = self
            .collection
            .clone_with_type::<Document>()
            .find(doc! {}, options)
            .await
            .map_err(|e| self.fault("query_recent", e))?;

        // Drain the whole window before answering; a cursor error discards what was read.
        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| self.fault("query_recent", e))?;

        Ok(decode_window(documents))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client.ping().await.map_err(|e| self.fault("ping", e))
    }
}
