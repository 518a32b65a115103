use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::{Validate, ValidationError, ValidationErrors};

/// A stored notification, as returned by `GET /api/notifications`.
///
/// Serialized field order is `_id, platform, type, url, createdAt`; `_id` is the
/// 24-char hex form of the store-assigned id and `createdAt` is ISO-8601 UTC with
/// millisecond precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", with = "object_id_hex")]
    pub id: ObjectId,
    pub platform: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub url: String,
    #[serde(rename = "createdAt", with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

/// Writer payload. `createdAt` falls back to the insertion time when absent.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewNotification {
    #[validate(length(max = 64), custom = "not_blank")]
    pub platform: String,
    #[serde(rename = "type", default)]
    #[validate(length(max = 64))]
    pub notification_type: String,
    #[validate(length(max = 2048), custom = "not_blank")]
    pub url: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewNotification {
    pub fn new(
        platform: impl Into<String>,
        notification_type: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            notification_type: notification_type.into(),
            url: url.into(),
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Validate and stamp the payload into the record that gets persisted.
    pub fn into_notification(
        self,
        id: ObjectId,
        now: DateTime<Utc>,
    ) -> Result<Notification, ValidationErrors> {
        self.validate()?;

        Ok(Notification {
            id,
            platform: self.platform,
            notification_type: self.notification_type,
            url: self.url,
            created_at: truncate_to_millis(self.created_at.unwrap_or(now)),
        })
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// The store keeps millisecond precision; anything finer would not survive a round trip.
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    let millis = ts.nanosecond() / 1_000_000 * 1_000_000;
    ts.with_nanosecond(millis).unwrap_or(ts)
}

/// How many records a recent-notifications query may return. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecentLimit(i64);

impl RecentLimit {
    pub const DEFAULT: RecentLimit = RecentLimit(10);

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Default for RecentLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for RecentLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("limit must be a positive integer, got `{0}`")]
pub struct InvalidLimit(pub String);

impl TryFrom<i64> for RecentLimit {
    type Error = InvalidLimit;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(InvalidLimit(value.to_string()));
        }
        Ok(Self(value))
    }
}

impl FromStr for RecentLimit {
    type Err = InvalidLimit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|_| InvalidLimit(s.to_string()))?;
        Self::try_from(value).map_err(|_| InvalidLimit(s.to_string()))
    }
}

mod object_id_hex {
    use super::*;

    pub fn serialize<S: Serializer>(id: &ObjectId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ObjectId, D::Error> {
        let hex = String::deserialize(deserializer)?;
        ObjectId::parse_str(&hex).map_err(serde::de::Error::custom)
    }
}

mod iso_millis {
    use super::*;

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
