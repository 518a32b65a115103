use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use smm_shared::errors::AppResult;

use crate::models::Notification;
use crate::AppState;

/// GET /api/notifications
/// The ten most recent notifications, newest first. The page size is fixed;
/// query parameters such as `?limit=` are ignored.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state.notifications.get_recent(None).await?;
    Ok(Json(notifications))
}
