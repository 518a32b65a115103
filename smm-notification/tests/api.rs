use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use smm_notification::config::{AppConfig, StorageBackend};
use smm_notification::models::{NewNotification, Notification};
use smm_notification::services::notification_service::{NotificationService, FETCH_FAILED_MESSAGE};
use smm_notification::store::InMemoryNotificationStore;
use smm_notification::{router, AppState};

fn test_config() -> AppConfig {
    AppConfig {
        port: 0,
        mongodb_uri: "mongodb://127.0.0.1:27017".to_string(),
        database: "test".to_string(),
        collection: "urls".to_string(),
        app_name: "smm-notification-test".to_string(),
        storage_backend: StorageBackend::Memory,
    }
}

fn test_app() -> (Arc<InMemoryNotificationStore>, NotificationService, Router) {
    let store = Arc::new(InMemoryNotificationStore::new());
    let notifications = NotificationService::new(store.clone());
    let state = Arc::new(AppState {
        config: test_config(),
        notifications: notifications.clone(),
        metrics_handle: smm_shared::middleware::detached_metrics_handle(),
    });
    (store, notifications, router(state))
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

async fn seed(service: &NotificationService, count: i64) -> Vec<Notification> {
    let mut out = Vec::new();
    for i in 0..count {
        let record = service
            .insert(
                NewNotification::new("twitter", "mention", format!("https://x.com/status/{i}"))
                    .with_created_at(base_time() + Duration::seconds(i)),
            )
            .await
            .unwrap();
        out.push(record);
    }
    out
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn lists_three_records_newest_first() {
    let (_, service, app) = test_app();
    let seeded = seed(&service, 3).await;

    let (status, body) = get(app, "/api/notifications").await;
    assert_eq!(status, StatusCode::OK);

    let expected: Vec<Notification> = seeded.into_iter().rev().collect();
    assert_eq!(body, serde_json::to_value(&expected).unwrap());
}

#[tokio::test]
async fn array_items_carry_wire_fields() {
    let (_, service, app) = test_app();
    let stored = seed(&service, 1).await.remove(0);

    let (_, body) = get(app, "/api/notifications").await;
    let item = &body[0];
    assert_eq!(item["_id"], stored.id.to_hex());
    assert_eq!(item["platform"], "twitter");
    assert_eq!(item["type"], "mention");
    assert_eq!(item["url"], "https://x.com/status/0");
    assert_eq!(item["createdAt"], "2024-05-01T12:00:00.000Z");
    assert_eq!(item.as_object().unwrap().len(), 5);
}

#[tokio::test]
async fn empty_store_returns_empty_array() {
    let (_, _, app) = test_app();
    let (status, body) = get(app, "/api/notifications").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(vec![]));
}

#[tokio::test]
async fn caps_at_ten_records() {
    let (_, service, app) = test_app();
    seed(&service, 14).await;

    let (status, body) = get(app, "/api/notifications").await;
    assert_eq!(status, StatusCode::OK);

    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 10);
    assert_eq!(items[0]["url"], "https://x.com/status/13");
    assert_eq!(items[9]["url"], "https://x.com/status/4");
}

#[tokio::test]
async fn limit_query_parameter_is_ignored() {
    let (store, service, app) = test_app();
    seed(&service, 12).await;

    let (status, body) = get(app.clone(), "/api/notifications?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 10);

    let (status, body) = get(app, "/api/notifications?limit=-5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 10);
    assert_eq!(store.query_calls(), 2);
}

#[tokio::test]
async fn storage_failure_is_500_with_error_only() {
    let (store, service, app) = test_app();
    seed(&service, 3).await;
    store.set_unavailable(true);

    let (status, body) = get(app, "/api/notifications").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, serde_json::json!({ "error": FETCH_FAILED_MESSAGE }));
}

#[tokio::test]
async fn recovers_once_storage_is_back() {
    let (store, service, app) = test_app();
    seed(&service, 2).await;

    store.set_unavailable(true);
    let (status, _) = get(app.clone(), "/api/notifications").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    store.set_unavailable(false);
    let (status, body) = get(app, "/api/notifications").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn repeated_requests_are_byte_identical() {
    let (_, service, app) = test_app();
    seed(&service, 5).await;

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/notifications").body(Body::empty()).unwrap())
            .await
            .unwrap();
        bodies.push(to_bytes(response.into_body(), usize::MAX).await.unwrap());
    }
    assert_eq!(bodies[0], bodies[1]);
}

#[tokio::test]
async fn concurrent_requests_see_the_same_list() {
    let (_, service, app) = test_app();
    seed(&service, 6).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { get(app, "/api/notifications").await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    assert!(results.iter().all(|(status, _)| *status == StatusCode::OK));
    assert!(results.windows(2).all(|w| w[0].1 == w[1].1));
}

#[tokio::test]
async fn health_reports_store_state() {
    let (store, _, app) = test_app();

    let (status, body) = get(app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "smm-notification-test");
    assert_eq!(body["checks"][0]["name"], "memory");

    store.set_unavailable(true);
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn unknown_route_is_404_json() {
    let (_, _, app) = test_app();
    let (status, body) = get(app, "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "route not found");
}

#[tokio::test]
async fn writes_are_not_routed() {
    let (store, _, app) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/notifications")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"platform":"twitter","url":"https://x.com/1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert!(store.is_empty().await);
}
