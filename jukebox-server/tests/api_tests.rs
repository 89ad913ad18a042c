//! Integration tests for jukebox-server API endpoints
//!
//! Tests cover:
//! - Validation failures (400) for every route
//! - Add / list / remove / update-status against an in-memory SQLite store
//! - Idempotent remove (second call answers 404, queue unchanged)
//! - Change signal emitted only after successful mutations
//! - Search endpoint with a fixed provider
//! - Sheet store status codes passed through on remove

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use jukebox_common::SearchResult;
use jukebox_server::search::SearchProvider;
use jukebox_server::store::{QueueStoreClient, SheetStore, SqliteStore};
use jukebox_server::{build_router, AppState, ChangeNotifier, SearchError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot` method

/// Search provider answering a fixed list, or failing
struct FixedSearch {
    results: Option<Vec<SearchResult>>,
}

#[async_trait]
impl SearchProvider for FixedSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, SearchError> {
        self.results
            .clone()
            .ok_or_else(|| SearchError::Parse("ytInitialData not found".to_string()))
    }
}

/// Test helper: app over a fresh in-memory store
async fn setup_app_with(search: FixedSearch) -> (axum::Router, ChangeNotifier) {
    let store = SqliteStore::connect("sqlite::memory:")
        .await
        .expect("Should open in-memory store");
    let notifier = ChangeNotifier::default();
    let queue = QueueStoreClient::new(Arc::new(store), notifier.clone());
    let state = AppState::new(queue, Arc::new(search));
    (build_router(state), notifier)
}

async fn setup_app() -> (axum::Router, ChangeNotifier) {
    setup_app_with(FixedSearch {
        results: Some(vec![SearchResult::new("v1", "First", "http://t/1")]),
    })
    .await
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn add(app: &axum::Router, id: &str, title: &str) -> StatusCode {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/add", json!({ "videoId": id, "title": title })))
        .await
        .unwrap();
    response.status()
}

async fn queue_ids(app: &axum::Router) -> Vec<String> {
    let response = app.clone().oneshot(request("GET", "/api/queue")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    body["queue"]
        .as_array()
        .expect("queue array")
        .iter()
        .map(|item| item["videoId"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = setup_app().await;

    let response = app.oneshot(request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "jukebox-server");
    assert_eq!(body["observers"], 0);
}

// =============================================================================
// Add / queue
// =============================================================================

#[tokio::test]
async fn test_add_then_queue_in_insertion_order() {
    let (app, _) = setup_app().await;

    assert_eq!(add(&app, "a", "A").await, StatusCode::OK);
    assert_eq!(add(&app, "b", "B").await, StatusCode::OK);
    assert_eq!(add(&app, "c", "C").await, StatusCode::OK);

    assert_eq!(queue_ids(&app).await, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_add_response_shape() {
    let (app, _) = setup_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/add",
            json!({ "videoId": "a", "title": "A", "thumbnail": "http://t/a" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert!(!body["data"].is_null());
}

#[tokio::test]
async fn test_add_missing_fields_is_400() {
    let (app, notifier) = setup_app().await;
    let mut signals = notifier.subscribe();

    let missing_title = app
        .clone()
        .oneshot(json_request("POST", "/api/add", json!({ "videoId": "a" })))
        .await
        .unwrap();
    assert_eq!(missing_title.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(missing_title.into_body()).await;
    assert!(body["error"].is_string());

    let no_body = app.clone().oneshot(request("POST", "/api/add")).await.unwrap();
    assert_eq!(no_body.status(), StatusCode::BAD_REQUEST);

    assert!(queue_ids(&app).await.is_empty());
    assert!(signals.try_recv().is_err(), "failed add must not signal");
}

#[tokio::test]
async fn test_add_signals_observers() {
    let (app, notifier) = setup_app().await;
    let mut signals = notifier.subscribe();

    add(&app, "a", "A").await;

    assert!(signals.try_recv().is_ok());
    assert!(signals.try_recv().is_err(), "exactly one signal per mutation");
}

// =============================================================================
// Remove
// =============================================================================

#[tokio::test]
async fn test_remove_missing_param_is_400() {
    let (app, _) = setup_app().await;

    let response = app.oneshot(request("DELETE", "/api/remove")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remove_twice_is_idempotent() {
    let (app, notifier) = setup_app().await;
    add(&app, "a", "A").await;
    add(&app, "b", "B").await;
    let mut signals = notifier.subscribe();

    let first = app.clone().oneshot(request("DELETE", "/api/remove?videoId=a")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(extract_json(first.into_body()).await["success"], true);
    let after_first = queue_ids(&app).await;

    // A racing peer removing the same id
    let second = app.clone().oneshot(request("DELETE", "/api/remove?videoId=a")).await.unwrap();
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
    let after_second = queue_ids(&app).await;

    assert_eq!(after_first, vec!["b"]);
    assert_eq!(after_first, after_second);

    assert!(signals.try_recv().is_ok());
    assert!(signals.try_recv().is_err(), "NotFound must not signal");
}

/// App over a sheet store whose row calls all answer `status` with `body`
async fn setup_sheet_app(status: StatusCode, body: &'static str) -> axum::Router {
    use axum::routing::delete;

    let sheet = axum::Router::new().route(
        "/rows/videoId/:id",
        delete(move || async move { (status, body) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, sheet).await.unwrap();
    });

    let store = SheetStore::new(&format!("http://{}/rows", addr), Duration::from_secs(5)).unwrap();
    let queue = QueueStoreClient::new(Arc::new(store), ChangeNotifier::default());
    let search = FixedSearch { results: Some(Vec::new()) };
    build_router(AppState::new(queue, Arc::new(search)))
}

#[tokio::test]
async fn test_remove_passes_sheet_status_through() {
    let app = setup_sheet_app(StatusCode::SERVICE_UNAVAILABLE, "sheet quota exceeded").await;

    let response = app.oneshot(request("DELETE", "/api/remove?videoId=busy")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Failed to delete song");
    assert_eq!(body["detail"], "sheet quota exceeded");
}

#[tokio::test]
async fn test_remove_sheet_missing_row_is_404() {
    let app = setup_sheet_app(StatusCode::OK, "[]").await;

    let response = app.oneshot(request("DELETE", "/api/remove?videoId=gone")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Update status
// =============================================================================

#[tokio::test]
async fn test_update_status_removes_from_pending() {
    let (app, notifier) = setup_app().await;
    add(&app, "a", "A").await;
    add(&app, "b", "B").await;
    let mut signals = notifier.subscribe();

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/api/update-status", json!({ "videoId": "a" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await["success"], true);

    assert_eq!(queue_ids(&app).await, vec!["b"]);
    assert!(signals.try_recv().is_ok());
}

#[tokio::test]
async fn test_update_status_missing_video_id_is_400() {
    let (app, _) = setup_app().await;

    let response = app
        .oneshot(json_request("PUT", "/api/update-status", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_returns_results() {
    let (app, _) = setup_app().await;

    let response = app.oneshot(request("GET", "/api/search?q=song")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["results"][0]["videoId"], "v1");
    assert_eq!(body["results"][0]["title"], "First");
    assert_eq!(body["results"][0]["thumbnail"], "http://t/1");
}

#[tokio::test]
async fn test_search_missing_query_is_400() {
    let (app, _) = setup_app().await;

    let missing = app.clone().oneshot(request("GET", "/api/search")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let empty = app.oneshot(request("GET", "/api/search?q=")).await.unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_provider_failure_is_500() {
    let (app, _) = setup_app_with(FixedSearch { results: None }).await;

    let response = app.oneshot(request("GET", "/api/search?q=song")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(extract_json(response.into_body()).await["error"], "Search failed");
}
