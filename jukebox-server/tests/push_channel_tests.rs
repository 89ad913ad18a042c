//! End-to-end push channel tests over a real socket
//!
//! A mutation made through the HTTP router must reach every open WebSocket
//! observer as one `{"type":"queue_updated"}` frame, and an observer going away
//! must not disturb delivery to the others.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use futures::{SinkExt, StreamExt};
use jukebox_common::SearchResult;
use jukebox_server::search::SearchProvider;
use jukebox_server::store::{QueueStoreClient, SqliteStore};
use jukebox_server::{build_router, AppState, ChangeNotifier, SearchError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tower::util::ServiceExt;

type Observer = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct NoSearch;

#[async_trait]
impl SearchProvider for NoSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, SearchError> {
        Ok(Vec::new())
    }
}

/// Serve the app on an ephemeral port; returns router, notifier and ws URL
async fn start_server() -> (axum::Router, ChangeNotifier, String) {
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    let notifier = ChangeNotifier::default();
    let state = AppState::new(
        QueueStoreClient::new(Arc::new(store), notifier.clone()),
        Arc::new(NoSearch),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let served = app.clone();
    tokio::spawn(async move {
        axum::serve(listener, served).await.unwrap();
    });

    (app, notifier, format!("ws://{}/ws", addr))
}

async fn wait_for_observers(notifier: &ChangeNotifier, expected: usize) {
    for _ in 0..100 {
        if notifier.observer_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} observers, have {}",
        expected,
        notifier.observer_count()
    );
}

async fn next_text(observer: &mut Observer) -> String {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), observer.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("transport error");
        if let Message::Text(text) = frame {
            return text;
        }
    }
}

async fn add(app: &axum::Router, id: &str) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/add")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "videoId": id, "title": id }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_mutation_reaches_every_observer() {
    let (app, notifier, url) = start_server().await;

    let (mut first, _) = connect_async(url.as_str()).await.unwrap();
    let (mut second, _) = connect_async(url.as_str()).await.unwrap();
    wait_for_observers(&notifier, 2).await;

    add(&app, "a").await;

    assert_eq!(next_text(&mut first).await, r#"{"type":"queue_updated"}"#);
    assert_eq!(next_text(&mut second).await, r#"{"type":"queue_updated"}"#);
}

#[tokio::test]
async fn test_closed_observer_does_not_block_others() {
    let (app, notifier, url) = start_server().await;

    let (mut leaving, _) = connect_async(url.as_str()).await.unwrap();
    let (mut staying, _) = connect_async(url.as_str()).await.unwrap();
    wait_for_observers(&notifier, 2).await;

    leaving.close(None).await.unwrap();
    wait_for_observers(&notifier, 1).await;

    add(&app, "a").await;
    assert_eq!(next_text(&mut staying).await, r#"{"type":"queue_updated"}"#);
}

#[tokio::test]
async fn test_advisory_and_garbage_messages_are_tolerated() {
    let (app, notifier, url) = start_server().await;

    let (mut observer, _) = connect_async(url.as_str()).await.unwrap();
    wait_for_observers(&notifier, 1).await;

    observer
        .send(Message::Text(r#"{"type":"song_removed","videoId":"a"}"#.to_string()))
        .await
        .unwrap();
    observer.send(Message::Text("not json".to_string())).await.unwrap();

    add(&app, "b").await;
    assert_eq!(next_text(&mut observer).await, r#"{"type":"queue_updated"}"#);
    assert_eq!(notifier.observer_count(), 1);
}
