//! # Jukebox Server Library (jukebox-server)
//!
//! HTTP API and push channel in front of the shared queue store.
//!
//! **Flow:** a mutating request writes to the store, then the change notifier
//! sends a payload-free `queue_updated` to every push observer, which re-fetch
//! `GET /api/queue`.

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod notifier;
pub mod search;
pub mod store;

pub use error::{ApiError, SearchError, StoreError};
pub use notifier::ChangeNotifier;
pub use store::QueueStoreClient;

use search::SearchProvider;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Store access plus change signalling
    pub queue: QueueStoreClient,
    pub search: Arc<dyn SearchProvider>,
}

impl AppState {
    pub fn new(queue: QueueStoreClient, search: Arc<dyn SearchProvider>) -> Self {
        Self { queue, search }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, post, put};

    Router::new()
        .route("/api/search", get(api::search))
        .route("/api/add", post(api::add_song))
        .route("/api/remove", delete(api::remove_song))
        .route("/api/queue", get(api::get_queue))
        .route("/api/update-status", put(api::update_status))
        .route("/ws", get(api::push_channel))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Kiosk clients are served from other hosts on the LAN
        .layer(CorsLayer::permissive())
}
