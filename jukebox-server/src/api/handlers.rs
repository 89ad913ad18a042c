//! Queue and search endpoints
//!
//! Every mutating route writes to the store first; the change signal is sent by
//! the store client only after that write succeeded.

use crate::error::{ApiError, StoreError};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use jukebox_common::{QueueItem, SearchResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub queue: Vec<QueueItem>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Search
// ============================================================================

/// GET /api/search?q=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let q = non_empty(query.q).ok_or_else(|| ApiError::bad_request("Missing search query"))?;

    match state.search.search(&q).await {
        Ok(results) => Ok(Json(SearchResponse { results })),
        Err(e) => {
            error!(query = %q, "Search failed: {}", e);
            Err(ApiError::server_error("Search failed"))
        }
    }
}

// ============================================================================
// Queue mutations
// ============================================================================

/// POST /api/add
pub async fn add_song(
    State(state): State<AppState>,
    body: Option<Json<SearchResult>>,
) -> Result<Json<MutationResponse>, ApiError> {
    let Some(Json(song)) = body else {
        return Err(ApiError::bad_request("Missing videoId or title"));
    };

    match state.queue.append(&song).await {
        Ok(data) => Ok(Json(MutationResponse { success: true, data: Some(data) })),
        Err(e) => {
            if !matches!(e, StoreError::Validation(_)) {
                error!(video_id = %song.video_id, "Error adding song: {}", e);
            }
            Err(ApiError::from_store(e, "Failed to add song", false))
        }
    }
}

/// DELETE /api/remove?videoId=
///
/// Store failures keep the store's status code; removing an id that is already
/// gone answers 404.
pub async fn remove_song(
    State(state): State<AppState>,
    Query(query): Query<RemoveQuery>,
) -> Result<Json<MutationResponse>, ApiError> {
    let video_id = non_empty(query.video_id)
        .ok_or_else(|| ApiError::bad_request("Missing videoId query parameter"))?;

    match state.queue.remove(&video_id).await {
        Ok(()) => Ok(Json(MutationResponse { success: true, data: None })),
        Err(e) => {
            if matches!(e, StoreError::NotFound(_)) {
                warn!(video_id = %video_id, "Remove requested for song not in store");
            } else {
                error!(video_id = %video_id, "Error deleting song: {}", e);
            }
            Err(ApiError::from_store(e, "Failed to delete song", true))
        }
    }
}

/// PUT /api/update-status
pub async fn update_status(
    State(state): State<AppState>,
    body: Option<Json<StatusUpdateRequest>>,
) -> Result<Json<MutationResponse>, ApiError> {
    let video_id = body
        .and_then(|Json(req)| non_empty(req.video_id))
        .ok_or_else(|| ApiError::bad_request("Missing videoId"))?;

    match state.queue.mark_played(&video_id).await {
        Ok(data) => Ok(Json(MutationResponse { success: true, data: Some(data) })),
        Err(e) => {
            error!(video_id = %video_id, "Error updating status: {}", e);
            Err(ApiError::from_store(e, "Failed to update status", false))
        }
    }
}

// ============================================================================
// Queue snapshot
// ============================================================================

/// GET /api/queue - pending items only, in store order
pub async fn get_queue(State(state): State<AppState>) -> Result<Json<QueueResponse>, ApiError> {
    match state.queue.list_pending().await {
        Ok(queue) => Ok(Json(QueueResponse { queue })),
        Err(e) => {
            error!("Error fetching queue: {}", e);
            Err(ApiError::server_error("Server error"))
        }
    }
}
