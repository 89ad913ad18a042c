//! Queue data model
//!
//! Wire names follow the store's column names (`videoId`, `title`, `thumbnail`),
//! so the same JSON shape travels from the store through the server to clients.

use serde::{Deserialize, Serialize};

/// One media entry awaiting or currently in playback
///
/// Identity is by `id` only: two items with the same id are the same logical
/// entry even when title or thumbnail differ between fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Opaque stable identifier (provider video id)
    #[serde(rename = "videoId")]
    pub id: String,

    /// Display title
    pub title: String,

    /// Thumbnail URL (may be empty)
    #[serde(default)]
    pub thumbnail: String,

    /// Not yet played/removed
    #[serde(default = "default_pending")]
    pub pending: bool,
}

fn default_pending() -> bool {
    true
}

impl QueueItem {
    /// Create a pending queue item
    pub fn new(id: impl Into<String>, title: impl Into<String>, thumbnail: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            thumbnail: thumbnail.into(),
            pending: true,
        }
    }
}

/// Candidate item produced by the search provider
///
/// Also the request body of `POST /api/add` (thumbnail optional there).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "videoId", default)]
    pub video_id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub thumbnail: String,
}

impl SearchResult {
    pub fn new(video_id: impl Into<String>, title: impl Into<String>, thumbnail: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            thumbnail: thumbnail.into(),
        }
    }
}

impl From<SearchResult> for QueueItem {
    fn from(result: SearchResult) -> Self {
        QueueItem::new(result.video_id, result.title, result.thumbnail)
    }
}
