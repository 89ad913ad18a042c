//! Queue record store
//!
//! The store is a table of rows keyed by `videoId` with a `status` column:
//! `"0"` is pending, anything else has been played. Backends only move rows;
//! validation and change signalling live in [`QueueStoreClient`].

mod client;
mod sheet;
mod sqlite;

pub use client::QueueStoreClient;
pub use sheet::SheetStore;
pub use sqlite::SqliteStore;

use crate::error::StoreError;
use async_trait::async_trait;
use jukebox_common::config::{StoreBackend, StoreConfig};
use jukebox_common::QueueItem;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Status value of a pending row
pub const STATUS_PENDING: &str = "0";

/// Status value written when an item is marked played
pub const STATUS_PLAYED: &str = "1";

/// One row as the store holds it
///
/// Sheet stores answer empty cells as `null`; those read as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRow {
    #[serde(rename = "videoId", default, deserialize_with = "null_as_empty")]
    pub video_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub thumbnail: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub timestamp: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl StoreRow {
    pub fn is_pending(&self) -> bool {
        self.status == STATUS_PENDING
    }

    pub fn into_queue_item(self) -> QueueItem {
        let pending = self.is_pending();
        QueueItem {
            id: self.video_id,
            title: self.title,
            thumbnail: self.thumbnail,
            pending,
        }
    }
}

/// Raw row operations against a backing store
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Append a row; returns the store's description of what was written
    async fn insert(&self, row: &StoreRow) -> Result<serde_json::Value, StoreError>;

    /// Delete every row with this id; `NotFound` when none existed
    async fn delete(&self, video_id: &str) -> Result<(), StoreError>;

    /// Set status and timestamp on every row with this id
    async fn update_status(
        &self,
        video_id: &str,
        status: &str,
        timestamp: &str,
    ) -> Result<serde_json::Value, StoreError>;

    /// All rows in store order
    async fn fetch_all(&self) -> Result<Vec<StoreRow>, StoreError>;
}

/// Open the backend selected by configuration
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn QueueStore>, StoreError> {
    match config.backend {
        StoreBackend::Sheet => {
            let url = config.sheet_url.as_deref().ok_or_else(|| {
                StoreError::Validation("store.sheet_url is required for the sheet backend".to_string())
            })?;
            let store = SheetStore::new(url, Duration::from_secs(config.request_timeout_secs))?;
            Ok(Arc::new(store))
        }
        StoreBackend::Sqlite => {
            let store = SqliteStore::connect(&config.sqlite_path).await?;
            Ok(Arc::new(store))
        }
    }
}
