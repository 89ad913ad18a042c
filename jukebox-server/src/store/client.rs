//! Queue store client
//!
//! Maps domain operations onto store calls and emits the change signal only
//! after the store write has returned successfully.

use super::{QueueStore, StoreRow, STATUS_PENDING, STATUS_PLAYED};
use crate::error::StoreError;
use crate::notifier::ChangeNotifier;
use jukebox_common::{QueueItem, SearchResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct QueueStoreClient {
    store: Arc<dyn QueueStore>,
    notifier: ChangeNotifier,
}

impl QueueStoreClient {
    pub fn new(store: Arc<dyn QueueStore>, notifier: ChangeNotifier) -> Self {
        Self { store, notifier }
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Append an item as pending
    ///
    /// `videoId` and `title` must be non-empty.
    pub async fn append(&self, item: &SearchResult) -> Result<serde_json::Value, StoreError> {
        if item.video_id.trim().is_empty() || item.title.trim().is_empty() {
            return Err(StoreError::Validation("Missing videoId or title".to_string()));
        }

        let row = StoreRow {
            video_id: item.video_id.clone(),
            title: item.title.clone(),
            thumbnail: item.thumbnail.clone(),
            status: STATUS_PENDING.to_string(),
            timestamp: String::new(),
        };

        let data = self.store.insert(&row).await?;
        info!(video_id = %row.video_id, title = %row.title, "Song added to queue");
        self.notifier.broadcast();
        Ok(data)
    }

    /// Remove an item
    ///
    /// A missing id is reported as `NotFound`; callers racing on the same id
    /// should treat that as a no-op. No signal is sent in that case.
    pub async fn remove(&self, video_id: &str) -> Result<(), StoreError> {
        if video_id.trim().is_empty() {
            return Err(StoreError::Validation("Missing videoId".to_string()));
        }

        match self.store.delete(video_id).await {
            Ok(()) => {
                info!(video_id = %video_id, "Song removed from queue");
                self.notifier.broadcast();
                Ok(())
            }
            Err(StoreError::NotFound(id)) => {
                debug!(video_id = %id, "Remove of unknown song (already removed?)");
                Err(StoreError::NotFound(id))
            }
            Err(e) => Err(e),
        }
    }

    /// Pending items in store order
    pub async fn list_pending(&self) -> Result<Vec<QueueItem>, StoreError> {
        let rows = self.store.fetch_all().await?;
        Ok(rows
            .into_iter()
            .filter(StoreRow::is_pending)
            .map(StoreRow::into_queue_item)
            .collect())
    }

    /// Mark an item as played (it leaves the pending set but stays on record)
    pub async fn mark_played(&self, video_id: &str) -> Result<serde_json::Value, StoreError> {
        if video_id.trim().is_empty() {
            return Err(StoreError::Validation("Missing videoId".to_string()));
        }

        let timestamp = chrono::Utc::now().to_rfc3339();
        let data = self
            .store
            .update_status(video_id, STATUS_PLAYED, &timestamp)
            .await
            .map_err(|e| {
                warn!(video_id = %video_id, "Failed to update status: {}", e);
                e
            })?;

        info!(video_id = %video_id, "Song marked as played");
        self.notifier.broadcast();
        Ok(data)
    }
}
