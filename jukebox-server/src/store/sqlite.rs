//! Local SQLite store
//!
//! Same row shape as the remote sheet, one table, rows in insertion order.

use super::{QueueStore, StoreRow};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

const MEMORY_URL: &str = "sqlite::memory:";

pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`
    ///
    /// `sqlite::memory:` opens a private in-memory database on a single
    /// connection, so every query sees the same data.
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        let pool = if path == MEMORY_URL {
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(SqliteConnectOptions::from_str(MEMORY_URL)?)
                .await?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| StoreError::Unavailable {
                        status: None,
                        message: format!("Cannot create {}: {}", parent.display(), e),
                        detail: None,
                    })?;
                }
            }
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);
            SqlitePoolOptions::new().connect_with(options).await?
        };

        Self::create_schema(&pool).await?;
        info!("SQLite queue store ready at {}", path);
        Ok(Self { pool })
    }

    async fn create_schema(pool: &Pool<Sqlite>) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS queue (
                row_id INTEGER PRIMARY KEY AUTOINCREMENT,
                video_id TEXT NOT NULL,
                title TEXT NOT NULL,
                thumbnail TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT '0',
                timestamp TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_queue_video_id ON queue(video_id)")
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl QueueStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert(&self, row: &StoreRow) -> Result<Value, StoreError> {
        sqlx::query(
            "INSERT INTO queue (video_id, title, thumbnail, status, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&row.video_id)
        .bind(&row.title)
        .bind(&row.thumbnail)
        .bind(&row.status)
        .bind(&row.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(json!([row]))
    }

    async fn delete(&self, video_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM queue WHERE video_id = ?")
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(video_id.to_string()));
        }
        Ok(())
    }

    async fn update_status(&self, video_id: &str, status: &str, timestamp: &str) -> Result<Value, StoreError> {
        let result = sqlx::query("UPDATE queue SET status = ?, timestamp = ? WHERE video_id = ?")
            .bind(status)
            .bind(timestamp)
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(video_id.to_string()));
        }

        Ok(json!({
            "videoId": video_id,
            "status": status,
            "timestamp": timestamp,
            "updated": result.rows_affected(),
        }))
    }

    async fn fetch_all(&self) -> Result<Vec<StoreRow>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, String, String, String)>(
            "SELECT video_id, title, thumbnail, status, timestamp FROM queue ORDER BY row_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(video_id, title, thumbnail, status, timestamp)| StoreRow {
                video_id,
                title,
                thumbnail,
                status,
                timestamp,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::STATUS_PENDING;

    fn row(id: &str) -> StoreRow {
        StoreRow {
            video_id: id.to_string(),
            title: format!("Title {}", id),
            thumbnail: String::new(),
            status: STATUS_PENDING.to_string(),
            timestamp: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insertion_order_preserved() {
        let store = SqliteStore::connect(MEMORY_URL).await.unwrap();
        for id in ["c", "a", "b"] {
            store.insert(&row(id)).await.unwrap();
        }

        let ids: Vec<String> = store.fetch_all().await.unwrap().into_iter().map(|r| r.video_id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = SqliteStore::connect(MEMORY_URL).await.unwrap();
        assert!(matches!(store.delete("nope").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = std::env::temp_dir().join(format!("jukebox-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("queue.db");
        let path = path.to_string_lossy().to_string();

        {
            let store = SqliteStore::connect(&path).await.unwrap();
            store.insert(&row("a")).await.unwrap();
            store.pool.close().await;
        }

        let reopened = SqliteStore::connect(&path).await.unwrap();
        assert_eq!(reopened.fetch_all().await.unwrap().len(), 1);

        reopened.pool.close().await;
        let _ = std::fs::remove_dir_all(dir);
    }
}
