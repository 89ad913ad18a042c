//! Remote tabular store reached over HTTP
//!
//! Sheet-style REST API:
//! - `GET  {base}` → all rows
//! - `POST {base}` with a row → appended rows
//! - `PUT  {base}/videoId/{id}` with changed columns → updated rows
//! - `DELETE {base}/videoId/{id}` → deleted rows
//!
//! A 404, or a successful update/delete answering an empty array, means no row
//! matched the id.

use super::{QueueStore, StoreRow};
use crate::error::StoreError;
use async_trait::async_trait;
use reqwest::{Response, Url};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("jukebox-server/", env!("CARGO_PKG_VERSION"));

pub struct SheetStore {
    http_client: reqwest::Client,
    base_url: Url,
}

impl SheetStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Validation(format!("Invalid sheet URL {}: {}", base_url, e)))?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { http_client, base_url })
    }

    /// `{base}/videoId/{id}` with the id percent-encoded as one path segment
    fn row_url(&self, video_id: &str) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Validation(format!("Sheet URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .push("videoId")
            .push(video_id);
        Ok(url)
    }

    /// Turn a non-2xx response into `NotFound` / `Unavailable`
    async fn check(response: Response, video_id: Option<&str>) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(id) = video_id {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Unavailable {
            status: Some(status.as_u16()),
            message: format!("Store returned {}", status),
            detail: (!body.is_empty()).then_some(body),
        })
    }

    /// Body of a row-targeted call, `NotFound` when it matched nothing
    async fn affected_rows(response: Response, video_id: &str) -> Result<Value, StoreError> {
        let text = response.text().await.unwrap_or_default();
        let value: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        match &value {
            Value::Array(rows) if rows.is_empty() => Err(StoreError::NotFound(video_id.to_string())),
            _ => Ok(value),
        }
    }
}

#[async_trait]
impl QueueStore for SheetStore {
    fn name(&self) -> &'static str {
        "sheet"
    }

    async fn insert(&self, row: &StoreRow) -> Result<Value, StoreError> {
        debug!(video_id = %row.video_id, "POST row to sheet store");

        let response = self
            .http_client
            .post(self.base_url.clone())
            .json(row)
            .send()
            .await?;
        let response = Self::check(response, None).await?;

        response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }

    async fn delete(&self, video_id: &str) -> Result<(), StoreError> {
        let url = self.row_url(video_id)?;
        debug!(url = %url, "DELETE row from sheet store");

        let response = self.http_client.delete(url).send().await?;
        let response = Self::check(response, Some(video_id)).await?;
        Self::affected_rows(response, video_id).await.map(|_| ())
    }

    async fn update_status(&self, video_id: &str, status: &str, timestamp: &str) -> Result<Value, StoreError> {
        let url = self.row_url(video_id)?;
        debug!(url = %url, status = %status, "PUT status to sheet store");

        let response = self
            .http_client
            .put(url)
            .json(&json!({ "status": status, "timestamp": timestamp }))
            .send()
            .await?;
        let response = Self::check(response, Some(video_id)).await?;
        Self::affected_rows(response, video_id).await
    }

    async fn fetch_all(&self) -> Result<Vec<StoreRow>, StoreError> {
        let response = self.http_client.get(self.base_url.clone()).send().await?;
        let response = Self::check(response, None).await?;

        response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_url_encodes_id() {
        let store = SheetStore::new("https://sheet.example/api/sheets/abc", Duration::from_secs(5)).unwrap();
        let url = store.row_url("a b/c").unwrap();
        assert_eq!(url.as_str(), "https://sheet.example/api/sheets/abc/videoId/a%20b%2Fc");
    }

    #[test]
    fn test_row_url_with_trailing_slash() {
        let store = SheetStore::new("https://sheet.example/api/sheets/abc/", Duration::from_secs(5)).unwrap();
        let url = store.row_url("xyz").unwrap();
        assert_eq!(url.as_str(), "https://sheet.example/api/sheets/abc/videoId/xyz");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            SheetStore::new("not a url", Duration::from_secs(5)),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_row_parses_sheet_strings() {
        let rows: Vec<StoreRow> = serde_json::from_str(
            r#"[{"videoId":"a","title":"A","thumbnail":"t","status":"0","timestamp":""},
                {"videoId":"b","title":"B","status":"1","timestamp":"2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();

        assert!(rows[0].is_pending());
        assert!(!rows[1].is_pending());
        assert_eq!(rows[1].thumbnail, "");
    }

    #[test]
    fn test_row_null_cells_read_as_empty() {
        let rows: Vec<StoreRow> = serde_json::from_str(
            r#"[{"videoId":"a","title":"A","thumbnail":null,"status":"0","timestamp":null}]"#,
        )
        .unwrap();

        assert_eq!(rows[0].thumbnail, "");
        assert_eq!(rows[0].timestamp, "");
        assert!(rows[0].is_pending());
    }

    /// Mock sheet API; the row id picks the answer for PUT/DELETE
    async fn spawn_sheet() -> SheetStore {
        use axum::extract::Path;
        use axum::http::StatusCode;
        use axum::response::IntoResponse;
        use axum::routing::{get, put};
        use axum::{Json, Router};

        async fn rows() -> impl IntoResponse {
            Json(json!([
                {"videoId":"a","title":"A","thumbnail":"t","status":"0","timestamp":""},
                {"videoId":"b","title":"B","thumbnail":null,"status":"1","timestamp":null}
            ]))
        }

        async fn append(Json(row): Json<Value>) -> impl IntoResponse {
            (StatusCode::CREATED, Json(json!([row])))
        }

        async fn row(Path(id): Path<String>) -> axum::response::Response {
            match id.as_str() {
                "gone" => StatusCode::NOT_FOUND.into_response(),
                "empty" => Json(json!([])).into_response(),
                "busy" => (StatusCode::SERVICE_UNAVAILABLE, "sheet quota exceeded").into_response(),
                _ => Json(json!([{ "videoId": id }])).into_response(),
            }
        }

        let app = Router::new()
            .route("/rows", get(rows).post(append))
            .route("/rows/videoId/:id", put(row).delete(row));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        SheetStore::new(&format!("http://{}/rows", addr), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_all_parses_rows() {
        let store = spawn_sheet().await;
        let rows = store.fetch_all().await.unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_pending());
        assert_eq!(rows[1].video_id, "b");
        assert_eq!(rows[1].thumbnail, "");
        assert!(!rows[1].is_pending());
    }

    #[tokio::test]
    async fn test_insert_returns_store_body() {
        let store = spawn_sheet().await;
        let row = StoreRow {
            video_id: "c".to_string(),
            title: "C".to_string(),
            thumbnail: String::new(),
            status: "0".to_string(),
            timestamp: String::new(),
        };

        let body = store.insert(&row).await.unwrap();
        assert_eq!(body[0]["videoId"], "c");
    }

    #[tokio::test]
    async fn test_missing_row_is_not_found() {
        let store = spawn_sheet().await;

        assert!(matches!(store.delete("gone").await, Err(StoreError::NotFound(id)) if id == "gone"));
        assert!(matches!(
            store.update_status("gone", "1", "now").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_affected_rows_is_not_found() {
        let store = spawn_sheet().await;

        assert!(matches!(store.delete("empty").await, Err(StoreError::NotFound(id)) if id == "empty"));
        assert!(matches!(
            store.update_status("empty", "1", "now").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_other_failures_keep_status_and_body() {
        let store = spawn_sheet().await;

        match store.delete("busy").await {
            Err(StoreError::Unavailable { status, detail, .. }) => {
                assert_eq!(status, Some(503));
                assert_eq!(detail.as_deref(), Some("sheet quota exceeded"));
            }
            other => panic!("expected Unavailable, got {:?}", other),
        }
        assert!(matches!(
            store.update_status("busy", "1", "now").await,
            Err(StoreError::Unavailable { status: Some(503), .. })
        ));
    }

    #[tokio::test]
    async fn test_matched_row_succeeds() {
        let store = spawn_sheet().await;

        store.delete("a").await.unwrap();
        let body = store.update_status("a", "1", "now").await.unwrap();
        assert_eq!(body[0]["videoId"], "a");
    }
}
