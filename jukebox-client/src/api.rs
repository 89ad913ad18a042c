//! HTTP client for the jukebox server API

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use jukebox_common::{QueueItem, SearchResult};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Queue operations the client core depends on
#[async_trait]
pub trait QueueApi: Send + Sync {
    /// Current pending items in store order
    async fn list_pending(&self) -> Result<Vec<QueueItem>>;

    async fn append(&self, song: &SearchResult) -> Result<()>;

    /// `ClientError::NotFound` when the id is already gone
    async fn remove(&self, video_id: &str) -> Result<()>;

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    #[serde(default)]
    queue: Vec<QueueItem>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct HttpQueueApi {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpQueueApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map non-2xx responses to errors, keeping the server's error text
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(message));
        }
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl QueueApi for HttpQueueApi {
    async fn list_pending(&self) -> Result<Vec<QueueItem>> {
        let response = self.http_client.get(self.url("/api/queue")).send().await?;
        let body: QueueResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        debug!("Fetched queue snapshot with {} items", body.queue.len());
        Ok(body.queue)
    }

    async fn append(&self, song: &SearchResult) -> Result<()> {
        let response = self
            .http_client
            .post(self.url("/api/add"))
            .json(song)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn remove(&self, video_id: &str) -> Result<()> {
        let response = self
            .http_client
            .delete(self.url("/api/remove"))
            .query(&[("videoId", video_id)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let response = self
            .http_client
            .get(self.url("/api/search"))
            .query(&[("q", query)])
            .send()
            .await?;
        let body: SearchResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;
        Ok(body.results)
    }
}
