//! Search provider
//!
//! The default provider fetches the public YouTube results page and reads the
//! `ytInitialData` JSON blob embedded in it. Candidates are returned in page
//! order; nothing is cached.

use crate::error::SearchError;
use async_trait::async_trait;
use jukebox_common::SearchResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

/// Embedded results blob, bounded by the end of its script element
static INITIAL_DATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)ytInitialData\s*=\s*(\{.*?\});\s*</script>")
        .expect("static regex is valid")
});

/// Text search producing candidate queue items
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;
}

pub struct YouTubeSearch {
    http_client: reqwest::Client,
    base_url: String,
}

impl YouTubeSearch {
    pub fn new(timeout: Duration) -> Result<Self, SearchError> {
        Self::with_base_url(YOUTUBE_BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, SearchError> {
        let http_client = reqwest::Client::builder()
            // The results page is only server-rendered for browser-like agents
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) jukebox-server")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for YouTubeSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!("{}/results", self.base_url);
        debug!(query = %query, "Searching provider");

        let response = self
            .http_client
            .get(&url)
            .query(&[("search_query", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Request(format!("Provider returned {}", status)));
        }

        let html = response.text().await?;
        let results = parse_results_page(&html)?;
        debug!(query = %query, count = results.len(), "Search finished");
        Ok(results)
    }
}

/// Extract video candidates from a results page
pub fn parse_results_page(html: &str) -> Result<Vec<SearchResult>, SearchError> {
    let blob = INITIAL_DATA
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| SearchError::Parse("ytInitialData not found".to_string()))?;

    let data: Value = serde_json::from_str(blob.as_str()).map_err(|e| {
        warn!("ytInitialData is not valid JSON: {}", e);
        SearchError::Parse(e.to_string())
    })?;

    Ok(collect_videos(&data))
}

fn collect_videos(data: &Value) -> Vec<SearchResult> {
    let sections = data
        .pointer("/contents/twoColumnSearchResultsRenderer/primaryContents/sectionListRenderer/contents")
        .and_then(Value::as_array);

    let Some(sections) = sections else {
        return Vec::new();
    };

    sections
        .iter()
        .filter_map(|section| section.pointer("/itemSectionRenderer/contents").and_then(Value::as_array))
        .flatten()
        .filter_map(|item| item.get("videoRenderer"))
        .filter_map(|video| {
            let video_id = video.get("videoId").and_then(Value::as_str)?;
            Some(SearchResult {
                video_id: video_id.to_string(),
                title: text_at(video, "/title/runs/0/text"),
                thumbnail: text_at(video, "/thumbnail/thumbnails/0/url"),
            })
        })
        .collect()
}

fn text_at(value: &Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
