//! YouTube Data API v3 client

use super::{MetadataSource, UpstreamError};
use crate::config::UpstreamConfig;
use crate::models::{VideoId, VideoMetadata};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// `videos.list` response, reduced to the fields we read
#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
}

/// Counters arrive as decimal strings and may be hidden by the owner
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

fn parse_count(raw: Option<&String>) -> i64 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
}

impl VideoListResponse {
    fn into_metadata(self, video_id: &VideoId) -> Result<VideoMetadata, UpstreamError> {
        let item = self.items.into_iter().next().ok_or(UpstreamError::NotFound)?;
        Ok(VideoMetadata {
            video_id: video_id.clone(),
            title: item.snippet.title,
            views: parse_count(item.statistics.view_count.as_ref()),
            likes: parse_count(item.statistics.like_count.as_ref()),
            comments: parse_count(item.statistics.comment_count.as_ref()),
        })
    }
}

/// HTTP client for the YouTube Data API
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl MetadataSource for YouTubeClient {
    async fn fetch(&self, video_id: &VideoId) -> Result<VideoMetadata, UpstreamError> {
        let url = format!("{}/videos", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("part", "snippet,statistics"),
                ("id", video_id.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(video_id = %video_id, %status, "Upstream returned error status");
            return Err(UpstreamError::Unavailable(format!("status {status}")));
        }

        let body: VideoListResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.without_url().to_string()))?;

        body.into_metadata(video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_id() -> VideoId {
        "dQw4w9WgXcQ".parse().unwrap()
    }

    #[test]
    fn test_decode_full_item() {
        let raw = r#"{
            "items": [{
                "snippet": {"title": "Never Gonna Give You Up"},
                "statistics": {"viewCount": "1500000000", "likeCount": "17000000", "commentCount": "2300000"}
            }]
        }"#;
        let body: VideoListResponse = serde_json::from_str(raw).unwrap();
        let meta = body.into_metadata(&video_id()).unwrap();

        assert_eq!(meta.title, "Never Gonna Give You Up");
        assert_eq!(meta.views, 1_500_000_000);
        assert_eq!(meta.likes, 17_000_000);
        assert_eq!(meta.comments, 2_300_000);
    }

    #[test]
    fn test_hidden_counters_default_to_zero() {
        let raw = r#"{"items": [{"snippet": {"title": "t"}, "statistics": {"viewCount": "12"}}]}"#;
        let body: VideoListResponse = serde_json::from_str(raw).unwrap();
        let meta = body.into_metadata(&video_id()).unwrap();

        assert_eq!(meta.views, 12);
        assert_eq!(meta.likes, 0);
        assert_eq!(meta.comments, 0);
    }

    #[test]
    fn test_empty_items_is_not_found() {
        let body: VideoListResponse = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert_eq!(body.into_metadata(&video_id()), Err(UpstreamError::NotFound));

        let body: VideoListResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(body.into_metadata(&video_id()), Err(UpstreamError::NotFound));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_unavailable() {
        let client = YouTubeClient::new(&UpstreamConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "k".to_string(),
            timeout_seconds: 1,
        })
        .unwrap();

        let result = client.fetch(&video_id()).await;
        assert!(matches!(result, Err(UpstreamError::Unavailable(_))));
    }
}
