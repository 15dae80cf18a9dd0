//! Dashboard API client
//!
//! [`DashboardApi`] is the seam the view talks through; [`HttpDashboardApi`]
//! is the reqwest implementation. The HTTP client keeps a cookie jar so the
//! session cookie set by `GET /csrf` is replayed on every later call.

use crate::config::ClientConfig;
use crate::error::ClientError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// Form field carrying the entity id
pub const ENTITY_FIELD: &str = "video_id";
/// Form field carrying the anti-forgery secret
pub const SECRET_FIELD: &str = "csrf_token";

/// Counters and title of one video as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStats {
    /// Platform identifier
    pub video_id: String,
    /// Display title
    pub title: String,
    /// View count
    pub views: i64,
    /// Like count
    pub likes: i64,
    /// Comment count
    pub comments: i64,
}

/// Anti-forgery secret held by the client
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret received from the server
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The secret as sent on the wire
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    csrf_token: String,
}

/// Operations the view needs from the server.
#[async_trait]
pub trait DashboardApi: Send + Sync + 'static {
    /// Fetch the session's anti-forgery secret, establishing the session
    async fn fetch_token(&self) -> Result<Secret, ClientError>;

    /// List stored videos, newest first
    async fn list_videos(&self) -> Result<Vec<VideoStats>, ClientError>;

    /// Import a video or refresh its counters
    async fn refresh(&self, video_id: &str, secret: &str) -> Result<VideoStats, ClientError>;

    /// Delete a stored video
    async fn delete(&self, video_id: &str, secret: &str) -> Result<(), ClientError>;
}

/// reqwest-backed [`DashboardApi`]
#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDashboardApi {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.server_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_mutation<T: DeserializeOwned>(
        &self,
        path: &str,
        video_id: &str,
        secret: &str,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .post(self.url(path))
            .form(&[(ENTITY_FIELD, video_id), (SECRET_FIELD, secret)])
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::rejected(status.as_u16(), &body))
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn fetch_token(&self) -> Result<Secret, ClientError> {
        let response = self.http.get(self.url("/csrf")).send().await?;
        let token: TokenResponse = read_json(response).await?;
        Ok(Secret::new(token.csrf_token))
    }

    async fn list_videos(&self) -> Result<Vec<VideoStats>, ClientError> {
        let response = self.http.get(self.url("/videos")).send().await?;
        read_json(response).await
    }

    async fn refresh(&self, video_id: &str, secret: &str) -> Result<VideoStats, ClientError> {
        self.post_mutation("/videos/fetch", video_id, secret).await
    }

    async fn delete(&self, video_id: &str, secret: &str) -> Result<(), ClientError> {
        let _: serde_json::Value = self.post_mutation("/videos/delete", video_id, secret).await?;
        Ok(())
    }
}
