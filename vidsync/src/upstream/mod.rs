//! Upstream video metadata
//!
//! The dashboard imports titles and counters from an external video
//! platform. [`MetadataSource`] is the seam; [`YouTubeClient`] talks to the
//! YouTube Data API.

mod youtube;

pub use youtube::YouTubeClient;

use crate::models::{VideoId, VideoMetadata};
use async_trait::async_trait;
use thiserror::Error;

/// Upstream fetch failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// The platform reports no such (public) video
    #[error("video not found or private")]
    NotFound,
    /// Transport failure, timeout or unusable response
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
}

/// Source of fresh video metadata
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch current metadata for one video
    ///
    /// # Errors
    ///
    /// [`UpstreamError::NotFound`] when the platform has no data for the id,
    /// [`UpstreamError::Unavailable`] for any transport or decoding failure.
    async fn fetch(&self, video_id: &VideoId) -> Result<VideoMetadata, UpstreamError>;
}
