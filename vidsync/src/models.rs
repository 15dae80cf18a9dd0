//! Video identity and metadata types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static VIDEO_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video id pattern is valid"));

/// Rejected video identifier
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid video ID: must be 11 characters")]
pub struct InvalidVideoId;

/// External platform identifier of a video (11 URL-safe characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// The identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VideoId {
    type Err = InvalidVideoId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if VIDEO_ID_PATTERN.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(InvalidVideoId)
        }
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Freshly fetched attributes of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoMetadata {
    /// Platform identifier
    pub video_id: VideoId,
    /// Display title
    pub title: String,
    /// View count
    pub views: i64,
    /// Like count
    pub likes: i64,
    /// Comment count
    pub comments: i64,
}

/// Stored video row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VideoRecord {
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
    /// First import time
    pub created_at: DateTime<Utc>,
    /// Last refresh time
    pub updated_at: DateTime<Utc>,
}
