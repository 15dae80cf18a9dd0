//! Tracked entities and view-level state

use crate::api::VideoStats;
use std::fmt;

/// Identity of a tracked entity (the platform's video id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an identifier; surrounding whitespace is dropped
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    /// The identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Whether a row shows the result of its latest refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// Values came from the most recent successful call
    Fresh,
    /// The most recent call failed; values are from an earlier success
    Stale(String),
}

/// One row of the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntity {
    /// Identity
    pub id: EntityId,
    /// Display title
    pub title: String,
    /// View count
    pub views: i64,
    /// Like count
    pub likes: i64,
    /// Comment count
    pub comments: i64,
    /// Freshness of the counters
    pub freshness: Freshness,
    /// A refresh timer is running for this row
    pub active: bool,
    /// A delete has been sent and not yet answered
    pub pending_delete: bool,
}

impl TrackedEntity {
    /// A fresh, inactive row
    #[must_use]
    pub fn from_stats(stats: VideoStats) -> Self {
        Self {
            id: EntityId::new(&stats.video_id),
            title: stats.title,
            views: stats.views,
            likes: stats.likes,
            comments: stats.comments,
            freshness: Freshness::Fresh,
            active: false,
            pending_delete: false,
        }
    }

    /// Overwrite the displayed values and mark the row fresh
    pub fn apply(&mut self, stats: VideoStats) {
        self.title = stats.title;
        self.views = stats.views;
        self.likes = stats.likes;
        self.comments = stats.comments;
        self.freshness = Freshness::Fresh;
    }

    /// Keep the values but flag them as outdated
    pub fn mark_stale(&mut self, reason: impl Into<String>) {
        self.freshness = Freshness::Stale(reason.into());
    }

    /// Whether the row shows fresh values
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.freshness == Freshness::Fresh
    }
}

/// Load state of the list as a whole
///
/// An empty result set is `Loaded` with no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    /// No load attempted yet
    NotLoaded,
    /// A load is in flight
    Loading,
    /// The last load failed
    Failed(String),
    /// The last load succeeded
    Loaded,
}

impl ListState {
    /// Whether a load has finished, successfully or not
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Loaded)
    }
}

/// Availability of the anti-forgery secret, without the secret itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// Requested, no answer yet
    Pending,
    /// Held and attached to mutating calls
    Ready,
    /// The last request failed
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(views: i64) -> VideoStats {
        VideoStats {
            video_id: "dQw4w9WgXcQ".to_string(),
            title: "Song".to_string(),
            views,
            likes: 1,
            comments: 0,
        }
    }

    #[test]
    fn test_stale_then_apply_is_fresh() {
        let mut row = TrackedEntity::from_stats(stats(1));
        assert!(row.is_fresh());

        row.mark_stale("timeout");
        assert_eq!(row.freshness, Freshness::Stale("timeout".to_string()));
        assert_eq!(row.views, 1);

        row.apply(stats(5));
        assert!(row.is_fresh());
        assert_eq!(row.views, 5);
    }

    #[test]
    fn test_entity_id_trims() {
        assert_eq!(EntityId::from(" abc12345678 ").as_str(), "abc12345678");
    }
}
