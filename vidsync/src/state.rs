//! Shared application state

use crate::auth::TokenAuthority;
use crate::storage::VideoRepository;
use crate::upstream::MetadataSource;
use std::sync::Arc;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    authority: TokenAuthority,
    videos: VideoRepository,
    upstream: Arc<dyn MetadataSource>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("authority", &self.authority)
            .field("videos", &self.videos)
            .field("upstream", &"dyn MetadataSource")
            .finish()
    }
}

impl AppState {
    /// Assemble the state
    #[must_use]
    pub fn new(
        authority: TokenAuthority,
        videos: VideoRepository,
        upstream: Arc<dyn MetadataSource>,
    ) -> Self {
        Self {
            authority,
            videos,
            upstream,
        }
    }

    /// Anti-forgery token authority
    #[must_use]
    pub const fn authority(&self) -> &TokenAuthority {
        &self.authority
    }

    /// Video repository
    #[must_use]
    pub const fn videos(&self) -> &VideoRepository {
        &self.videos
    }

    /// Upstream metadata source
    #[must_use]
    pub fn upstream(&self) -> &dyn MetadataSource {
        self.upstream.as_ref()
    }
}
