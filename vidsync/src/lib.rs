//! Vidsync server.
//!
//! Imports per-video metadata from an external platform, stores it, and
//! serves it to a dashboard. Every mutating call is protected by a
//! session-bound anti-forgery secret.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod storage;
pub mod upstream;

// Re-export key types for convenience
pub use auth::{AuthRejection, SessionStore, TokenAuthority};
pub use config::VidsyncConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
pub use storage::VideoRepository;
pub use upstream::{MetadataSource, UpstreamError, YouTubeClient};
