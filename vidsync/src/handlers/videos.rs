//! Video list, import/refresh and delete handlers
//!
//! Mutating handlers verify the anti-forgery secret before looking at any
//! other part of the payload.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use vidsync::handlers::videos;
//! use axum::{routing::{get, post}, Router};
//!
//! let routes = Router::new()
//!     .route("/videos", get(videos::list_videos))
//!     .route("/videos/{video_id}", get(videos::get_video))
//!     .route("/videos/fetch", post(videos::fetch_video))
//!     .route("/videos/delete", post(videos::delete_video));
//! ```

use crate::auth::SessionContext;
use crate::error::ApiError;
use crate::extractors::{CurrentSession, MutationPayload};
use crate::models::{VideoId, VideoRecord};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

/// Response for a successful import or refresh
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchResponse {
    /// Always `true`
    pub success: bool,
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

/// Response for a successful delete
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Always `true`
    pub success: bool,
}

/// Verify the presented secret for a mutating request
fn authorize(
    state: &AppState,
    session: Option<&SessionContext>,
    payload: &MutationPayload,
) -> Result<(), ApiError> {
    state
        .authority()
        .verify(session, &payload.secret)
        .map_err(|rejection| {
            tracing::warn!(
                reason = rejection.code(),
                session = session.map(|s| s.id().log_prefix()),
                "CSRF validation failed"
            );
            ApiError::from(rejection)
        })
}

fn parse_video_id(raw: &str) -> Result<VideoId, ApiError> {
    if raw.is_empty() {
        return Err(ApiError::Validation("Missing video ID".to_string()));
    }
    raw.parse()
        .map_err(|e: crate::models::InvalidVideoId| ApiError::Validation(e.to_string()))
}

/// List stored videos, newest first
///
/// ```bash
/// GET /videos
/// ```
pub async fn list_videos(
    State(state): State<AppState>,
) -> Result<Json<Vec<VideoRecord>>, ApiError> {
    let videos = state.videos().list().await?;
    Ok(Json(videos))
}

/// Look up one stored video
///
/// ```bash
/// GET /videos/dQw4w9WgXcQ
/// ```
pub async fn get_video(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<VideoRecord>, ApiError> {
    let video_id = parse_video_id(raw.trim())?;
    state
        .videos()
        .get(video_id.as_str())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Video {video_id} is not stored")))
}

/// Import a video or refresh its counters
///
/// ```bash
/// POST /videos/fetch
/// video_id=dQw4w9WgXcQ&csrf_token=…
/// ```
pub async fn fetch_video(
    State(state): State<AppState>,
    session: Option<CurrentSession>,
    payload: MutationPayload,
) -> Result<Json<FetchResponse>, ApiError> {
    authorize(&state, session.as_ref().map(|s| &s.0), &payload)?;
    let video_id = parse_video_id(&payload.entity_id)?;

    let meta = state.upstream().fetch(&video_id).await?;
    let record = state.videos().upsert(&meta).await?;

    tracing::info!(video_id = %video_id, views = record.views, "Saved video");

    Ok(Json(FetchResponse {
        success: true,
        video_id: record.video_id,
        title: record.title,
        views: record.views,
        likes: record.likes,
        comments: record.comments,
    }))
}

/// Delete a stored video
///
/// Deleting an id that is not stored still succeeds.
///
/// ```bash
/// POST /videos/delete
/// video_id=dQw4w9WgXcQ&csrf_token=…
/// ```
pub async fn delete_video(
    State(state): State<AppState>,
    session: Option<CurrentSession>,
    payload: MutationPayload,
) -> Result<Json<DeleteResponse>, ApiError> {
    authorize(&state, session.as_ref().map(|s| &s.0), &payload)?;
    let video_id = parse_video_id(&payload.entity_id)?;

    let removed = state.videos().delete(video_id.as_str()).await?;
    tracing::info!(video_id = %video_id, removed, "Deleted video");

    Ok(Json(DeleteResponse { success: true }))
}
