//! Router assembly

use crate::config::VidsyncConfig;
use crate::handlers::{delete_video, fetch_video, get_video, issue_token, list_videos};
use crate::middleware::{cors::CorsError, cors_layer, SessionLayer};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the application router
///
/// Layers, outermost first: CORS, request tracing, body limit, sessions.
///
/// # Errors
///
/// Returns an error if the configured CORS origin is unusable.
pub fn router(state: AppState, config: &VidsyncConfig) -> Result<Router, CorsError> {
    let cors = cors_layer(&config.cors)?;
    let sessions = SessionLayer::with_config(
        state.authority().store().clone(),
        config.session.clone(),
    );

    Ok(Router::new()
        .route("/csrf", get(issue_token))
        .route("/videos", get(list_videos))
        .route("/videos/{video_id}", get(get_video))
        .route("/videos/fetch", post(fetch_video))
        .route("/videos/delete", post(delete_video))
        .route("/health", get(|| async { "ok" }))
        .layer(sessions)
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}
