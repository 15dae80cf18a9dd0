//! Vidsync server binary entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidsync::{
    router, storage, AppState, SessionStore, TokenAuthority, VideoRepository, VidsyncConfig,
    YouTubeClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vidsync=info,vidsync_server=info,tower_http=info,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting vidsync-server");

    // Load configuration
    let config = VidsyncConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", *e);
        VidsyncConfig::default()
    });

    if config.upstream.api_key.is_empty() {
        tracing::warn!("No upstream API key configured; imports will fail");
    }

    // Database
    let pool = storage::connect(&config.database).await?;
    tracing::info!("Database connection pool established");

    // Sessions and anti-forgery tokens
    let sessions = SessionStore::new();
    let idle = i64::try_from(config.session.idle_timeout_seconds)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX);
    let _sweeper = sessions.spawn_sweeper(
        idle,
        Duration::from_secs(config.session.sweep_interval_seconds.max(1)),
    );
    let authority = TokenAuthority::with_secret_bytes(sessions, config.csrf.secret_bytes);

    let upstream = YouTubeClient::new(&config.upstream)?;
    let state = AppState::new(authority, VideoRepository::new(pool), Arc::new(upstream));
    let app = router(state, &config)?;

    // Build server address
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(origin = %config.cors.allowed_origin, "Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
