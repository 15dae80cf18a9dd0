//! vidsync-watch: terminal front-end for a vidsync server.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidsync_client::{
    ClientConfig, DashboardApi, EntityId, Freshness, HttpDashboardApi, SignalHandle, SyncView,
    TrackedEntity, VideoStats, ViewSnapshot,
};

#[derive(Debug, Parser)]
#[command(name = "vidsync-watch")]
#[command(about = "Import, list and live-watch videos on a vidsync server")]
#[command(version)]
struct Cli {
    /// Server base URL (overrides configuration)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List stored videos, newest first
    List,
    /// Import a video or refresh its counters
    Import {
        /// Video identifier
        id: String,
    },
    /// Delete a stored video
    Delete {
        /// Video identifier
        id: String,
    },
    /// Keep the given videos active and print their counters
    Watch {
        /// Video identifiers
        #[arg(required = true)]
        ids: Vec<String>,

        /// How long to watch
        #[arg(long, default_value_t = 30)]
        seconds: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidsync_client=warn,vidsync_watch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", *e);
        ClientConfig::default()
    });
    if let Some(server) = cli.server {
        config.server_url = server;
    }

    let api = Arc::new(HttpDashboardApi::new(&config)?);

    match cli.command {
        Command::List => {
            let videos = api.list_videos().await?;
            if videos.is_empty() {
                println!("No videos stored");
            }
            for video in &videos {
                println!("{}", format_stats(video));
            }
        }
        Command::Import { id } => {
            let secret = api.fetch_token().await.context("Failed to obtain token")?;
            let video = api.refresh(&id, secret.as_str()).await?;
            println!("{}", format_stats(&video));
        }
        Command::Delete { id } => {
            let secret = api.fetch_token().await.context("Failed to obtain token")?;
            api.delete(&id, secret.as_str()).await?;
            println!("Deleted {id}");
        }
        Command::Watch { ids, seconds } => {
            watch(api, &config, ids, Duration::from_secs(seconds)).await?;
        }
    }

    Ok(())
}

async fn watch(
    api: Arc<HttpDashboardApi>,
    config: &ClientConfig,
    ids: Vec<String>,
    duration: Duration,
) -> Result<()> {
    let period = config.refresh_interval();
    let mut view = SyncView::new(api, period);
    let signals = view
        .wire_signals()
        .context("Signals already wired for this view")?;
    let running = tokio::spawn(view.run());

    let settled = signals.settled().await?;
    for id in ids.into_iter().map(EntityId::from) {
        if settled.rows.iter().any(|row| row.id == id) {
            signals.focus_enter(id)?;
        } else {
            eprintln!("{id} is not stored; import it first");
        }
    }

    let deadline = tokio::time::Instant::now() + duration;
    let mut ticks = tokio::time::interval(period);
    while tokio::time::Instant::now() < deadline {
        tokio::select! {
            _ = ticks.tick() => print_snapshot(&signals).await?,
            _ = tokio::time::sleep_until(deadline) => break,
        }
    }

    signals.close()?;
    let cancelled = running.await?;
    tracing::info!(cancelled, "Stopped watching");
    Ok(())
}

async fn print_snapshot(signals: &SignalHandle) -> Result<()> {
    let snapshot: ViewSnapshot = signals.snapshot().await?;
    for row in snapshot.rows.iter().filter(|row| row.active) {
        println!("{}", format_row(row));
    }
    if let Some(error) = &snapshot.last_error {
        eprintln!("last error: {error}");
    }
    Ok(())
}

fn format_stats(video: &VideoStats) -> String {
    format!(
        "{:<11}  {:>12} views  {:>9} likes  {:>7} comments  {}",
        video.video_id, video.views, video.likes, video.comments, video.title
    )
}

fn format_row(row: &TrackedEntity) -> String {
    let line = format!(
        "{:<11}  {:>12} views  {:>9} likes  {:>7} comments  {}",
        row.id.as_str(),
        row.views,
        row.likes,
        row.comments,
        row.title
    );
    match &row.freshness {
        Freshness::Fresh => line,
        Freshness::Stale(reason) => format!("{line}  (stale: {reason})"),
    }
}
