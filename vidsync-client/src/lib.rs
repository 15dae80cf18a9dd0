//! Vidsync client.
//!
//! Talks to a vidsync server and keeps the counters of hovered videos live.
//! All view state is owned by a single task that consumes UI signals, timer
//! ticks and network completions from one queue, in order.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vidsync_client::{ClientConfig, HttpDashboardApi, SyncView};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::default();
//! let api = Arc::new(HttpDashboardApi::new(&config)?);
//!
//! let mut view = SyncView::new(api, config.refresh_interval());
//! let signals = view.wire_signals().expect("fresh view");
//! let running = tokio::spawn(view.run());
//!
//! signals.settled().await?;
//! signals.focus_enter("dQw4w9WgXcQ")?;
//! // ...
//! signals.close()?;
//! running.await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod scheduler;
pub mod view;

pub use api::{DashboardApi, HttpDashboardApi, Secret, VideoStats};
pub use config::ClientConfig;
pub use entity::{EntityId, Freshness, ListState, TokenStatus, TrackedEntity};
pub use error::{ClientError, ViewClosed};
pub use event::{Signal, ViewEvent};
pub use scheduler::SyncScheduler;
pub use view::{SignalHandle, SyncView, ViewSnapshot};
