//! Event-driven dashboard view
//!
//! [`SyncView`] owns every piece of client state: the anti-forgery secret,
//! the list, its rows and the [`SyncScheduler`]. It runs as one task that
//! consumes UI [`Signal`]s and internal [`ViewEvent`]s (timer ticks,
//! network completions) one at a time, so state is never touched
//! concurrently. Network calls run in spawned tasks and report back through
//! the event queue.
//!
//! Signals arrive through the single [`SignalHandle`] returned by
//! [`SyncView::wire_signals`]. The view stops on [`Signal::Close`] or when
//! every clone of the handle is dropped, and cancels all timers once on the
//! way out.

use crate::api::{DashboardApi, Secret, VideoStats};
use crate::entity::{EntityId, ListState, TokenStatus, TrackedEntity};
use crate::error::{ClientError, ViewClosed};
use crate::event::{Signal, ViewEvent};
use crate::scheduler::SyncScheduler;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Poll period of [`SignalHandle::settled`]
const SETTLE_POLL: Duration = Duration::from_millis(10);

/// Point-in-time copy of the view state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    /// Load state of the list
    pub list: ListState,
    /// Availability of the anti-forgery secret
    pub token: TokenStatus,
    /// Rows in server order (newest first)
    pub rows: Vec<TrackedEntity>,
    /// Running refresh timers
    pub live_timers: usize,
    /// Most recent failed user action (import or delete)
    pub last_error: Option<String>,
}

impl ViewSnapshot {
    /// Row for `id`, if listed
    #[must_use]
    pub fn row(&self, id: &str) -> Option<&TrackedEntity> {
        self.rows.iter().find(|row| row.id.as_str() == id)
    }

    /// The initial token and list requests have both finished
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.list.is_settled() && self.token != TokenStatus::Pending
    }
}

/// Sending side of the view's signal queue
#[derive(Debug, Clone)]
pub struct SignalHandle {
    signals: mpsc::UnboundedSender<Signal>,
}

impl SignalHandle {
    fn send(&self, signal: Signal) -> Result<(), ViewClosed> {
        self.signals.send(signal).map_err(|_| ViewClosed)
    }

    /// Row became active
    pub fn focus_enter(&self, id: impl Into<EntityId>) -> Result<(), ViewClosed> {
        self.send(Signal::FocusEnter(id.into()))
    }

    /// Row stopped being active
    pub fn focus_leave(&self, id: impl Into<EntityId>) -> Result<(), ViewClosed> {
        self.send(Signal::FocusLeave(id.into()))
    }

    /// Delete a row
    pub fn delete(&self, id: impl Into<EntityId>) -> Result<(), ViewClosed> {
        self.send(Signal::Delete(id.into()))
    }

    /// Import a video by id
    pub fn import(&self, id: impl Into<EntityId>) -> Result<(), ViewClosed> {
        self.send(Signal::Import(id.into()))
    }

    /// Reload the list
    pub fn reload(&self) -> Result<(), ViewClosed> {
        self.send(Signal::Reload)
    }

    /// Stop the view
    pub fn close(&self) -> Result<(), ViewClosed> {
        self.send(Signal::Close)
    }

    /// Current view state
    pub async fn snapshot(&self) -> Result<ViewSnapshot, ViewClosed> {
        let (reply, response) = oneshot::channel();
        self.send(Signal::Snapshot(reply))?;
        response.await.map_err(|_| ViewClosed)
    }

    /// Wait until the initial token and list requests have finished
    pub async fn settled(&self) -> Result<ViewSnapshot, ViewClosed> {
        loop {
            let snapshot = self.snapshot().await?;
            if snapshot.is_settled() {
                return Ok(snapshot);
            }
            tokio::time::sleep(SETTLE_POLL).await;
        }
    }
}

/// The view's one-time signal wiring
struct Subscription {
    unclaimed: Option<SignalHandle>,
    signals: mpsc::UnboundedReceiver<Signal>,
}

impl Subscription {
    fn new() -> Self {
        let (tx, signals) = mpsc::unbounded_channel();
        Self {
            unclaimed: Some(SignalHandle { signals: tx }),
            signals,
        }
    }

    fn claim(&mut self) -> Option<SignalHandle> {
        self.unclaimed.take()
    }

    /// Drop a handle nobody claimed so the queue can close
    fn release_unclaimed(&mut self) {
        if self.unclaimed.take().is_some() {
            tracing::debug!("View started without wired signals");
        }
    }

    async fn next(&mut self) -> Option<Signal> {
        self.signals.recv().await
    }

    fn dispose(&mut self) {
        self.unclaimed = None;
        self.signals.close();
    }
}

enum Next {
    Signal(Option<Signal>),
    Event(ViewEvent),
}

/// Dashboard view state and its event loop
pub struct SyncView {
    api: Arc<dyn DashboardApi>,
    scheduler: SyncScheduler,
    events_tx: mpsc::UnboundedSender<ViewEvent>,
    events: mpsc::UnboundedReceiver<ViewEvent>,
    subscription: Subscription,
    token: Option<Secret>,
    token_status: TokenStatus,
    token_in_flight: bool,
    list: ListState,
    rows: Vec<TrackedEntity>,
    last_error: Option<String>,
}

impl std::fmt::Debug for SyncView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncView")
            .field("scheduler", &self.scheduler)
            .field("token_status", &self.token_status)
            .field("list", &self.list)
            .field("rows", &self.rows.len())
            .finish_non_exhaustive()
    }
}

impl SyncView {
    /// Create a view that refreshes active rows every `period`
    #[must_use]
    pub fn new(api: Arc<dyn DashboardApi>, period: Duration) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        Self {
            api,
            scheduler: SyncScheduler::new(period, events_tx.clone()),
            events_tx,
            events,
            subscription: Subscription::new(),
            token: None,
            token_status: TokenStatus::Pending,
            token_in_flight: false,
            list: ListState::NotLoaded,
            rows: Vec::new(),
            last_error: None,
        }
    }

    /// Hand out the signal handle
    ///
    /// Returns `None` on every call after the first, so a view can never be
    /// driven by two sets of handlers.
    pub fn wire_signals(&mut self) -> Option<SignalHandle> {
        let handle = self.subscription.claim();
        if handle.is_none() {
            tracing::warn!("Signals already wired for this view");
        }
        handle
    }

    /// Run the view until closed
    ///
    /// Requests the token and the list, then processes signals and events in
    /// arrival order. Returns the number of timers cancelled at teardown.
    pub async fn run(mut self) -> usize {
        self.subscription.release_unclaimed();
        self.request_token();
        self.reload();

        loop {
            let next = tokio::select! {
                signal = self.subscription.next() => Next::Signal(signal),
                Some(event) = self.events.recv() => Next::Event(event),
            };
            match next {
                Next::Signal(None) => break,
                Next::Signal(Some(signal)) => {
                    if self.on_signal(signal).is_break() {
                        break;
                    }
                }
                Next::Event(event) => self.on_event(event),
            }
        }

        self.teardown()
    }

    fn teardown(&mut self) -> usize {
        self.subscription.dispose();
        let cancelled = self.scheduler.teardown_all();
        tracing::info!(cancelled, "View closed");
        cancelled
    }

    fn on_signal(&mut self, signal: Signal) -> ControlFlow<()> {
        match signal {
            Signal::FocusEnter(id) => self.focus_enter(&id),
            Signal::FocusLeave(id) => self.focus_leave(&id),
            Signal::Delete(id) => self.delete(id),
            Signal::Import(id) => self.import(id),
            Signal::Reload => self.reload(),
            Signal::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Signal::Close => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn on_event(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Tick { entity, generation } => {
                if self.scheduler.is_current(&entity, generation) {
                    self.dispatch_refresh(entity, generation);
                }
            }
            ViewEvent::TokenLoaded(result) => self.token_loaded(result),
            ViewEvent::ListLoaded(result) => self.list_loaded(result),
            ViewEvent::Refreshed {
                entity,
                generation,
                result,
            } => self.refreshed(&entity, generation, result),
            ViewEvent::Imported { entity, result } => match result {
                Ok(_) => {
                    tracing::info!(entity = %entity, "Imported");
                    self.reload();
                }
                Err(e) => self.action_failed("Import", &entity, &e),
            },
            ViewEvent::Deleted { entity, result } => self.deleted(&entity, result),
        }
    }

    fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            list: self.list.clone(),
            token: self.token_status.clone(),
            rows: self.rows.clone(),
            live_timers: self.scheduler.live_timers(),
            last_error: self.last_error.clone(),
        }
    }

    fn row(&self, id: &EntityId) -> Option<&TrackedEntity> {
        self.rows.iter().find(|row| row.id == *id)
    }

    fn row_mut(&mut self, id: &EntityId) -> Option<&mut TrackedEntity> {
        self.rows.iter_mut().find(|row| row.id == *id)
    }

    // Signals

    fn focus_enter(&mut self, id: &EntityId) {
        if !self.row(id).is_some_and(|row| !row.pending_delete) {
            return;
        }
        let Some(generation) = self.scheduler.activate(id) else {
            return;
        };
        if let Some(row) = self.row_mut(id) {
            row.active = true;
        }
        self.dispatch_refresh(id.clone(), generation);
    }

    fn focus_leave(&mut self, id: &EntityId) {
        if self.scheduler.deactivate(id) {
            if let Some(row) = self.row_mut(id) {
                row.active = false;
            }
        }
    }

    fn delete(&mut self, id: EntityId) {
        if !self.row(&id).is_some_and(|row| !row.pending_delete) {
            return;
        }
        self.scheduler.remove(&id);

        let secret = self.secret_or_request();
        let Some(row) = self.row_mut(&id) else {
            return;
        };
        row.active = false;
        let Some(secret) = secret else {
            self.last_error = Some(format!("Cannot delete {id}: no token yet"));
            return;
        };
        row.pending_delete = true;

        let api = Arc::clone(&self.api);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.delete(id.as_str(), secret.as_str()).await;
            let _ = events.send(ViewEvent::Deleted { entity: id, result });
        });
    }

    fn import(&mut self, id: EntityId) {
        let Some(secret) = self.secret_or_request() else {
            self.last_error = Some(format!("Cannot import {id}: no token yet"));
            return;
        };

        let api = Arc::clone(&self.api);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.refresh(id.as_str(), secret.as_str()).await;
            let _ = events.send(ViewEvent::Imported { entity: id, result });
        });
    }

    fn reload(&mut self) {
        self.list = ListState::Loading;
        let api = Arc::clone(&self.api);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.list_videos().await;
            let _ = events.send(ViewEvent::ListLoaded(result));
        });
    }

    // Token

    fn request_token(&mut self) {
        self.token_in_flight = true;
        self.token_status = TokenStatus::Pending;
        let api = Arc::clone(&self.api);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_token().await;
            let _ = events.send(ViewEvent::TokenLoaded(result));
        });
    }

    /// The held secret, or `None` after making sure one is on its way
    fn secret_or_request(&mut self) -> Option<Secret> {
        if self.token.is_none() && !self.token_in_flight {
            self.request_token();
        }
        self.token.clone()
    }

    fn token_loaded(&mut self, result: Result<Secret, ClientError>) {
        self.token_in_flight = false;
        match result {
            Ok(secret) => {
                tracing::info!("Token acquired");
                self.token = Some(secret);
                self.token_status = TokenStatus::Ready;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token request failed");
                self.token_status = TokenStatus::Failed(e.to_string());
            }
        }
    }

    fn auth_rejected(&mut self) {
        if self.token.take().is_some() {
            tracing::warn!("Token rejected by server, requesting a new one");
        }
        if !self.token_in_flight {
            self.request_token();
        }
    }

    // Refresh

    fn dispatch_refresh(&mut self, entity: EntityId, generation: u64) {
        let Some(secret) = self.secret_or_request() else {
            tracing::debug!(entity = %entity, "No token yet, skipping refresh");
            return;
        };

        let api = Arc::clone(&self.api);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.refresh(entity.as_str(), secret.as_str()).await;
            let _ = events.send(ViewEvent::Refreshed {
                entity,
                generation,
                result,
            });
        });
    }

    fn refreshed(
        &mut self,
        entity: &EntityId,
        generation: u64,
        result: Result<VideoStats, ClientError>,
    ) {
        if !self.scheduler.is_current(entity, generation) {
            tracing::debug!(entity = %entity, generation, "Discarding refresh for inactive row");
            return;
        }
        let auth_rejected = result.as_ref().is_err_and(ClientError::is_auth_rejection);
        let Some(row) = self.row_mut(entity) else {
            return;
        };
        if row.pending_delete {
            return;
        }

        match result {
            Ok(stats) => row.apply(stats),
            Err(e) => {
                tracing::warn!(entity = %entity, error = %e, "Refresh failed, timer keeps running");
                row.mark_stale(e.to_string());
            }
        }

        if auth_rejected {
            self.auth_rejected();
        }
    }

    // List

    fn list_loaded(&mut self, result: Result<Vec<VideoStats>, ClientError>) {
        match result {
            Ok(videos) => {
                self.apply_list(videos);
                self.list = ListState::Loaded;
                tracing::debug!(rows = self.rows.len(), "List loaded");
            }
            Err(e) => {
                tracing::warn!(error = %e, "List load failed");
                let reason = e.to_string();
                for row in &mut self.rows {
                    row.mark_stale(reason.clone());
                }
                self.list = ListState::Failed(reason);
            }
        }
    }

    /// Replace the rows with the server's list, keeping row state by id
    fn apply_list(&mut self, videos: Vec<VideoStats>) {
        let mut previous: HashMap<EntityId, TrackedEntity> = self
            .rows
            .drain(..)
            .map(|row| (row.id.clone(), row))
            .collect();

        self.rows = videos
            .into_iter()
            .map(|stats| match previous.remove(&EntityId::new(&stats.video_id)) {
                Some(mut row) => {
                    row.apply(stats);
                    row
                }
                None => TrackedEntity::from_stats(stats),
            })
            .collect();

        for gone in previous.keys() {
            self.scheduler.remove(gone);
        }
    }

    // Delete

    fn deleted(&mut self, entity: &EntityId, result: Result<(), ClientError>) {
        match result {
            Ok(()) => {
                self.rows.retain(|row| row.id != *entity);
                tracing::info!(entity = %entity, "Deleted");
                if self.rows.is_empty() {
                    self.reload();
                }
            }
            Err(e) => {
                if let Some(row) = self.row_mut(entity) {
                    row.pending_delete = false;
                }
                self.action_failed("Delete", entity, &e);
            }
        }
    }

    fn action_failed(&mut self, action: &str, entity: &EntityId, error: &ClientError) {
        tracing::warn!(entity = %entity, error = %error, "{action} failed");
        self.last_error = Some(format!("{action} of {entity} failed: {error}"));
        if error.is_auth_rejection() {
            self.auth_rejected();
        }
    }
}
