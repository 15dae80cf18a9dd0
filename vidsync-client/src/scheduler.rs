//! Per-entity refresh timers
//!
//! The scheduler owns at most one recurring timer per entity. A timer is a
//! spawned task that posts [`ViewEvent::Tick`] to the view queue once per
//! period; it never calls the network itself. Each activation gets a fresh
//! generation number, and the view drops ticks and completions whose
//! generation is no longer current. Aborting a timer stops future ticks only.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//! use vidsync_client::{EntityId, SyncScheduler};
//!
//! # async fn example() {
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let mut scheduler = SyncScheduler::new(Duration::from_secs(5), tx);
//!
//! let video = EntityId::from("dQw4w9WgXcQ");
//! assert!(scheduler.activate(&video).is_some());
//! assert!(scheduler.activate(&video).is_none());
//!
//! let _tick = rx.recv().await;
//! scheduler.teardown_all();
//! # }
//! ```

use crate::entity::EntityId;
use crate::event::ViewEvent;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug)]
struct Timer {
    task: JoinHandle<()>,
    generation: u64,
}

/// Owner of the entity → refresh timer mapping
#[derive(Debug)]
pub struct SyncScheduler {
    period: Duration,
    events: UnboundedSender<ViewEvent>,
    timers: HashMap<EntityId, Timer>,
    next_generation: u64,
    closed: bool,
}

impl SyncScheduler {
    /// Create a scheduler that posts ticks to `events` every `period`
    #[must_use]
    pub fn new(period: Duration, events: UnboundedSender<ViewEvent>) -> Self {
        Self {
            period,
            events,
            timers: HashMap::new(),
            next_generation: 0,
            closed: false,
        }
    }

    /// Start the recurring timer for `entity`
    ///
    /// Returns the new activation's generation. Returns `None` without
    /// touching anything when `entity` already has a timer or the scheduler
    /// has been torn down. The caller performs the immediate refresh; the
    /// first tick arrives one period from now.
    pub fn activate(&mut self, entity: &EntityId) -> Option<u64> {
        if self.closed || self.timers.contains_key(entity) {
            return None;
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let task = spawn_ticker(
            self.events.clone(),
            entity.clone(),
            generation,
            self.period,
        );
        self.timers.insert(entity.clone(), Timer { task, generation });

        tracing::debug!(entity = %entity, generation, "Refresh timer started");
        Some(generation)
    }

    /// Cancel the timer for `entity`; returns whether one existed
    pub fn deactivate(&mut self, entity: &EntityId) -> bool {
        match self.timers.remove(entity) {
            Some(timer) => {
                timer.task.abort();
                tracing::debug!(entity = %entity, generation = timer.generation, "Refresh timer stopped");
                true
            }
            None => false,
        }
    }

    /// Cancel the timer of an entity that is being deleted
    pub fn remove(&mut self, entity: &EntityId) -> bool {
        self.deactivate(entity)
    }

    /// Cancel every timer and refuse further activations
    ///
    /// Returns the number of timers cancelled. Calling it again is a no-op.
    pub fn teardown_all(&mut self) -> usize {
        self.closed = true;
        let cancelled = self.timers.len();
        for (_, timer) in self.timers.drain() {
            timer.task.abort();
        }
        if cancelled > 0 {
            tracing::debug!(cancelled, "Refresh timers torn down");
        }
        cancelled
    }

    /// Whether `generation` is the live activation of `entity`
    #[must_use]
    pub fn is_current(&self, entity: &EntityId, generation: u64) -> bool {
        self.timers
            .get(entity)
            .is_some_and(|timer| timer.generation == generation)
    }

    /// Whether `entity` has a running timer
    #[must_use]
    pub fn is_active(&self, entity: &EntityId) -> bool {
        self.timers.contains_key(entity)
    }

    /// Number of running timers
    #[must_use]
    pub fn live_timers(&self) -> usize {
        self.timers.len()
    }

    /// Whether [`teardown_all`](Self::teardown_all) has run
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if !self.closed {
            self.teardown_all();
        }
    }
}

fn spawn_ticker(
    events: UnboundedSender<ViewEvent>,
    entity: EntityId,
    generation: u64,
    period: Duration,
) -> JoinHandle<()> {
    let first = Instant::now() + period;
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval_at(first, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticks.tick().await;
            let tick = ViewEvent::Tick {
                entity: entity.clone(),
                generation,
            };
            if events.send(tick).is_err() {
                break;
            }
        }
    })
}
