//! Messages consumed by the view task

use crate::api::{Secret, VideoStats};
use crate::entity::EntityId;
use crate::error::ClientError;
use crate::view::ViewSnapshot;
use tokio::sync::oneshot;

/// UI signals, sent through a [`SignalHandle`](crate::SignalHandle)
#[derive(Debug)]
pub enum Signal {
    /// The row became active (pointer entered)
    FocusEnter(EntityId),
    /// The row stopped being active (pointer left)
    FocusLeave(EntityId),
    /// Delete the row
    Delete(EntityId),
    /// Import a video by id
    Import(EntityId),
    /// Reload the list
    Reload,
    /// Reply with the current view state
    Snapshot(oneshot::Sender<ViewSnapshot>),
    /// Tear the view down
    Close,
}

/// Timer ticks and network completions
#[derive(Debug)]
pub enum ViewEvent {
    /// Recurring refresh timer fired
    Tick {
        /// Row the timer belongs to
        entity: EntityId,
        /// Activation the timer was started for
        generation: u64,
    },
    /// Token request finished
    TokenLoaded(Result<Secret, ClientError>),
    /// List request finished
    ListLoaded(Result<Vec<VideoStats>, ClientError>),
    /// Refresh of an active row finished
    Refreshed {
        /// Row the call was for
        entity: EntityId,
        /// Activation the call was made under
        generation: u64,
        /// Outcome
        result: Result<VideoStats, ClientError>,
    },
    /// Import finished
    Imported {
        /// Imported id
        entity: EntityId,
        /// Outcome
        result: Result<VideoStats, ClientError>,
    },
    /// Delete finished
    Deleted {
        /// Deleted row
        entity: EntityId,
        /// Outcome
        result: Result<(), ClientError>,
    },
}
