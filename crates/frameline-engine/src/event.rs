//! Events from the resource controller and out to subscribers.

use frameline_core::{EngineError, Frame};
use crate::session::PlaybackSession;
use uuid::Uuid;

/// An asynchronous result or report from the resource controller.
///
/// Every variant carries the epoch of the operation stream it belongs to;
/// the state machine discards anything older than the session's current
/// epoch. That single rule replaces the per-operation boolean locks this
/// engine's predecessors accumulated.
#[derive(Debug, Clone)]
pub enum ResourceEvent {
    /// A `Load` request finished; `source_id` is now the loaded source.
    LoadComplete { source_id: Uuid, epoch: u64 },
    /// A `Seek` request finished; the resource sits at the requested time.
    SeekComplete { epoch: u64 },
    /// Periodic position report while the resource is playing.
    Position { seconds: f64, epoch: u64 },
    /// The resource ran out of media.
    EndOfMedia { epoch: u64 },
    /// A load or seek failed.
    Failed { error: EngineError, epoch: u64 },
}

impl ResourceEvent {
    /// The epoch this event was issued under.
    pub fn epoch(&self) -> u64 {
        match self {
            Self::LoadComplete { epoch, .. }
            | Self::SeekComplete { epoch }
            | Self::Position { epoch, .. }
            | Self::EndOfMedia { epoch }
            | Self::Failed { epoch, .. } => *epoch,
        }
    }
}

/// What the engine publishes on the synchronization bus.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Full session snapshot after an accepted transition.
    Snapshot(PlaybackSession),
    /// Playback halted; position is frozen at `frame`.
    Error { error: EngineError, frame: Frame },
}
