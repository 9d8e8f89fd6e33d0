//! The playback session: the one place current position lives.

use frameline_core::Frame;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the engine is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No clip loaded.
    Idle,
    /// A resource load is in flight for a target clip.
    Loading,
    Playing,
    Paused,
    /// An explicit seek is in flight; play/pause intent is preserved.
    Seeking,
    /// The global frame reached the end of the timeline.
    Ended,
}

/// An operation the machine is waiting on the resource for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingOp {
    /// An explicit seek to a global frame.
    Seek { target: Frame },
    /// A clip transition: position at `local` within `clip` once loaded.
    Transition { clip: Uuid, local: Frame },
}

/// The state machine's context, published as a snapshot on every accepted
/// transition.
///
/// `current_frame` is the only stored position in the entire engine. The
/// scrubber, preview time, and any other view are derivations of this
/// snapshot, never independently stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSession {
    /// Current state tag.
    pub state: PlaybackState,
    /// Current global frame. Never left indeterminate, including after
    /// errors.
    pub current_frame: Frame,
    /// The clip owning `current_frame`, if any.
    pub active_clip: Option<Uuid>,
    /// The source the resource currently has loaded.
    pub loaded_source: Option<Uuid>,
    /// The in-flight operation, if any.
    pub pending: Option<PendingOp>,
    /// Monotonic counter invalidating stale asynchronous results.
    pub epoch: u64,
}

impl PlaybackSession {
    /// A fresh idle session at frame 0.
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            current_frame: 0,
            active_clip: None,
            loaded_source: None,
            pending: None,
            epoch: 0,
        }
    }

    /// True while a load or seek is outstanding.
    #[inline]
    pub fn is_buffering(&self) -> bool {
        matches!(self.state, PlaybackState::Loading | PlaybackState::Seeking)
    }

    /// True once playback has reached the end of the timeline.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.state == PlaybackState::Ended
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}
