//! Commands into the state machine and requests out to the controller.
//!
//! Both sides of the machine speak closed, tagged enums: payloads are
//! validated at construction, never sniffed at consumption.

use frameline_core::Frame;
use frameline_timeline::Timeline;
use uuid::Uuid;

/// A command submitted by the UI or editing layer.
///
/// Commands are the only way external code influences the session; no
/// subscriber ever mutates session fields directly.
#[derive(Debug, Clone)]
pub enum Command {
    /// Start or resume playback at the current frame.
    Play,
    /// Pause playback, holding the current frame.
    Pause,
    /// Seek to a global frame. Out-of-range targets are clamped, not errors.
    SeekToFrame(Frame),
    /// Replace the timeline snapshot and re-resolve the current position.
    LoadTimeline(Timeline),
    /// Start a scrubber drag: playback pauses, prior intent is remembered.
    BeginScrub,
    /// Move the scrubber. Cheap and repeatable; resource seeks are throttled.
    ScrubToFrame(Frame),
    /// End the drag with a final authoritative seek.
    EndScrub,
    /// Tear the engine down. Idempotent.
    Shutdown,
}

/// A request from the state machine to the resource controller.
///
/// `Load` and `Seek` carry the operation epoch they were issued under; the
/// controller tags its replies with it so the machine can discard results
/// that a later operation has superseded.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceRequest {
    /// Load a source into the resource. No-op if already loaded.
    Load { source_id: Uuid, epoch: u64 },
    /// Seek the resource. `seconds` is resource-relative time; `frame` is the
    /// same position in frames, carried for logging and error reporting.
    Seek {
        seconds: f64,
        frame: Frame,
        epoch: u64,
    },
    /// Start the resource playing from its current position.
    Play,
    /// Pause the resource.
    Pause,
    /// Stop the worker and the position cadence.
    Shutdown,
}

impl ResourceRequest {
    /// True for the request kinds a newer request of the same kind
    /// supersedes.
    pub(crate) fn is_supersedable(&self) -> bool {
        matches!(self, Self::Load { .. } | Self::Seek { .. })
    }

    /// True if `other` is the same supersedable kind as `self`.
    pub(crate) fn same_kind(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Load { .. }, Self::Load { .. }) | (Self::Seek { .. }, Self::Seek { .. })
        )
    }
}
