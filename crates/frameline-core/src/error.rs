//! Error types for the playback engine.

use crate::clock::Frame;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for engine operations.
///
/// Stale asynchronous results are deliberately not represented here: an
/// epoch mismatch is discarded and logged, never surfaced as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("failed to load source {source_id}: {reason}")]
    ResourceLoad { source_id: Uuid, reason: String },

    #[error("failed to seek resource to frame {frame}: {reason}")]
    ResourceSeek { frame: Frame, reason: String },

    #[error("no clip covers global frame {frame}")]
    TimelineResolution { frame: Frame },

    #[error("invalid timeline: {0}")]
    InvalidTimeline(String),

    #[error("engine has shut down")]
    Shutdown,
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
