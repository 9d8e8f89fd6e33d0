//! Clip types for the timeline.

use frameline_core::{Frame, FrameRange};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A trimmed placement of a source region on the timeline.
///
/// `source_in..source_out` is the half-open window into the source media;
/// `timeline_start` is where that window lands on the global timeline. The
/// playback engine never mutates clips — it only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID, stable across edits
    pub id: Uuid,
    /// Underlying media identity; sibling clips split from one source share it
    pub source_id: Uuid,
    /// Clip name (displayed in UI)
    pub name: String,
    /// Source in point (inclusive)
    pub source_in: Frame,
    /// Source out point (exclusive), always > `source_in`
    pub source_out: Frame,
    /// Position on the global timeline
    pub timeline_start: Frame,
}

impl Clip {
    /// Create a new clip over `source_in..source_out`, placed at
    /// `timeline_start`.
    pub fn new(
        name: impl Into<String>,
        source_id: Uuid,
        source_in: Frame,
        source_out: Frame,
        timeline_start: Frame,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id,
            name: name.into(),
            source_in,
            source_out,
            timeline_start,
        }
    }

    /// Length in frames.
    #[inline]
    pub fn len(&self) -> Frame {
        self.source_out - self.source_in
    }

    /// True if the source window is empty or inverted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source_out <= self.source_in
    }

    /// One past the last timeline frame this clip covers.
    #[inline]
    pub fn timeline_end(&self) -> Frame {
        self.timeline_start + self.len()
    }

    /// The half-open timeline range this clip covers.
    #[inline]
    pub fn timeline_range(&self) -> FrameRange {
        FrameRange::new(self.timeline_start, self.timeline_end())
    }

    /// The half-open source window.
    #[inline]
    pub fn source_range(&self) -> FrameRange {
        FrameRange::new(self.source_in, self.source_out)
    }

    /// Clip-local frame for a global timeline frame (0 = first frame).
    #[inline]
    pub fn local_frame(&self, global: Frame) -> Frame {
        global - self.timeline_start
    }

    /// Resource-relative frame for a global timeline frame.
    ///
    /// The resource is addressed from its own zero, so the trim offset is
    /// applied exactly once here: `source_in + (global - timeline_start)`.
    /// Nothing else in the engine offsets by `source_in`.
    #[inline]
    pub fn resource_frame(&self, global: Frame) -> Frame {
        self.source_in + (global - self.timeline_start)
    }

    /// Split this clip at a global frame, producing two siblings that share
    /// `source_id`. Returns `None` unless the cut lands strictly inside the
    /// clip. Used by editing layers and tests; playback never calls this.
    pub fn split_at(&self, global: Frame) -> Option<(Clip, Clip)> {
        if !self.timeline_range().contains(global) || global == self.timeline_start {
            return None;
        }
        let cut = self.resource_frame(global);
        let head = Clip {
            id: Uuid::new_v4(),
            source_id: self.source_id,
            name: self.name.clone(),
            source_in: self.source_in,
            source_out: cut,
            timeline_start: self.timeline_start,
        };
        let tail = Clip {
            id: Uuid::new_v4(),
            source_id: self.source_id,
            name: self.name.clone(),
            source_in: cut,
            source_out: self.source_out,
            timeline_start: global,
        };
        Some((head, tail))
    }
}
