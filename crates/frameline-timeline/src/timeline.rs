//! Tracks and the timeline snapshot.

use frameline_core::{EngineError, Frame, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

use crate::clip::Clip;

/// An ordered sequence of non-overlapping clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: Uuid,
    /// Track name
    pub name: String,
    /// Clips, kept sorted by `timeline_start`
    pub clips: Vec<Clip>,
}

impl Track {
    /// Create a new empty track.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            clips: Vec::new(),
        }
    }

    /// Insert a clip, keeping the track sorted by timeline position.
    pub fn add_clip(&mut self, clip: Clip) {
        let at = self
            .clips
            .partition_point(|c| c.timeline_start <= clip.timeline_start);
        self.clips.insert(at, clip);
    }

    /// One past the last timeline frame any clip on this track covers.
    pub fn end_frame(&self) -> Frame {
        self.clips.iter().map(Clip::timeline_end).max().unwrap_or(0)
    }

    /// The clip covering a global frame, if any.
    ///
    /// Ranges are half-open, so a frame where one clip ends and the next
    /// begins belongs to the later-starting clip. The reverse scan makes
    /// that explicit even if the track ever holds touching siblings.
    pub fn clip_at(&self, global: Frame) -> Option<&Clip> {
        self.clips
            .iter()
            .rev()
            .find(|c| c.timeline_range().contains(global))
    }

    /// The first clip starting strictly after a global frame.
    pub fn next_clip_after(&self, global: Frame) -> Option<&Clip> {
        self.clips.iter().find(|c| c.timeline_start > global)
    }

    /// Check ordering, clip validity, and the no-overlap invariant.
    pub fn validate(&self) -> Result<()> {
        for clip in &self.clips {
            if clip.is_empty() {
                return Err(EngineError::InvalidTimeline(format!(
                    "clip {} ({}) has empty source window {}..{}",
                    clip.id, clip.name, clip.source_in, clip.source_out
                )));
            }
        }
        for pair in self.clips.windows(2) {
            if pair[1].timeline_start < pair[0].timeline_end() {
                return Err(EngineError::InvalidTimeline(format!(
                    "clips {} and {} overlap on track {}",
                    pair[0].id, pair[1].id, self.name
                )));
            }
        }
        Ok(())
    }
}

/// An immutable timeline snapshot the engine resolves positions against.
///
/// Each edit in the external editing layer produces a whole new `Timeline`;
/// the engine never assumes continuity between snapshots beyond clip ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Timeline {
    /// Tracks in priority order; earlier tracks win `clip_at` resolution
    pub tracks: SmallVec<[Track; 1]>,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a single-track timeline from clips (any order).
    pub fn single_track(clips: impl IntoIterator<Item = Clip>) -> Self {
        let mut track = Track::new("V1");
        for clip in clips {
            track.add_clip(clip);
        }
        let mut tracks = SmallVec::new();
        tracks.push(track);
        Self { tracks }
    }

    /// Add a track (lowest priority).
    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// True if no track holds any clip.
    pub fn is_empty(&self) -> bool {
        self.tracks.iter().all(|t| t.clips.is_empty())
    }

    /// Total duration in frames: max `timeline_end` over all clips.
    pub fn duration_frames(&self) -> Frame {
        self.tracks.iter().map(Track::end_frame).max().unwrap_or(0)
    }

    /// The clip covering a global frame. Tracks resolve in order; within a
    /// track, a shared boundary frame belongs to the later-starting clip.
    pub fn clip_at(&self, global: Frame) -> Option<&Clip> {
        self.tracks.iter().find_map(|t| t.clip_at(global))
    }

    /// The earliest clip starting strictly after a global frame, across all
    /// tracks. Lets playback jump gaps instead of stopping in them.
    pub fn next_clip_after(&self, global: Frame) -> Option<&Clip> {
        self.tracks
            .iter()
            .filter_map(|t| t.next_clip_after(global))
            .min_by_key(|c| c.timeline_start)
    }

    /// Find a clip by id.
    pub fn clip_by_id(&self, id: Uuid) -> Option<&Clip> {
        self.tracks
            .iter()
            .find_map(|t| t.clips.iter().find(|c| c.id == id))
    }

    /// Validate every track.
    pub fn validate(&self) -> Result<()> {
        for track in &self.tracks {
            track.validate()?;
        }
        Ok(())
    }
}
