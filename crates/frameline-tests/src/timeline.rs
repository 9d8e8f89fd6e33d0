//! Cross-crate timeline scenarios: editing-layer output feeding the
//! playback engine.

use frameline_core::{EngineError, FrameClock, FrameRate};
use frameline_timeline::{Clip, Timeline, Track};
use uuid::Uuid;

// ── Helpers ────────────────────────────────────────────────────

fn source_clip(source: Uuid, frames: i64, at: i64) -> Clip {
    Clip::new("clip", source, 0, frames, at)
}

// ── Split/trim output consumed as snapshots ────────────────────

#[test]
fn split_preserves_timeline_coverage() {
    let source = Uuid::new_v4();
    let original = source_clip(source, 300, 0);
    let (head, tail) = original.split_at(150).unwrap();

    let timeline = Timeline::single_track([head.clone(), tail.clone()]);
    assert!(timeline.validate().is_ok());
    assert_eq!(timeline.duration_frames(), 300);

    // The boundary frame belongs to the tail, never both.
    assert_eq!(timeline.clip_at(149).unwrap().id, head.id);
    assert_eq!(timeline.clip_at(150).unwrap().id, tail.id);
}

#[test]
fn split_siblings_map_to_the_same_source_frames_as_the_original() {
    let source = Uuid::new_v4();
    let original = Clip::new("raw", source, 30, 330, 0);
    let (head, tail) = original.split_at(100).unwrap();

    // Wherever a global frame lands, the resource-relative frame is the
    // one the unsplit clip would have produced.
    for global in [0, 50, 99] {
        assert_eq!(head.resource_frame(global), original.resource_frame(global));
    }
    for global in [100, 200, 299] {
        assert_eq!(tail.resource_frame(global), original.resource_frame(global));
    }
}

#[test]
fn reedited_timeline_is_a_fresh_snapshot() {
    let source = Uuid::new_v4();
    let v1 = Timeline::single_track([source_clip(source, 300, 0)]);
    let (head, tail) = v1.tracks[0].clips[0].split_at(120).unwrap();
    let v2 = Timeline::single_track([head, tail]);

    // Old snapshot is untouched by the edit.
    assert_eq!(v1.tracks[0].clips.len(), 1);
    assert_eq!(v2.tracks[0].clips.len(), 2);
    assert_eq!(v1.duration_frames(), v2.duration_frames());
}

// ── Validation at the engine boundary ──────────────────────────

#[test]
fn overlapping_edit_output_is_rejected_before_playback() {
    let source = Uuid::new_v4();
    let mut track = Track::new("V1");
    track.add_clip(source_clip(source, 150, 0));
    track.add_clip(source_clip(source, 150, 100));
    let mut timeline = Timeline::new();
    timeline.add_track(track);

    assert!(matches!(
        timeline.validate(),
        Err(EngineError::InvalidTimeline(_))
    ));
}

// ── Serialization (editing layers persist these) ───────────────

#[test]
fn timeline_round_trips_through_json() {
    let source = Uuid::new_v4();
    let timeline = Timeline::single_track([
        source_clip(source, 150, 0),
        Clip::new("tail", source, 150, 300, 150),
    ]);

    let json = serde_json::to_string(&timeline).unwrap();
    let back: Timeline = serde_json::from_str(&json).unwrap();
    assert_eq!(back, timeline);
    assert_eq!(back.duration_frames(), 300);
}

// ── Frame clock agreement with the timeline ────────────────────

#[test]
fn clip_boundaries_land_on_exact_seconds_at_30fps() {
    let clock = FrameClock::new(FrameRate::FPS_30);
    let source = Uuid::new_v4();
    let clip = Clip::new("five-seconds", source, 0, 150, 0);

    assert_eq!(clock.to_seconds(clip.timeline_end()), 5.0);
    assert_eq!(clock.to_frame(5.0), clip.timeline_end());
}
