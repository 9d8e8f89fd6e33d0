//! End-to-end playback scenarios.
//!
//! The deterministic tests drive the state machine directly, answering its
//! resource requests the way the controller would; the live tests run the
//! whole engine (dispatch thread + resource worker) against a simulated
//! resource.

use crossbeam_channel::{unbounded, Receiver};
use frameline_core::{Frame, FrameClock, FrameRate};
use frameline_engine::{
    Command, EngineConfig, EngineEvent, PlaybackEngine, PlaybackResource, PlaybackSession,
    PlaybackState, PlaybackStateMachine, ResourceEvent, ResourceRequest, SyncBus,
};
use frameline_timeline::{Clip, Timeline};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

// ── Helpers ────────────────────────────────────────────────────

fn machine(config: EngineConfig) -> (PlaybackStateMachine, Receiver<ResourceRequest>) {
    let (tx, rx) = unbounded();
    let bus = Arc::new(SyncBus::new());
    let shared = Arc::new(RwLock::new(PlaybackSession::new()));
    (PlaybackStateMachine::new(config, tx, bus, shared), rx)
}

/// Answer outstanding load/seek requests like the controller would,
/// counting actual loads.
fn settle(
    m: &mut PlaybackStateMachine,
    rx: &Receiver<ResourceRequest>,
    loads: &mut usize,
) {
    while let Ok(req) = rx.try_recv() {
        match req {
            ResourceRequest::Load { source_id, epoch } => {
                *loads += 1;
                m.handle_resource_event(ResourceEvent::LoadComplete { source_id, epoch });
            }
            ResourceRequest::Seek { epoch, .. } => {
                m.handle_resource_event(ResourceEvent::SeekComplete { epoch });
            }
            _ => {}
        }
    }
}

// ── The canonical two-sibling-clip scenario ────────────────────

/// Timeline from the engine's reference scenario: one 10 s source at
/// 30 fps, split into two 5 s siblings placed back to back.
fn sibling_timeline(source: Uuid) -> Timeline {
    Timeline::single_track([
        Clip::new("A", source, 0, 150, 0),
        Clip::new("B", source, 150, 300, 150),
    ])
}

#[test]
fn sibling_clips_play_through_without_reload() {
    crate::init_tracing();
    let clock = FrameClock::new(FrameRate::FPS_30);
    let (mut m, rx) = machine(EngineConfig::default());
    let source = Uuid::new_v4();
    let mut loads = 0;

    m.handle_command(Command::LoadTimeline(sibling_timeline(source)));
    settle(&mut m, &rx, &mut loads);
    assert_eq!(loads, 1, "preload is the only load");
    m.handle_command(Command::Play);
    while rx.try_recv().is_ok() {}

    let first_clip = m.session().active_clip.unwrap();
    let mut observed: Vec<Frame> = vec![m.session().current_frame];
    let mut transition_seen_at = None;

    for resource_frame in 0..300 {
        let epoch = m.session().epoch;
        m.handle_resource_event(ResourceEvent::Position {
            seconds: clock.to_seconds(resource_frame),
            epoch,
        });
        // Steady state: scrubber frame and resource frame never diverge by
        // more than the one-frame early-end tolerance.
        assert!(
            (m.session().current_frame - resource_frame).abs() <= 1,
            "frame {} diverged from resource {}",
            m.session().current_frame,
            resource_frame
        );
        if transition_seen_at.is_none() && m.session().active_clip != Some(first_clip) {
            transition_seen_at = Some(m.session().current_frame);
        }
        observed.push(m.session().current_frame);
        settle(&mut m, &rx, &mut loads);
        if m.session().is_at_end() {
            break;
        }
    }

    // Boundary exactness: the hand-over lands on global frame 150 with the
    // second clip starting at local frame 0.
    assert_eq!(transition_seen_at, Some(150));
    // Same source: the 150 boundary never touched the resource again.
    assert_eq!(loads, 1);
    // Monotone run from 0 to 299, then Ended.
    assert!(observed.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*observed.last().unwrap(), 299);
    assert!(m.session().is_at_end());
    assert_eq!(m.session().state, PlaybackState::Ended);
}

#[test]
fn adjacent_clips_of_different_sources_transition_exactly_once() {
    let clock = FrameClock::new(FrameRate::FPS_30);
    let (mut m, rx) = machine(EngineConfig::default());
    let source_a = Uuid::new_v4();
    let source_b = Uuid::new_v4();
    // 150-frame and 90-frame clips, back to back.
    let a = Clip::new("A", source_a, 0, 150, 0);
    let b = Clip::new("B", source_b, 0, 90, 150);
    let b_id = b.id;
    let mut loads = 0;

    m.handle_command(Command::LoadTimeline(Timeline::single_track([a, b])));
    settle(&mut m, &rx, &mut loads);
    m.handle_command(Command::Play);
    while rx.try_recv().is_ok() {}

    // Drive clip A to its early-end frame.
    for resource_frame in 0..=149 {
        let epoch = m.session().epoch;
        m.handle_resource_event(ResourceEvent::Position {
            seconds: clock.to_seconds(resource_frame),
            epoch,
        });
    }
    assert_eq!(m.session().state, PlaybackState::Loading);
    assert_eq!(m.session().active_clip, Some(b_id));
    assert_eq!(m.session().current_frame, 150);

    settle(&mut m, &rx, &mut loads);
    assert_eq!(loads, 2, "one load per source");
    assert_eq!(m.session().state, PlaybackState::Playing);

    // Clip B plays out from its own zero.
    for resource_frame in 0..90 {
        let epoch = m.session().epoch;
        m.handle_resource_event(ResourceEvent::Position {
            seconds: clock.to_seconds(resource_frame),
            epoch,
        });
        settle(&mut m, &rx, &mut loads);
    }
    assert!(m.session().is_at_end());
    assert_eq!(m.session().current_frame, 239);
}

#[test]
fn rapid_seeks_settle_on_the_last_target() {
    let (mut m, rx) = machine(EngineConfig::default());
    let source = Uuid::new_v4();
    let mut loads = 0;
    m.handle_command(Command::LoadTimeline(sibling_timeline(source)));
    settle(&mut m, &rx, &mut loads);

    // Fast scrubbing: a burst of seeks with nothing resolved in between.
    for target in [40, 80, 120, 260] {
        m.handle_command(Command::SeekToFrame(target));
    }
    // The controller answers them in order; every ack but the last is
    // stale by the time it arrives.
    settle(&mut m, &rx, &mut loads);
    assert_eq!(m.session().current_frame, 260);
    assert_eq!(m.session().state, PlaybackState::Paused);
    assert!(m.session().pending.is_none());
}

// ── Live engine against a simulated resource ───────────────────

/// A self-clocking resource: each position poll while playing advances it
/// by exactly one frame, so cadence reports walk frame by frame.
struct SimResource {
    clock: FrameClock,
    frame: Frame,
    playing: bool,
    loads: Arc<AtomicUsize>,
}

impl SimResource {
    fn new(rate: FrameRate) -> (Self, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        (
            Self {
                clock: FrameClock::new(rate),
                frame: 0,
                playing: false,
                loads: Arc::clone(&loads),
            },
            loads,
        )
    }
}

impl PlaybackResource for SimResource {
    fn load(&mut self, _source_id: Uuid) -> Result<(), String> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.frame = 0;
        Ok(())
    }
    fn seek(&mut self, seconds: f64) -> Result<(), String> {
        self.frame = self.clock.to_frame(seconds);
        Ok(())
    }
    fn play(&mut self) {
        self.playing = true;
    }
    fn pause(&mut self) {
        self.playing = false;
    }
    fn position_seconds(&mut self) -> f64 {
        let seconds = self.clock.to_seconds(self.frame);
        if self.playing {
            self.frame += 1;
        }
        seconds
    }
}

#[test]
fn live_engine_plays_sibling_clips_to_the_end() {
    crate::init_tracing();
    let rate = FrameRate::FPS_60;
    let (resource, loads) = SimResource::new(rate);
    let config = EngineConfig {
        rate,
        ..EngineConfig::default()
    };
    let mut engine = PlaybackEngine::new(Box::new(resource), config);

    let (snap_tx, snap_rx) = unbounded();
    let _sub = engine.subscribe(move |event| {
        if let EngineEvent::Snapshot(snapshot) = event {
            let _ = snap_tx.send(snapshot.clone());
        }
    });

    // Half a second of timeline: two 15-frame siblings of one source.
    let source = Uuid::new_v4();
    engine.load_timeline(Timeline::single_track([
        Clip::new("A", source, 0, 15, 0),
        Clip::new("B", source, 15, 30, 15),
    ]));
    engine.play();

    let mut last_frame = 0;
    let mut ended = false;
    let deadline = Duration::from_secs(10);
    while let Ok(snapshot) = snap_rx.recv_timeout(deadline) {
        assert!(
            snapshot.current_frame >= last_frame,
            "scrubber went backwards: {} -> {}",
            last_frame,
            snapshot.current_frame
        );
        last_frame = snapshot.current_frame;
        if snapshot.is_at_end() {
            ended = true;
            break;
        }
    }

    assert!(ended, "playback never reached the end");
    assert_eq!(engine.current_frame(), 29);
    assert!(engine.is_at_end());
    assert_eq!(loads.load(Ordering::SeqCst), 1, "boundary must not reload");
    engine.shutdown();
}

#[test]
fn live_engine_surfaces_load_failure_and_freezes() {
    struct BrokenResource;
    impl PlaybackResource for BrokenResource {
        fn load(&mut self, _: Uuid) -> Result<(), String> {
            Err("source unreachable".into())
        }
        fn seek(&mut self, _: f64) -> Result<(), String> {
            Ok(())
        }
        fn play(&mut self) {}
        fn pause(&mut self) {}
        fn position_seconds(&mut self) -> f64 {
            0.0
        }
    }

    let mut engine = PlaybackEngine::new(Box::new(BrokenResource), EngineConfig::default());
    let (err_tx, err_rx) = unbounded();
    let _sub = engine.subscribe(move |event| {
        if let EngineEvent::Error { error, frame } = event {
            let _ = err_tx.send((error.clone(), *frame));
        }
    });

    let source = Uuid::new_v4();
    engine.load_timeline(Timeline::single_track([Clip::new("A", source, 0, 150, 0)]));

    let (error, frame) = err_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("error event");
    assert!(error.to_string().contains("source unreachable"));
    assert_eq!(frame, 0);

    // Halted, position frozen, no phantom playing state.
    assert_eq!(engine.current_state(), PlaybackState::Idle);
    assert_eq!(engine.current_frame(), 0);
    engine.shutdown();
}
