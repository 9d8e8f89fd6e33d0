//! The engine facade: construction, lifecycle, and the public
//! command/query/subscription surface.

use crate::bus::{Subscription, SyncBus};
use crate::command::Command;
use crate::controller::{PlaybackResource, ResourceController};
use crate::event::{EngineEvent, ResourceEvent};
use crate::machine::PlaybackStateMachine;
use crate::session::{PlaybackSession, PlaybackState};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use frameline_core::{Frame, FrameRate};
use frameline_timeline::Timeline;
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// What happens to playback when a scrubber drag is released.
///
/// The predecessor codebases never agreed on this, so it is configuration
/// rather than a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrubRelease {
    /// Resume playback if it was running when the drag began.
    ResumeIfPlaying,
    /// Always hold paused; the user issues an explicit play.
    AlwaysPause,
}

/// Engine construction parameters.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// The project frame rate; all positions are frames at this rate.
    pub rate: FrameRate,
    /// Scrub release policy.
    pub scrub_release: ScrubRelease,
    /// Issue a resource seek on every Nth scrub command (minimum 1). The
    /// scrubber position itself updates on every command.
    pub scrub_seek_interval: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate: FrameRate::FPS_30,
            scrub_release: ScrubRelease::ResumeIfPlaying,
            scrub_seek_interval: 3,
        }
    }
}

/// An explicitly constructed, explicitly shut down playback engine.
///
/// Owns the state machine's dispatch thread and the resource controller.
/// Commands are queued and processed one at a time; queries read the last
/// published snapshot without blocking the machine.
pub struct PlaybackEngine {
    commands: Sender<Command>,
    shared: Arc<RwLock<PlaybackSession>>,
    bus: Arc<SyncBus>,
    dispatch: Option<JoinHandle<()>>,
    controller: ResourceController,
}

impl PlaybackEngine {
    /// Build the engine around the application's playback resource.
    pub fn new(resource: Box<dyn PlaybackResource>, config: EngineConfig) -> Self {
        let (commands, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let bus = Arc::new(SyncBus::new());
        let shared = Arc::new(RwLock::new(PlaybackSession::new()));

        let controller = ResourceController::spawn(resource, event_tx, config.rate);
        let machine = PlaybackStateMachine::new(
            config,
            controller.sender(),
            Arc::clone(&bus),
            Arc::clone(&shared),
        );
        let dispatch = thread::spawn(move || dispatch_loop(machine, command_rx, event_rx));
        info!("playback engine started");

        Self {
            commands,
            shared,
            bus,
            dispatch: Some(dispatch),
            controller,
        }
    }

    // ── Commands ────────────────────────────────────────────────

    pub fn play(&self) {
        self.send(Command::Play);
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn seek_to_frame(&self, frame: Frame) {
        self.send(Command::SeekToFrame(frame));
    }

    /// Replace the timeline snapshot. The engine re-resolves the current
    /// position against it; clip identity is not assumed stable beyond ids.
    pub fn load_timeline(&self, timeline: Timeline) {
        self.send(Command::LoadTimeline(timeline));
    }

    pub fn begin_scrub(&self) {
        self.send(Command::BeginScrub);
    }

    pub fn scrub_to_frame(&self, frame: Frame) {
        self.send(Command::ScrubToFrame(frame));
    }

    pub fn end_scrub(&self) {
        self.send(Command::EndScrub);
    }

    // ── Queries ─────────────────────────────────────────────────

    pub fn current_frame(&self) -> Frame {
        self.shared.read().current_frame
    }

    pub fn current_state(&self) -> PlaybackState {
        self.shared.read().state
    }

    pub fn is_at_end(&self) -> bool {
        self.shared.read().is_at_end()
    }

    /// The last published session snapshot.
    pub fn snapshot(&self) -> PlaybackSession {
        self.shared.read().clone()
    }

    // ── Subscription ────────────────────────────────────────────

    /// Subscribe to engine events. Callbacks run on the dispatch thread;
    /// keep them fast and feed anything back through commands only.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(callback)
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Stop the dispatch thread and the resource worker. Idempotent;
    /// undelivered events are dropped, not queued.
    pub fn shutdown(&mut self) {
        if let Some(dispatch) = self.dispatch.take() {
            let _ = self.commands.send(Command::Shutdown);
            if dispatch.join().is_err() {
                warn!("dispatch thread panicked during shutdown");
            }
            self.controller.shutdown();
            info!("playback engine shut down");
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("engine is shut down, dropping command");
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Single logical thread of control: every transition runs to completion
/// here before the next command or resource event is accepted.
fn dispatch_loop(
    mut machine: PlaybackStateMachine,
    commands: Receiver<Command>,
    events: Receiver<ResourceEvent>,
) {
    loop {
        select! {
            recv(commands) -> command => match command {
                Ok(Command::Shutdown) | Err(_) => {
                    machine.shutdown();
                    break;
                }
                Ok(command) => machine.handle_command(command),
            },
            recv(events) -> event => match event {
                Ok(event) => machine.handle_resource_event(event),
                Err(_) => {
                    // Resource worker gone; nothing left to reconcile.
                    machine.shutdown();
                    break;
                }
            },
        }
    }
    debug!("dispatch loop stopped");
}
