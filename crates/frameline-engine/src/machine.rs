//! The playback state machine: the authoritative owner of "what is
//! happening".
//!
//! All transitions run on one logical thread and are processed to
//! completion before the next input is accepted. The machine consumes
//! commands and resource events, mutates the single `PlaybackSession`, and
//! emits resource requests; every accepted transition is published on the
//! synchronization bus.
//!
//! Two rules carry most of the weight here:
//! - Epoch guard: any resource result older than `session.epoch` is
//!   discarded. Issuing a new seek or transition while one is in flight is
//!   an epoch bump plus a fresh request, never an error and never a lock.
//! - Trim offsets are applied exactly once, in `Clip::resource_frame`. The
//!   resource is addressed from its own zero.

use crate::bus::SyncBus;
use crate::command::{Command, ResourceRequest};
use crate::engine::{EngineConfig, ScrubRelease};
use crate::event::{EngineEvent, ResourceEvent};
use crate::session::{PendingOp, PlaybackSession, PlaybackState};
use crossbeam_channel::Sender;
use frameline_core::{EngineError, Frame, FrameClock};
use frameline_timeline::{Clip, Timeline};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What playback should do once the in-flight operation completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Play,
    Pause,
}

struct ScrubState {
    /// Whether playback was (or was about to be) running when the drag
    /// started.
    resume_play: bool,
    /// Scrub commands since the last resource seek, for throttling.
    calls_since_seek: u32,
}

/// See module docs.
pub struct PlaybackStateMachine {
    session: PlaybackSession,
    timeline: Timeline,
    clock: FrameClock,
    config: EngineConfig,
    intent: Intent,
    scrub: Option<ScrubState>,
    requests: Sender<ResourceRequest>,
    bus: Arc<SyncBus>,
    shared: Arc<RwLock<PlaybackSession>>,
}

impl PlaybackStateMachine {
    /// Create a machine with an empty timeline. `shared` is the snapshot
    /// the engine's query API reads; it is updated on every publication.
    pub fn new(
        config: EngineConfig,
        requests: Sender<ResourceRequest>,
        bus: Arc<SyncBus>,
        shared: Arc<RwLock<PlaybackSession>>,
    ) -> Self {
        Self {
            session: PlaybackSession::new(),
            timeline: Timeline::new(),
            clock: FrameClock::new(config.rate),
            config,
            intent: Intent::Pause,
            scrub: None,
            requests,
            bus,
            shared,
        }
    }

    /// The current session. Tests and the engine read it; nothing external
    /// writes it.
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    // ── Command handling ────────────────────────────────────────

    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play => self.on_play(),
            Command::Pause => self.on_pause(),
            Command::SeekToFrame(frame) => self.on_seek(frame),
            Command::LoadTimeline(timeline) => self.on_load_timeline(timeline),
            Command::BeginScrub => self.on_begin_scrub(),
            Command::ScrubToFrame(frame) => self.on_scrub_to(frame),
            Command::EndScrub => self.on_end_scrub(),
            Command::Shutdown => self.shutdown(),
        }
    }

    fn on_play(&mut self) {
        self.intent = Intent::Play;
        match self.session.state {
            PlaybackState::Playing => {}
            PlaybackState::Loading | PlaybackState::Seeking => {
                // Intent recorded; applied when the in-flight op completes.
                debug!("play while buffering: intent updated");
            }
            PlaybackState::Ended => {
                // Restart from the top.
                self.internal_seek(0);
                self.publish();
            }
            PlaybackState::Idle | PlaybackState::Paused => {
                let Some((clip, target)) = self.resolve_target(self.session.current_frame) else {
                    debug!("play ignored: timeline is empty");
                    return;
                };
                let in_position = self.session.state == PlaybackState::Paused
                    && self.session.active_clip == Some(clip.id)
                    && self.session.loaded_source == Some(clip.source_id)
                    && target == self.session.current_frame;
                if in_position {
                    self.send(ResourceRequest::Play);
                    self.session.state = PlaybackState::Playing;
                } else if self.session.loaded_source == Some(clip.source_id) {
                    self.issue_seek(&clip, target);
                } else {
                    self.begin_load(&clip, target);
                }
                self.publish();
            }
        }
    }

    fn on_pause(&mut self) {
        self.intent = Intent::Pause;
        if self.session.state == PlaybackState::Playing {
            self.send(ResourceRequest::Pause);
            self.session.state = PlaybackState::Paused;
            self.publish();
        }
    }

    fn on_seek(&mut self, frame: Frame) {
        if self.timeline.is_empty() {
            warn!(frame, "seek ignored: timeline is empty");
            return;
        }
        self.internal_seek(frame);
        self.publish();
    }

    fn on_load_timeline(&mut self, timeline: Timeline) {
        if let Err(error) = timeline.validate() {
            warn!(%error, "rejecting invalid timeline");
            self.publish_error(error);
            return;
        }
        info!(
            duration = timeline.duration_frames(),
            "timeline snapshot replaced"
        );
        self.timeline = timeline;
        if self.timeline.is_empty() {
            // Nothing to resolve against; invalidate whatever is in flight.
            self.session.epoch += 1;
            self.session.state = PlaybackState::Idle;
            self.session.current_frame = 0;
            self.session.active_clip = None;
            self.session.pending = None;
            self.publish();
            return;
        }
        // Re-resolve the current position against the new snapshot. Clip
        // identity is not assumed stable across edits beyond the id field.
        self.internal_seek(self.session.current_frame);
        self.publish();
    }

    fn on_begin_scrub(&mut self) {
        if self.scrub.is_some() {
            return;
        }
        let resume_play = self.session.state == PlaybackState::Playing
            || (self.session.is_buffering() && self.intent == Intent::Play);
        self.scrub = Some(ScrubState {
            resume_play,
            calls_since_seek: 0,
        });
        self.intent = Intent::Pause;
        if self.session.state == PlaybackState::Playing {
            self.send(ResourceRequest::Pause);
            self.session.state = PlaybackState::Paused;
        }
        debug!(resume_play, "scrub started");
        self.publish();
    }

    fn on_scrub_to(&mut self, frame: Frame) {
        if self.scrub.is_none() {
            // Tolerate a missed begin_scrub from the UI layer.
            debug!(frame, "scrub without begin_scrub, treating as seek");
            self.on_seek(frame);
            return;
        }
        let Some((clip, target)) = self.resolve_target(frame) else {
            return;
        };
        // The scrubber position updates on every call; the resource only
        // seeks at the configured interval.
        self.session.current_frame = target;
        self.session.active_clip = Some(clip.id);
        let interval = self.config.scrub_seek_interval.max(1);
        let mut due = false;
        if let Some(scrub) = self.scrub.as_mut() {
            scrub.calls_since_seek += 1;
            if scrub.calls_since_seek >= interval {
                scrub.calls_since_seek = 0;
                due = true;
            }
        }
        if due {
            if self.session.loaded_source == Some(clip.source_id) {
                self.issue_seek(&clip, target);
            } else {
                self.begin_load(&clip, target);
            }
        }
        self.publish();
    }

    fn on_end_scrub(&mut self) {
        let Some(scrub) = self.scrub.take() else {
            return;
        };
        let resume = scrub.resume_play && self.config.scrub_release == ScrubRelease::ResumeIfPlaying;
        self.intent = if resume { Intent::Play } else { Intent::Pause };
        debug!(resume, frame = self.session.current_frame, "scrub ended");
        // Final authoritative seek to wherever the drag landed.
        self.internal_seek(self.session.current_frame);
        self.publish();
    }

    /// Tell the controller to stop. Idempotent; the engine tears the
    /// dispatch loop down around this.
    pub fn shutdown(&mut self) {
        let _ = self.requests.send(ResourceRequest::Shutdown);
    }

    // ── Resource event handling ─────────────────────────────────

    pub fn handle_resource_event(&mut self, event: ResourceEvent) {
        if event.epoch() < self.session.epoch {
            debug!(
                event_epoch = event.epoch(),
                current_epoch = self.session.epoch,
                "discarding stale resource result"
            );
            return;
        }
        match event {
            ResourceEvent::LoadComplete { source_id, .. } => self.on_load_complete(source_id),
            ResourceEvent::SeekComplete { .. } => self.on_seek_complete(),
            ResourceEvent::Position { seconds, .. } => self.on_position(seconds),
            ResourceEvent::EndOfMedia { .. } => self.on_end_of_media(),
            ResourceEvent::Failed { error, .. } => self.on_failed(error),
        }
    }

    fn on_load_complete(&mut self, source_id: uuid::Uuid) {
        self.session.loaded_source = Some(source_id);
        match self.session.pending {
            Some(PendingOp::Transition { clip, local }) => {
                if let Some(clip) = self.timeline.clip_by_id(clip).cloned() {
                    let global = clip.timeline_start + local;
                    self.session.pending = Some(PendingOp::Seek { target: global });
                    self.session.state = PlaybackState::Seeking;
                    self.send_seek(&clip, global);
                } else {
                    // The timeline changed while the load was in flight.
                    warn!("pending clip no longer exists, re-resolving position");
                    self.session.pending = None;
                    self.internal_seek(self.session.current_frame);
                }
            }
            Some(PendingOp::Seek { target }) => {
                if let Some((clip, target)) = self.resolve_target(target) {
                    self.session.state = PlaybackState::Seeking;
                    self.send_seek(&clip, target);
                    self.session.pending = Some(PendingOp::Seek { target });
                }
            }
            None => debug!("load completed with nothing pending"),
        }
        self.publish();
    }

    fn on_seek_complete(&mut self) {
        match self.session.pending.take() {
            Some(PendingOp::Seek { target }) => {
                self.session.current_frame = target;
            }
            Some(PendingOp::Transition { clip, local }) => {
                if let Some(clip) = self.timeline.clip_by_id(clip) {
                    self.session.current_frame = clip.timeline_start + local;
                }
            }
            None => {}
        }
        if self.scrub.is_some() || self.intent == Intent::Pause {
            self.session.state = PlaybackState::Paused;
        } else {
            self.send(ResourceRequest::Play);
            self.session.state = PlaybackState::Playing;
        }
        self.publish();
    }

    fn on_position(&mut self, seconds: f64) {
        if self.scrub.is_some() || self.session.state != PlaybackState::Playing {
            debug!(seconds, "position report outside steady playback ignored");
            return;
        }
        let Some(active) = self.session.active_clip else {
            return;
        };
        let Some(clip) = self.timeline.clip_by_id(active).cloned() else {
            warn!(%active, "active clip missing from timeline, ignoring report");
            return;
        };
        let resource_frame = self.clock.to_frame(seconds);
        let local = resource_frame - clip.source_in;
        // End-of-clip is declared one frame early to absorb delivery
        // jitter; the tolerance is a whole frame, not a tuned fraction of
        // a second.
        if local >= clip.len() - 1 {
            self.advance_past(&clip);
        } else if local >= 0 {
            self.session.current_frame = clip.timeline_start + local;
            self.publish();
        } else {
            debug!(local, "report precedes clip window, ignoring");
        }
    }

    fn on_end_of_media(&mut self) {
        if self.session.state != PlaybackState::Playing {
            debug!("end of media outside playback ignored");
            return;
        }
        match self.session.active_clip.and_then(|id| {
            self.timeline.clip_by_id(id).cloned()
        }) {
            Some(clip) => self.advance_past(&clip),
            None => self.finish(),
        }
    }

    fn on_failed(&mut self, error: EngineError) {
        warn!(%error, "resource operation failed, halting playback");
        if matches!(error, EngineError::ResourceLoad { .. }) {
            self.session.loaded_source = None;
        }
        // Position stays frozen at the last known good frame.
        self.session.state = PlaybackState::Idle;
        self.session.pending = None;
        self.session.active_clip = None;
        self.intent = Intent::Pause;
        self.publish_error(error);
        self.publish();
    }

    // ── Transitions shared by several inputs ────────────────────

    /// Leave `clip` at its end: hand over to the next clip or finish.
    fn advance_past(&mut self, clip: &Clip) {
        let end = clip.timeline_end();
        let next = self
            .timeline
            .clip_at(end)
            .or_else(|| self.timeline.next_clip_after(end))
            .cloned();
        let Some(next) = next else {
            self.finish();
            return;
        };
        let seamless = self.session.loaded_source == Some(next.source_id)
            && next.source_in == clip.source_out
            && next.timeline_start == end;
        if seamless {
            // Sibling clips cut from one source, contiguous in both source
            // and timeline: the resource just keeps playing.
            debug!(from = %clip.id, to = %next.id, frame = end, "seamless clip transition");
            self.session.active_clip = Some(next.id);
            self.session.current_frame = next.timeline_start;
            self.publish();
        } else {
            debug!(from = %clip.id, to = %next.id, "clip transition via load");
            self.session.epoch += 1;
            self.session.pending = Some(PendingOp::Transition {
                clip: next.id,
                local: 0,
            });
            self.session.active_clip = Some(next.id);
            self.session.current_frame = next.timeline_start;
            self.session.state = PlaybackState::Loading;
            self.send(ResourceRequest::Load {
                source_id: next.source_id,
                epoch: self.session.epoch,
            });
            self.publish();
        }
    }

    /// Playback reached the end of the timeline.
    fn finish(&mut self) {
        let duration = self.timeline.duration_frames();
        self.session.current_frame = (duration - 1).max(0);
        self.session.state = PlaybackState::Ended;
        self.session.pending = None;
        self.intent = Intent::Pause;
        self.send(ResourceRequest::Pause);
        info!(frame = self.session.current_frame, "playback ended");
        self.publish();
    }

    /// Epoch-bump and route a seek to `frame` through the cheap or the
    /// loading path. Does not publish; callers do.
    fn internal_seek(&mut self, frame: Frame) {
        let Some((clip, target)) = self.resolve_target(frame) else {
            warn!(frame, "seek ignored: timeline is empty");
            return;
        };
        if self.session.loaded_source == Some(clip.source_id) {
            self.issue_seek(&clip, target);
        } else {
            self.begin_load(&clip, target);
        }
    }

    /// Clamp a requested frame into the timeline and resolve its owning
    /// clip. Targets in gaps snap forward to the next clip; past-end
    /// targets clamp to the final frame. `None` only for an empty timeline.
    fn resolve_target(&self, frame: Frame) -> Option<(Clip, Frame)> {
        let duration = self.timeline.duration_frames();
        if duration == 0 {
            return None;
        }
        let target = frame.clamp(0, duration - 1);
        if target != frame {
            debug!(frame, target, "target outside timeline, clamped");
        }
        if let Some(clip) = self.timeline.clip_at(target) {
            return Some((clip.clone(), target));
        }
        if let Some(clip) = self.timeline.next_clip_after(target).cloned() {
            let start = clip.timeline_start;
            debug!(frame, start, "target in a gap, snapping to next clip");
            return Some((clip, start));
        }
        let clip = self.timeline.clip_at(duration - 1)?.clone();
        Some((clip, duration - 1))
    }

    /// Cheap path: the right source is already loaded.
    fn issue_seek(&mut self, clip: &Clip, target: Frame) {
        self.session.epoch += 1;
        self.session.pending = Some(PendingOp::Seek { target });
        self.session.active_clip = Some(clip.id);
        self.session.current_frame = target;
        self.session.state = PlaybackState::Seeking;
        self.send_seek(clip, target);
    }

    /// Full path: load first, then seek on completion.
    fn begin_load(&mut self, clip: &Clip, target: Frame) {
        self.session.epoch += 1;
        self.session.pending = Some(PendingOp::Transition {
            clip: clip.id,
            local: clip.local_frame(target),
        });
        self.session.active_clip = Some(clip.id);
        self.session.current_frame = target;
        self.session.state = PlaybackState::Loading;
        self.send(ResourceRequest::Load {
            source_id: clip.source_id,
            epoch: self.session.epoch,
        });
    }

    /// Send the resource-relative seek for a global target under the
    /// current epoch.
    fn send_seek(&mut self, clip: &Clip, target: Frame) {
        let resource_frame = clip.resource_frame(target);
        self.send(ResourceRequest::Seek {
            seconds: self.clock.to_seconds(resource_frame),
            frame: resource_frame,
            epoch: self.session.epoch,
        });
    }

    fn send(&self, request: ResourceRequest) {
        if self.requests.send(request).is_err() {
            warn!("resource controller is gone, dropping request");
        }
    }

    fn publish(&self) {
        *self.shared.write() = self.session.clone();
        self.bus.publish(&EngineEvent::Snapshot(self.session.clone()));
    }

    fn publish_error(&self, error: EngineError) {
        self.bus.publish(&EngineEvent::Error {
            error,
            frame: self.session.current_frame,
        });
    }
}
