//! Resource controller: serializing owner of the single playback resource.
//!
//! All resource I/O happens on one worker thread, so at most one operation
//! is ever in flight. A newer `Load`/`Seek` waiting in the queue supersedes
//! an older one of the same kind; superseded requests are dropped here, and
//! anything already executing is neutralized by the state machine's epoch
//! guard. The controller never retries into a consumer that has gone away:
//! a failed event send stops the worker.

use crate::command::ResourceRequest;
use crate::event::ResourceEvent;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use frameline_core::{EngineError, FrameRate};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The narrow contract of the external playback resource.
///
/// The resource plays whatever source is loaded, addressed in continuous
/// seconds from its own zero. Trim semantics live entirely in the engine;
/// the resource knows nothing about clips. Load/seek failures are reported
/// as plain reasons and wrapped into [`EngineError`] by the controller.
pub trait PlaybackResource: Send {
    /// Load a source. Called at most once per distinct source while loaded.
    fn load(&mut self, source_id: Uuid) -> std::result::Result<(), String>;
    /// Seek to a resource-relative time in seconds.
    fn seek(&mut self, seconds: f64) -> std::result::Result<(), String>;
    /// Start playing from the current position. Fire-and-forget.
    fn play(&mut self);
    /// Pause at the current position. Fire-and-forget.
    fn pause(&mut self);
    /// Current resource-relative position in seconds.
    fn position_seconds(&mut self) -> f64;
    /// True once the loaded media is exhausted.
    fn is_ended(&mut self) -> bool {
        false
    }
}

/// Owns the resource worker thread and its request queue.
pub struct ResourceController {
    requests: Sender<ResourceRequest>,
    worker: Option<JoinHandle<()>>,
}

impl ResourceController {
    /// Spawn the worker. `events` is the state machine's inbox; `rate` sets
    /// the position report cadence (one report per frame period).
    pub fn spawn(
        resource: Box<dyn PlaybackResource>,
        events: Sender<ResourceEvent>,
        rate: FrameRate,
    ) -> Self {
        let (requests, rx) = unbounded();
        let period = Duration::from_secs_f64(rate.frame_duration_secs());
        let worker = thread::spawn(move || run_worker(resource, rx, events, period));
        Self {
            requests,
            worker: Some(worker),
        }
    }

    /// A handle for submitting requests (held by the state machine).
    pub fn sender(&self) -> Sender<ResourceRequest> {
        self.requests.clone()
    }

    /// Stop the worker. Idempotent; undelivered events are dropped.
    pub fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.requests.send(ResourceRequest::Shutdown);
            if worker.join().is_err() {
                warn!("resource worker panicked during shutdown");
            }
        }
    }
}

impl Drop for ResourceController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Marks queue entries that a later same-kind request supersedes.
///
/// Returns one flag per request; `false` means "drop without executing".
/// Play/Pause/Shutdown are never dropped and keep their relative order.
pub(crate) fn superseded_mask(batch: &[ResourceRequest]) -> Vec<bool> {
    let mut keep = vec![true; batch.len()];
    for (i, req) in batch.iter().enumerate() {
        if req.is_supersedable() && batch[i + 1..].iter().any(|later| later.same_kind(req)) {
            keep[i] = false;
        }
    }
    keep
}

struct Worker {
    resource: Box<dyn PlaybackResource>,
    events: Sender<ResourceEvent>,
    loaded: Option<Uuid>,
    playing: bool,
    /// Epoch of the most recent load/seek; position reports are tagged
    /// with it.
    epoch: u64,
}

enum Flow {
    Continue,
    Stop,
}

fn run_worker(
    resource: Box<dyn PlaybackResource>,
    rx: Receiver<ResourceRequest>,
    events: Sender<ResourceEvent>,
    period: Duration,
) {
    let mut worker = Worker {
        resource,
        events,
        loaded: None,
        playing: false,
        epoch: 0,
    };
    info!("resource worker started");

    'outer: loop {
        let first = if worker.playing {
            match rx.recv_timeout(period) {
                Ok(req) => Some(req),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(req) => Some(req),
                Err(_) => break,
            }
        };

        let Some(first) = first else {
            if let Flow::Stop = worker.tick() {
                break;
            }
            continue;
        };

        // Drain whatever else is queued so stale loads/seeks can be dropped
        // before they touch the resource.
        let mut batch = vec![first];
        while let Ok(next) = rx.try_recv() {
            batch.push(next);
        }
        let keep = superseded_mask(&batch);
        for (req, keep) in batch.into_iter().zip(keep) {
            if !keep {
                debug!(?req, "dropping superseded request");
                continue;
            }
            if let Flow::Stop = worker.handle(req) {
                break 'outer;
            }
        }
    }
    info!("resource worker stopped");
}

impl Worker {
    fn handle(&mut self, req: ResourceRequest) -> Flow {
        match req {
            ResourceRequest::Load { source_id, epoch } => {
                self.epoch = epoch;
                self.playing = false;
                if self.loaded == Some(source_id) {
                    debug!(%source_id, "source already loaded, reusing");
                    return self.send(ResourceEvent::LoadComplete { source_id, epoch });
                }
                match self.resource.load(source_id) {
                    Ok(()) => {
                        info!(%source_id, "source loaded");
                        self.loaded = Some(source_id);
                        self.send(ResourceEvent::LoadComplete { source_id, epoch })
                    }
                    Err(reason) => {
                        warn!(%source_id, %reason, "load failed");
                        self.send(ResourceEvent::Failed {
                            error: EngineError::ResourceLoad { source_id, reason },
                            epoch,
                        })
                    }
                }
            }
            ResourceRequest::Seek {
                seconds,
                frame,
                epoch,
            } => {
                self.epoch = epoch;
                match self.resource.seek(seconds) {
                    Ok(()) => {
                        debug!(frame, seconds, "seek complete");
                        self.send(ResourceEvent::SeekComplete { epoch })
                    }
                    Err(reason) => {
                        warn!(frame, %reason, "seek failed");
                        self.send(ResourceEvent::Failed {
                            error: EngineError::ResourceSeek { frame, reason },
                            epoch,
                        })
                    }
                }
            }
            ResourceRequest::Play => {
                self.resource.play();
                self.playing = true;
                Flow::Continue
            }
            ResourceRequest::Pause => {
                self.resource.pause();
                self.playing = false;
                Flow::Continue
            }
            ResourceRequest::Shutdown => Flow::Stop,
        }
    }

    /// One cadence tick: report position and end-of-media while playing.
    fn tick(&mut self) -> Flow {
        let seconds = self.resource.position_seconds();
        if let Flow::Stop = self.send(ResourceEvent::Position {
            seconds,
            epoch: self.epoch,
        }) {
            return Flow::Stop;
        }
        if self.resource.is_ended() {
            self.playing = false;
            return self.send(ResourceEvent::EndOfMedia { epoch: self.epoch });
        }
        Flow::Continue
    }

    fn send(&self, event: ResourceEvent) -> Flow {
        if self.events.send(event).is_err() {
            // The state machine is gone; stop emitting instead of retrying
            // into a dead consumer.
            debug!("event receiver dropped, stopping worker");
            Flow::Stop
        } else {
            Flow::Continue
        }
    }
}
