//! Frameline Engine - Frame-accurate timeline playback
//!
//! Drives a composed sequence of trimmed clips through a single playback
//! resource while keeping the UI scrubber and the resource's actual position
//! in exact agreement.
//!
//! Architecture:
//! - `PlaybackStateMachine`: the single source of truth for what is
//!   happening; consumes commands and resource events, emits resource
//!   requests
//! - `ResourceController`: serializing owner of the one playback resource
//! - `SyncBus`: one-way publication of every accepted transition
//! - `PlaybackEngine`: facade wiring the above on a single dispatch thread
//!
//! Position is always an integer frame; seconds exist only at the resource
//! boundary. Stale asynchronous results are invalidated by a monotonic
//! operation epoch rather than per-operation locks.

pub mod bus;
pub mod command;
pub mod controller;
pub mod engine;
pub mod event;
pub mod machine;
pub mod session;

pub use bus::{Subscription, SyncBus};
pub use command::{Command, ResourceRequest};
pub use controller::{PlaybackResource, ResourceController};
pub use engine::{EngineConfig, PlaybackEngine, ScrubRelease};
pub use event::{EngineEvent, ResourceEvent};
pub use machine::PlaybackStateMachine;
pub use session::{PendingOp, PlaybackSession, PlaybackState};
