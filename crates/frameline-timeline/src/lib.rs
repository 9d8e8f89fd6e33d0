//! Frameline Timeline - Timeline data model
//!
//! Immutable-until-edited description of what is placed where:
//! - Clips: trimmed regions of a source, placed on the timeline
//! - Tracks: ordered, non-overlapping clip sequences
//! - Timeline: the snapshot the playback engine resolves positions against
//!
//! Editing (split/trim/insert) happens in an external layer; the playback
//! engine only ever reads these types.

pub mod clip;
pub mod timeline;

pub use clip::Clip;
pub use timeline::{Timeline, Track};
