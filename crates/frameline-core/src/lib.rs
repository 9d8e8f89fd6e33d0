//! Frameline Core - Foundation types for frame-accurate playback
//!
//! This crate provides the fundamental types used throughout Frameline:
//! - Integer frame positions and rational frame rates
//! - The frame clock (the only frame ↔ seconds conversion point)
//! - Half-open frame ranges
//! - The engine error taxonomy

pub mod clock;
pub mod error;

pub use clock::{Frame, FrameClock, FrameRange, FrameRate};
pub use error::{EngineError, Result};
