//! Frame positions, frame rates, and the frame clock.
//!
//! Positions are integer frame counts everywhere in the engine. Fractional
//! seconds exist only transiently at the playback-resource boundary, and the
//! `FrameClock` is the one place they are produced or consumed. Internally
//! conversions run on rational arithmetic so NTSC rates (30000/1001 etc.)
//! round-trip exactly.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer frame count at the project's fixed rate.
///
/// Canonical position type throughout the engine. Signed so that relative
/// arithmetic (offsets, deltas) never underflows mid-expression.
pub type Frame = i64;

/// Frame rate as a rational number (e.g., 30000/1001 for 29.97 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 30000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Duration of a single frame in seconds.
    #[inline]
    pub fn frame_duration_secs(self) -> f64 {
        self.denominator as f64 / self.numerator as f64
    }

    /// Common frame rates
    pub const FPS_23_976: Self = Self::new(24000, 1001);
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_50: Self = Self::new(50, 1);
    pub const FPS_59_94: Self = Self::new(60000, 1001);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

/// Converter between integer frames and continuous seconds at a fixed rate.
///
/// `to_seconds` is the exact inverse of `to_frame` for integer frames:
/// `to_frame(to_seconds(f)) == f` for every representable `f`. No other
/// component performs time arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    rate: FrameRate,
}

impl FrameClock {
    /// Create a clock for the given project rate.
    pub const fn new(rate: FrameRate) -> Self {
        Self { rate }
    }

    /// The project rate this clock converts at.
    #[inline]
    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    /// Convert continuous seconds (from the resource) to the nearest frame.
    #[inline]
    pub fn to_frame(&self, seconds: f64) -> Frame {
        (seconds * self.rate.numerator as f64 / self.rate.denominator as f64).round() as Frame
    }

    /// Convert an integer frame to seconds (for the resource boundary).
    #[inline]
    pub fn to_seconds(&self, frame: Frame) -> f64 {
        let t = Rational64::new(
            frame * self.rate.denominator as i64,
            self.rate.numerator as i64,
        );
        *t.numer() as f64 / *t.denom() as f64
    }
}

/// A half-open frame range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRange {
    /// First frame in the range (inclusive)
    pub start: Frame,
    /// One past the last frame (exclusive)
    pub end: Frame,
}

impl FrameRange {
    /// Create a new range. `end < start` is normalized to empty.
    #[inline]
    pub fn new(start: Frame, end: Frame) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Number of frames in the range.
    #[inline]
    pub fn len(self) -> Frame {
        self.end - self.start
    }

    /// True if the range covers no frames.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.end <= self.start
    }

    /// Check if a frame is within this range.
    #[inline]
    pub fn contains(self, frame: Frame) -> bool {
        frame >= self.start && frame < self.end
    }

    /// Check if two ranges overlap.
    pub fn overlaps(self, other: Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}
