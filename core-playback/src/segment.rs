//! Time-range value types for bounded playback.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Returns `true` for a finite, non-negative time in seconds.
pub fn is_valid_time(time: f64) -> bool {
    time.is_finite() && time >= 0.0
}

/// A bounded range `[start, end)` of a track, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    start: f64,
    end: f64,
}

impl Segment {
    /// # Errors
    ///
    /// Returns [`PlaybackError::InvalidSegment`] unless both bounds are finite
    /// and `0 <= start < end`.
    pub fn new(start: f64, end: f64) -> Result<Self> {
        if !is_valid_time(start) || !is_valid_time(end) || start >= end {
            return Err(PlaybackError::InvalidSegment { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }
}

/// How a segment is played.
///
/// Fade lengths are in seconds. `None` or zero means no fade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentOptions {
    pub looping: bool,
    pub fade_in: Option<f64>,
    pub fade_out: Option<f64>,
}

impl SegmentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn fade_in(mut self, seconds: f64) -> Self {
        self.fade_in = Some(seconds);
        self
    }

    pub fn fade_out(mut self, seconds: f64) -> Self {
        self.fade_out = Some(seconds);
        self
    }

    /// Checks the fade lengths.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::InvalidTime`] for a negative or non-finite
    /// fade length, or one too long to express as a [`Duration`].
    pub fn validate(&self) -> Result<()> {
        for seconds in [self.fade_in, self.fade_out].into_iter().flatten() {
            if !is_valid_time(seconds) || Duration::try_from_secs_f64(seconds).is_err() {
                return Err(PlaybackError::InvalidTime(seconds));
            }
        }
        Ok(())
    }

    /// Fade-in length, if one is requested.
    pub fn fade_in_duration(&self) -> Option<Duration> {
        positive_duration(self.fade_in)
    }

    /// Fade-out length, if one is requested.
    pub fn fade_out_duration(&self) -> Option<Duration> {
        positive_duration(self.fade_out)
    }
}

fn positive_duration(seconds: Option<f64>) -> Option<Duration> {
    seconds
        .filter(|seconds| is_valid_time(*seconds) && *seconds > 0.0)
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
}
