//! # Core Playback Traits
//!
//! This module defines the capability contract every audio device must
//! satisfy before the playback controller will drive it.
//!
//! ## Architecture
//!
//! The controller never talks to an audio engine directly. The host wraps its
//! device (a media element, a native output stream, a test double) in an
//! [`AudioAdapter`] and hands it over at construction:
//!
//! - **Transport**: `play`, `pause`, `seek`
//! - **Queries**: `is_playing`, `is_seeking`, `current_time`, `duration`
//! - **Lifecycle**: `init`, `destroy`
//! - **Volume**: adapter-owned state exposed through [`VolumeControl`]
//!
//! ## Threading Model
//!
//! Adapters must be `Send + Sync`. The controller calls them from whichever
//! thread runs the injected timer and frame services, never while holding one
//! of its own locks.
//!
//! ## Usage Example
//!
//! ```rust
//! use core_playback::{AudioAdapter, PlayFuture, PlayerContext, VolumeControl};
//! use futures::FutureExt;
//! use parking_lot::Mutex;
//!
//! #[derive(Default)]
//! struct Silence {
//!     volume: Mutex<f32>,
//!     position: Mutex<f64>,
//! }
//!
//! impl VolumeControl for Silence {
//!     fn volume(&self) -> f32 {
//!         *self.volume.lock()
//!     }
//!
//!     fn set_volume(&self, volume: f32) {
//!         *self.volume.lock() = volume;
//!     }
//! }
//!
//! impl AudioAdapter for Silence {
//!     fn init(&self, _context: &PlayerContext) -> core_playback::Result<()> {
//!         Ok(())
//!     }
//!     fn destroy(&self) {}
//!     fn play(&self) -> PlayFuture {
//!         futures::future::ready(Ok(())).boxed()
//!     }
//!     fn pause(&self) {}
//!     fn is_playing(&self) -> bool {
//!         false
//!     }
//!     fn is_seeking(&self) -> bool {
//!         false
//!     }
//!     fn current_time(&self) -> f64 {
//!         *self.position.lock()
//!     }
//!     fn duration(&self) -> f64 {
//!         0.0
//!     }
//!     fn seek(&self, time: f64) {
//!         *self.position.lock() = time;
//!     }
//! }
//! ```

use crate::context::PlayerContext;
use crate::error::Result;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deferred result of [`AudioAdapter::play`].
///
/// Resolves once the device has actually started playing, or failed to.
pub type PlayFuture = BoxFuture<'static, Result<()>>;

// ============================================================================
// Capabilities
// ============================================================================

/// The nine capabilities of the adapter contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Init,
    Destroy,
    Play,
    Pause,
    IsPlaying,
    IsSeeking,
    CurrentTime,
    Duration,
    Seek,
}

impl Capability {
    /// Every capability, in validation order.
    pub const ALL: [Capability; 9] = [
        Capability::Init,
        Capability::Destroy,
        Capability::Play,
        Capability::Pause,
        Capability::IsPlaying,
        Capability::IsSeeking,
        Capability::CurrentTime,
        Capability::Duration,
        Capability::Seek,
    ];

    /// Name of the adapter method providing this capability.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Init => "init",
            Capability::Destroy => "destroy",
            Capability::Play => "play",
            Capability::Pause => "pause",
            Capability::IsPlaying => "is_playing",
            Capability::IsSeeking => "is_seeking",
            Capability::CurrentTime => "current_time",
            Capability::Duration => "duration",
            Capability::Seek => "seek",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Adapter Contract
// ============================================================================

/// Output volume of a device, in `[0.0, 1.0]`.
///
/// Split from [`AudioAdapter`] so the fade scheduler can ramp anything that
/// has a volume knob.
pub trait VolumeControl: Send + Sync {
    /// Current output volume.
    fn volume(&self) -> f32;

    /// Set the output volume. Callers pass values in `[0.0, 1.0]`.
    fn set_volume(&self, volume: f32);
}

/// Trait for platform-specific audio devices.
///
/// Transport calls should be fast and non-blocking. Device-level failures
/// (a rejected seek, a stalled stream) are reported through the device's own
/// state queries and events, not through these methods.
///
/// ## Events
///
/// The adapter is the producer of `Playing`, `Pause`, `Seeked`, `TimeUpdate`
/// and `Error` events. It receives the [`PlayerContext`] in `init` and should
/// keep a clone to call [`PlayerContext::emit`]. The controller relies on
/// `Playing` to start segment fade-in and boundary polling.
pub trait AudioAdapter: VolumeControl {
    /// One-time setup, called by the controller during construction.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be opened. Construction of the
    /// controller fails with it.
    fn init(&self, context: &PlayerContext) -> Result<()>;

    /// Release device resources. Called at most once; no other method is
    /// called afterwards.
    fn destroy(&self);

    /// Start playback.
    ///
    /// Playback must begin before this returns; the future only reports when
    /// the device has actually started.
    fn play(&self) -> PlayFuture;

    /// Pause playback, keeping the position.
    fn pause(&self);

    /// Returns `true` while audio is playing.
    fn is_playing(&self) -> bool;

    /// Returns `true` while a seek is in flight.
    fn is_seeking(&self) -> bool;

    /// Playback position in seconds.
    fn current_time(&self) -> f64;

    /// Track duration in seconds.
    fn duration(&self) -> f64;

    /// Move the playback position. `time` is finite and non-negative.
    fn seek(&self, time: f64);

    /// Whether this adapter actually provides `capability`.
    ///
    /// Statically implemented adapters provide everything. Adapters assembled
    /// at runtime report the members they were not given.
    fn supports(&self, _capability: Capability) -> bool {
        true
    }
}

// ============================================================================
// Tests
// ============================================================================
