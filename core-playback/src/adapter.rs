//! # Adapter Validation
//!
//! Completeness check over the adapter contract, plus [`CallbackAdapter`],
//! an adapter assembled from closures at runtime.
//!
//! Statically implemented adapters always pass validation. The check exists
//! for adapters whose members are bound dynamically (FFI handles, scripting
//! hosts), where a missing member is only known at runtime.

use crate::context::PlayerContext;
use crate::error::{PlaybackError, Result};
use crate::traits::{AudioAdapter, Capability, PlayFuture, VolumeControl};
use futures::FutureExt;
use parking_lot::Mutex;
use std::fmt;
use tracing::{debug, warn};

/// Fails with [`PlaybackError::ContractViolation`] naming the first
/// capability `adapter` does not provide.
///
/// Only [`AudioAdapter::supports`] is consulted; no capability is invoked.
pub fn validate_adapter(adapter: &dyn AudioAdapter) -> Result<()> {
    match Capability::ALL
        .into_iter()
        .find(|capability| !adapter.supports(*capability))
    {
        Some(capability) => {
            warn!(capability = capability.name(), "Adapter contract violation");
            Err(PlaybackError::ContractViolation { capability })
        }
        None => Ok(()),
    }
}

type InitFn = Box<dyn Fn(&PlayerContext) -> Result<()> + Send + Sync>;
type ActionFn = Box<dyn Fn() + Send + Sync>;
type PlayFn = Box<dyn Fn() -> PlayFuture + Send + Sync>;
type FlagFn = Box<dyn Fn() -> bool + Send + Sync>;
type TimeFn = Box<dyn Fn() -> f64 + Send + Sync>;
type SeekFn = Box<dyn Fn(f64) + Send + Sync>;

/// Adapter whose capabilities are individually bound closures.
///
/// Capabilities that were never bound are reported by
/// [`supports`](AudioAdapter::supports), so [`validate_adapter`] rejects the
/// adapter before any of them can be called. Called anyway, an unbound
/// capability does nothing and returns a neutral value.
///
/// ```rust
/// use core_playback::{validate_adapter, CallbackAdapter, Capability, PlaybackError};
///
/// let adapter = CallbackAdapter::builder()
///     .on_init(|_| Ok(()))
///     .on_destroy(|| {})
///     .on_pause(|| {})
///     .build();
///
/// match validate_adapter(&adapter) {
///     Err(PlaybackError::ContractViolation { capability }) => {
///         assert_eq!(capability, Capability::Play)
///     }
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
pub struct CallbackAdapter {
    init: Option<InitFn>,
    destroy: Option<ActionFn>,
    play: Option<PlayFn>,
    pause: Option<ActionFn>,
    is_playing: Option<FlagFn>,
    is_seeking: Option<FlagFn>,
    current_time: Option<TimeFn>,
    duration: Option<TimeFn>,
    seek: Option<SeekFn>,
    volume: Mutex<f32>,
}

impl CallbackAdapter {
    pub fn builder() -> CallbackAdapterBuilder {
        CallbackAdapterBuilder::default()
    }

    fn bound(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL
            .into_iter()
            .filter(|capability| self.supports(*capability))
    }
}

impl fmt::Debug for CallbackAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackAdapter")
            .field("bound", &self.bound().collect::<Vec<_>>())
            .field("volume", &*self.volume.lock())
            .finish()
    }
}

impl VolumeControl for CallbackAdapter {
    fn volume(&self) -> f32 {
        *self.volume.lock()
    }

    fn set_volume(&self, volume: f32) {
        *self.volume.lock() = volume;
    }
}

impl AudioAdapter for CallbackAdapter {
    fn init(&self, context: &PlayerContext) -> Result<()> {
        match &self.init {
            Some(init) => init(context),
            None => Ok(()),
        }
    }

    fn destroy(&self) {
        if let Some(destroy) = &self.destroy {
            destroy();
        }
    }

    fn play(&self) -> PlayFuture {
        match &self.play {
            Some(play) => play(),
            None => {
                debug!("play called on an adapter without a play binding");
                futures::future::ready(Err(PlaybackError::AdapterNotInitialized)).boxed()
            }
        }
    }

    fn pause(&self) {
        if let Some(pause) = &self.pause {
            pause();
        }
    }

    fn is_playing(&self) -> bool {
        self.is_playing.as_ref().map_or(false, |query| query())
    }

    fn is_seeking(&self) -> bool {
        self.is_seeking.as_ref().map_or(false, |query| query())
    }

    fn current_time(&self) -> f64 {
        self.current_time.as_ref().map_or(0.0, |query| query())
    }

    fn duration(&self) -> f64 {
        self.duration.as_ref().map_or(0.0, |query| query())
    }

    fn seek(&self, time: f64) {
        if let Some(seek) = &self.seek {
            seek(time);
        }
    }

    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Init => self.init.is_some(),
            Capability::Destroy => self.destroy.is_some(),
            Capability::Play => self.play.is_some(),
            Capability::Pause => self.pause.is_some(),
            Capability::IsPlaying => self.is_playing.is_some(),
            Capability::IsSeeking => self.is_seeking.is_some(),
            Capability::CurrentTime => self.current_time.is_some(),
            Capability::Duration => self.duration.is_some(),
            Capability::Seek => self.seek.is_some(),
        }
    }
}

/// Builder for [`CallbackAdapter`].
pub struct CallbackAdapterBuilder {
    adapter: CallbackAdapter,
}

impl Default for CallbackAdapterBuilder {
    fn default() -> Self {
        Self {
            adapter: CallbackAdapter {
                init: None,
                destroy: None,
                play: None,
                pause: None,
                is_playing: None,
                is_seeking: None,
                current_time: None,
                duration: None,
                seek: None,
                volume: Mutex::new(1.0),
            },
        }
    }
}

impl CallbackAdapterBuilder {
    pub fn on_init<F>(mut self, init: F) -> Self
    where
        F: Fn(&PlayerContext) -> Result<()> + Send + Sync + 'static,
    {
        self.adapter.init = Some(Box::new(init));
        self
    }

    pub fn on_destroy<F>(mut self, destroy: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.adapter.destroy = Some(Box::new(destroy));
        self
    }

    pub fn on_play<F>(mut self, play: F) -> Self
    where
        F: Fn() -> PlayFuture + Send + Sync + 'static,
    {
        self.adapter.play = Some(Box::new(play));
        self
    }

    pub fn on_pause<F>(mut self, pause: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.adapter.pause = Some(Box::new(pause));
        self
    }

    pub fn on_is_playing<F>(mut self, query: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.adapter.is_playing = Some(Box::new(query));
        self
    }

    pub fn on_is_seeking<F>(mut self, query: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.adapter.is_seeking = Some(Box::new(query));
        self
    }

    pub fn on_current_time<F>(mut self, query: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        self.adapter.current_time = Some(Box::new(query));
        self
    }

    pub fn on_duration<F>(mut self, query: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        self.adapter.duration = Some(Box::new(query));
        self
    }

    pub fn on_seek<F>(mut self, seek: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.adapter.seek = Some(Box::new(seek));
        self
    }

    /// Initial output volume. Default: 1.0
    pub fn initial_volume(self, volume: f32) -> Self {
        *self.adapter.volume.lock() = volume;
        self
    }

    pub fn build(self) -> CallbackAdapter {
        self.adapter
    }
}
