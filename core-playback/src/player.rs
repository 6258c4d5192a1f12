//! # Segment Playback Controller
//!
//! [`SegmentPlayer`] drives an [`AudioAdapter`] either over the whole track
//! or over a bounded [`Segment`], optionally looping and fading at the edges.
//!
//! ## Overview
//!
//! Devices report their position too coarsely to stop on a segment boundary,
//! so segment playback polls the adapter once per rendering frame through the
//! injected [`FrameScheduler`](bridge_traits::FrameScheduler). Volume fades
//! run on the injected [`TimerService`](bridge_traits::TimerService) via a
//! [`Fader`].
//!
//! ## Segment Flow
//!
//! 1. `play_segment` validates its input, supersedes any previous session,
//!    seeks to the segment start, sets the initial volume and calls `play`.
//! 2. The adapter emits `Playing`. The controller's listener activates the
//!    session: fade-in starts and the polling loop is scheduled, once.
//! 3. Every frame reads one `(current_time, is_playing)` snapshot and applies
//!    the session's decision: keep going, rewind (looping), pause (device
//!    stopped), or pause and emit `Ended`. Fade-out starts on the first frame
//!    inside the fade-out window.
//!
//! ## Cancellation
//!
//! Frame and fade callbacks hold a weak reference to the controller and the
//! id of the session that scheduled them. A superseded session's frame is
//! cancelled, and any stale callback that still runs finds a different
//! session id and does nothing. After [`destroy`](SegmentPlayer::destroy) no
//! callback reaches the adapter again.
//!
//! ## Locking
//!
//! Every adapter call is made under a reentrant gate, taken before the
//! liveness check and released after the call. `destroy` takes the same gate,
//! so once it returns no callback on any thread can still be inside the
//! adapter. Being reentrant, the gate lets adapters and listeners call back
//! into the player on the thread that holds it.
//!
//! Session state sits behind a separate mutex, always taken after the gate and
//! never held while calling the adapter or emitting events.

use crate::adapter::validate_adapter;
use crate::context::PlayerContext;
use crate::error::{PlaybackError, Result};
use crate::fade::Fader;
use crate::segment::{is_valid_time, Segment, SegmentOptions};
use crate::session::{Boundary, PlaybackSession, PollDecision};
use crate::traits::{AudioAdapter, PlayFuture, VolumeControl};
use bridge_traits::FrameHandle;
use core_runtime::events::{ListenerId, PlayerEvent};
use futures::FutureExt;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Observable state of a [`SegmentPlayer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerState {
    Idle,
    PlayingWhole,
    PlayingSegment {
        segment: Segment,
        looping: bool,
        fading: bool,
    },
}

/// Playback controller for whole-track and segment playback.
///
/// # Example
///
/// ```rust,ignore
/// use core_playback::{PlayerContext, Segment, SegmentOptions, SegmentPlayer};
///
/// let player = SegmentPlayer::new(context, adapter)?;
/// let segment = Segment::new(12.0, 18.5)?;
/// if let Some(started) = player.play_segment(&segment, SegmentOptions::new().fade_in(0.3)) {
///     started.await?;
/// }
/// ```
pub struct SegmentPlayer {
    inner: Arc<PlayerInner>,
}

struct PlayerInner {
    context: PlayerContext,
    adapter: Arc<dyn AudioAdapter>,
    fader: Fader,
    /// Held from each liveness check through the adapter call it guards.
    gate: ReentrantMutex<()>,
    state: Mutex<ControllerState>,
    listener: Mutex<Option<ListenerId>>,
    destroyed: AtomicBool,
    next_session: AtomicU64,
}

/// The device as seen by one session's fade.
///
/// Writes are dropped once the player is destroyed or the session has been
/// superseded, even if the ramp already passed its own cancellation check.
struct SessionVolume {
    player: Weak<PlayerInner>,
    session: u64,
}

impl VolumeControl for SessionVolume {
    fn volume(&self) -> f32 {
        let Some(player) = self.player.upgrade() else {
            return 0.0;
        };
        let Some(_live) = player.live() else {
            return 0.0;
        };
        player.adapter.volume()
    }

    fn set_volume(&self, volume: f32) {
        let Some(player) = self.player.upgrade() else {
            return;
        };
        let Some(_live) = player.live() else {
            return;
        };
        if !player.is_current(self.session) {
            trace!(session = self.session, "Stale fade step dropped");
            return;
        }
        player.adapter.set_volume(volume);
    }
}

#[derive(Default)]
struct ControllerState {
    session: Option<PlaybackSession>,
    frame: Option<FrameHandle>,
}

impl SegmentPlayer {
    /// Validate `adapter`, initialise it with `context`, and start listening
    /// for its `Playing` events.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::ContractViolation`] if the adapter is incomplete
    /// - whatever [`AudioAdapter::init`] fails with
    pub fn new<A>(context: PlayerContext, adapter: Arc<A>) -> Result<Self>
    where
        A: AudioAdapter + 'static,
    {
        Self::with_adapter(context, adapter)
    }

    /// Same as [`new`](Self::new), for an already type-erased adapter.
    pub fn with_adapter(context: PlayerContext, adapter: Arc<dyn AudioAdapter>) -> Result<Self> {
        validate_adapter(adapter.as_ref())?;
        adapter.init(&context)?;

        let fader = Fader::new(Arc::clone(context.timers()), context.fade_tick());
        let inner = Arc::new(PlayerInner {
            context,
            adapter,
            fader,
            gate: ReentrantMutex::new(()),
            state: Mutex::new(ControllerState::default()),
            listener: Mutex::new(None),
            destroyed: AtomicBool::new(false),
            next_session: AtomicU64::new(0),
        });

        let weak = Arc::downgrade(&inner);
        let listener = inner.context.events().add_listener(move |event| {
            if let PlayerEvent::Playing { .. } = event {
                if let Some(inner) = weak.upgrade() {
                    inner.on_playing();
                }
            }
        });
        *inner.listener.lock() = Some(listener);

        debug!("Segment player created");
        Ok(Self { inner })
    }

    pub fn context(&self) -> &PlayerContext {
        &self.inner.context
    }

    /// Start playback. The future resolves once the device has started.
    pub fn play(&self) -> PlayFuture {
        let Some(_live) = self.inner.live() else {
            self.inner.report("play", &PlaybackError::Destroyed);
            return futures::future::ready(Err(PlaybackError::Destroyed)).boxed();
        };
        self.inner.adapter.play()
    }

    pub fn pause(&self) {
        let Some(_live) = self.inner.live() else {
            self.inner.report("pause", &PlaybackError::Destroyed);
            return;
        };
        self.inner.adapter.pause();
    }

    /// Move the playback position.
    ///
    /// A negative or non-finite `time` is logged and ignored.
    pub fn seek(&self, time: f64) {
        let Some(_live) = self.inner.live() else {
            self.inner.report("seek", &PlaybackError::Destroyed);
            return;
        };
        if !is_valid_time(time) {
            self.inner.report("seek", &PlaybackError::InvalidTime(time));
            return;
        }
        self.inner.adapter.seek(time);
    }

    pub fn is_playing(&self) -> bool {
        self.inner
            .live()
            .is_some_and(|_live| self.inner.adapter.is_playing())
    }

    pub fn is_seeking(&self) -> bool {
        self.inner
            .live()
            .is_some_and(|_live| self.inner.adapter.is_seeking())
    }

    pub fn current_time(&self) -> f64 {
        self.inner
            .live()
            .map_or(0.0, |_live| self.inner.adapter.current_time())
    }

    pub fn duration(&self) -> f64 {
        self.inner
            .live()
            .map_or(0.0, |_live| self.inner.adapter.duration())
    }

    /// Play `segment`, superseding any segment already playing.
    ///
    /// Returns `None`, after logging a diagnostic, if the segment or the fade
    /// lengths are invalid. Otherwise returns the adapter's play future.
    pub fn play_segment(&self, segment: &Segment, options: SegmentOptions) -> Option<PlayFuture> {
        self.inner.play_segment(segment, options)
    }

    /// The segment currently being played, if any.
    pub fn active_segment(&self) -> Option<Segment> {
        let state = self.inner.state.lock();
        state
            .session
            .as_ref()
            .filter(|session| !session.is_finished())
            .map(|session| *session.segment())
    }

    pub fn state(&self) -> PlayerState {
        let Some(_live) = self.inner.live() else {
            return PlayerState::Idle;
        };

        {
            let state = self.inner.state.lock();
            if let Some(session) = state.session.as_ref().filter(|s| !s.is_finished()) {
                return PlayerState::PlayingSegment {
                    segment: *session.segment(),
                    looping: session.options().looping,
                    fading: session.is_fading(),
                };
            }
        }

        if self.inner.adapter.is_playing() {
            PlayerState::PlayingWhole
        } else {
            PlayerState::Idle
        }
    }

    /// Stop all scheduled work and release the adapter. Idempotent.
    pub fn destroy(&self) {
        self.inner.destroy();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }
}

impl Drop for SegmentPlayer {
    fn drop(&mut self) {
        self.inner.destroy();
    }
}

impl fmt::Debug for SegmentPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentPlayer")
            .field("active_segment", &self.active_segment())
            .field("fader", &self.inner.fader)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl PlayerInner {
    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Lock the gate, unless the player is destroyed.
    fn live(&self) -> Option<ReentrantMutexGuard<'_, ()>> {
        let guard = self.gate.lock();
        if self.is_destroyed() {
            None
        } else {
            Some(guard)
        }
    }

    fn is_current(&self, id: u64) -> bool {
        self.state
            .lock()
            .session
            .as_ref()
            .is_some_and(|session| session.id() == id)
    }

    /// Log a rejected call and forward it to the host's diagnostic logger.
    fn report(&self, operation: &str, err: &PlaybackError) {
        if err.is_invalid_input() {
            warn!(operation, error = %err, "Invalid input ignored");
        } else {
            warn!(operation, error = %err, "Call ignored");
        }
        self.context.diagnose(&format!("{operation} rejected: {err}"));
    }

    fn play_segment(&self, segment: &Segment, options: SegmentOptions) -> Option<PlayFuture> {
        let Some(_live) = self.live() else {
            self.report("play_segment", &PlaybackError::Destroyed);
            return Some(futures::future::ready(Err(PlaybackError::Destroyed)).boxed());
        };

        // Bounds may come from deserialised input.
        let validated = Segment::new(segment.start(), segment.end())
            .and_then(|segment| options.validate().map(|()| segment));
        let segment = match validated {
            Ok(segment) => segment,
            Err(err) => {
                self.report("play_segment", &err);
                return None;
            }
        };

        self.fader.cancel();

        let id = self.next_session.fetch_add(1, Ordering::SeqCst) + 1;
        let session = PlaybackSession::new(id, segment, options);
        let initial_volume = session.initial_volume();
        {
            let mut state = self.state.lock();
            if let Some(frame) = state.frame.take() {
                self.context.frames().cancel_frame(frame);
            }
            if let Some(previous) = state.session.replace(session) {
                trace!(session = previous.id(), "Segment session superseded");
            }
        }

        debug!(
            session = id,
            start = segment.start(),
            end = segment.end(),
            looping = options.looping,
            "Segment session started"
        );

        self.adapter.seek(segment.start());
        self.adapter.set_volume(initial_volume);
        Some(self.adapter.play())
    }

    fn on_playing(self: &Arc<Self>) {
        let Some(_live) = self.live() else {
            return;
        };

        let activated = {
            let mut state = self.state.lock();
            state
                .session
                .as_mut()
                .and_then(|session| session.activate().map(|activation| (session.id(), activation)))
        };
        let Some((id, activation)) = activated else {
            return;
        };

        debug!(session = id, "Segment session polling");

        if let Some(length) = activation.fade_in {
            self.start_fade(id, 1.0, length);
        }
        self.schedule_frame(id);
    }

    fn schedule_frame(self: &Arc<Self>, id: u64) {
        let mut state = self.state.lock();
        if self.is_destroyed() || !state.session.as_ref().is_some_and(|s| s.id() == id) {
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let frame = self.context.frames().request_frame(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.poll_frame(id);
            }
        }));
        state.frame = Some(frame);
    }

    fn poll_frame(self: &Arc<Self>, id: u64) {
        let Some((time, decision)) = self.apply_boundary(id) else {
            return;
        };

        if decision.boundary == Boundary::End {
            self.context.emit(PlayerEvent::Ended { time });
        }

        // An `Ended` listener may have destroyed or superseded this session.
        let Some(_live) = self.live() else {
            return;
        };
        if !self.is_current(id) {
            return;
        }
        if let Some(length) = decision.fade_out {
            self.start_fade(id, 0.0, length);
        }
        if !decision.boundary.is_terminal() {
            self.schedule_frame(id);
        }
    }

    /// Take one position snapshot and apply the session's boundary action.
    fn apply_boundary(&self, id: u64) -> Option<(f64, PollDecision)> {
        let _live = self.live()?;

        {
            let mut state = self.state.lock();
            if !state.session.as_ref().is_some_and(|s| s.id() == id) {
                return None;
            }
            state.frame = None;
        }

        let time = self.adapter.current_time();
        let playing = self.adapter.is_playing();

        let decision = {
            let mut state = self.state.lock();
            match state.session.as_mut() {
                Some(session) if session.id() == id => session.poll(time, playing),
                _ => None,
            }
        }?;

        match decision.boundary {
            Boundary::Continue => {}
            Boundary::Rewind(start) => {
                trace!(session = id, time, "Segment loop");
                self.adapter.seek(start);
            }
            Boundary::Halt => {
                debug!(session = id, time, "Device stopped, segment session halted");
                self.adapter.pause();
            }
            Boundary::End => {
                debug!(session = id, time, "Segment ended");
                self.adapter.pause();
            }
        }
        Some((time, decision))
    }

    fn start_fade(self: &Arc<Self>, id: u64, target: f32, length: Duration) {
        let device = Arc::new(SessionVolume {
            player: Arc::downgrade(self),
            session: id,
        });
        let outcome = self.fader.fade(device, target, length, move || {
            trace!(session = id, target_volume = target, "Segment fade finished");
        });
        if let Err(err) = outcome {
            warn!(session = id, error = %err, "Segment fade not started");
        }
    }

    fn destroy(&self) {
        let _gate = self.gate.lock();
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.fader.cancel();
        {
            let mut state = self.state.lock();
            if let Some(frame) = state.frame.take() {
                self.context.frames().cancel_frame(frame);
            }
            state.session = None;
        }
        if let Some(listener) = self.listener.lock().take() {
            self.context.events().remove_listener(listener);
        }

        self.adapter.destroy();
        debug!("Segment player destroyed");
    }
}
