//! # Fade Scheduler
//!
//! Ramps a device's output volume toward a target along an ease-in-ease-out
//! curve, one step per timer tick.
//!
//! ## Algorithm
//!
//! For a fade from `original` to `target` over `duration`:
//!
//! - `steps = floor(duration / tick)`
//! - on tick `n` (1-based): `volume = original + ease(n / steps) * (target - original)`
//! - `ease(f) = 0.5 - cos(f * π) / 2`
//! - the last tick writes `target` exactly, clears the interval and fires the
//!   completion callback
//!
//! A zero delta, a zero duration, or a duration shorter than one tick applies
//! the target immediately and completes synchronously without arming a timer.
//!
//! Progress is counted in ticks of a wall-clock timer, never in rendering
//! frames, so a fade takes the same real time under any frame rate.

use crate::error::{PlaybackError, Result};
use crate::traits::VolumeControl;
use bridge_traits::{TimerHandle, TimerService};
use parking_lot::Mutex;
use std::f64::consts::PI;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// How a [`Fader::fade`] call was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeOutcome {
    /// Target applied and completion fired before `fade` returned.
    Immediate,
    /// A periodic ramp was armed.
    Scheduled { steps: u32 },
}

/// Ease-in-ease-out curve over `[0, 1]`.
pub fn ease(fraction: f64) -> f64 {
    0.5 - (fraction * PI).cos() / 2.0
}

/// Number of ticks a fade over `duration` takes.
pub fn fade_steps(duration: Duration, tick: Duration) -> u32 {
    if tick.is_zero() {
        return 0;
    }
    (duration.as_nanos() / tick.as_nanos()).min(u32::MAX as u128) as u32
}

/// Cancellation state shared between a running ramp and its owner.
struct ActiveFade {
    live: Arc<AtomicBool>,
    handle: Arc<Mutex<Option<TimerHandle>>>,
}

impl ActiveFade {
    fn cancel(&self, timers: &dyn TimerService) {
        self.live.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().take() {
            timers.clear_interval(handle);
        }
    }
}

/// Drives at most one volume ramp at a time.
///
/// Starting a fade cancels the one in progress. A cancelled fade stops
/// ticking and never fires its completion callback.
pub struct Fader {
    timers: Arc<dyn TimerService>,
    tick: Duration,
    current: Mutex<Option<ActiveFade>>,
}

impl Fader {
    pub fn new(timers: Arc<dyn TimerService>, tick: Duration) -> Self {
        Self {
            timers,
            tick,
            current: Mutex::new(None),
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Ramp `device` to `target` over `duration`, then call `on_complete`.
    ///
    /// Targets outside `[0, 1]` are clamped.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::InvalidVolume`] for a non-finite target. The
    /// device is left untouched and any fade in progress keeps running.
    pub fn fade<V, F>(
        &self,
        device: Arc<V>,
        target: f32,
        duration: Duration,
        on_complete: F,
    ) -> Result<FadeOutcome>
    where
        V: VolumeControl + ?Sized + 'static,
        F: FnOnce() + Send + 'static,
    {
        if !target.is_finite() {
            warn!(target_volume = target, "Rejected fade: volume is not finite");
            return Err(PlaybackError::InvalidVolume(target));
        }

        let clamped = target.clamp(0.0, 1.0);
        if clamped != target {
            warn!(target_volume = target, "Fade target clamped to [0, 1]");
        }
        let target = clamped;

        self.cancel();

        let original = device.volume();
        let delta = target - original;
        let steps = fade_steps(duration, self.tick);

        if delta == 0.0 || steps == 0 {
            device.set_volume(target);
            trace!(target_volume = target, "Fade applied immediately");
            on_complete();
            return Ok(FadeOutcome::Immediate);
        }

        let live = Arc::new(AtomicBool::new(true));
        let handle_slot = Arc::new(Mutex::new(None::<TimerHandle>));

        let ramp_live = Arc::clone(&live);
        let ramp_slot = Arc::clone(&handle_slot);
        let ramp_timers = Arc::clone(&self.timers);
        let mut on_complete = Some(on_complete);
        let mut tick = 0u32;

        let callback = Box::new(move || {
            if !ramp_live.load(Ordering::SeqCst) {
                return;
            }

            tick += 1;
            if tick < steps {
                let eased = ease(f64::from(tick) / f64::from(steps));
                let volume = f64::from(original) + eased * f64::from(delta);
                device.set_volume(volume as f32);
                return;
            }

            device.set_volume(target);
            ramp_live.store(false, Ordering::SeqCst);
            if let Some(handle) = ramp_slot.lock().take() {
                ramp_timers.clear_interval(handle);
            }
            debug!(target_volume = target, steps, "Fade complete");
            if let Some(done) = on_complete.take() {
                done();
            }
        });

        let handle = self.timers.set_interval(self.tick, callback);

        // A ramp may finish before its handle is stored.
        if live.load(Ordering::SeqCst) {
            *handle_slot.lock() = Some(handle);
        } else {
            self.timers.clear_interval(handle);
        }

        debug!(
            from = original,
            to = target,
            steps,
            duration_ms = duration.as_millis() as u64,
            "Fade started"
        );

        *self.current.lock() = Some(ActiveFade {
            live,
            handle: handle_slot,
        });

        Ok(FadeOutcome::Scheduled { steps })
    }

    /// Stop the fade in progress, if any, without completing it.
    pub fn cancel(&self) {
        let active = self.current.lock().take();
        if let Some(active) = active {
            if active.live.load(Ordering::SeqCst) {
                trace!("Fade cancelled");
            }
            active.cancel(self.timers.as_ref());
        }
    }

    /// Returns `true` while a ramp is ticking.
    pub fn is_active(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .map_or(false, |active| active.live.load(Ordering::SeqCst))
    }
}

impl Drop for Fader {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Fader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fader")
            .field("tick", &self.tick)
            .field("active", &self.is_active())
            .finish()
    }
}
