//! Timer and Frame Scheduling Abstractions
//!
//! Two independent periodic mechanisms drive the playback core, and hosts
//! provide both:
//!
//! - [`TimerService`]: fixed-interval wall-clock timers. Progress driven by a
//!   timer advances at a consistent real-time rate regardless of render load.
//! - [`FrameScheduler`]: one-shot callbacks tied to the host's refresh cycle.
//!   A loop that must react within one visible frame re-requests a frame from
//!   inside its own callback.
//!
//! Both hand out handles so that the owner can cancel a pending callback.
//! Cancelling a handle that already fired or was never issued is a no-op.
//!
//! The manual drivers in this module never fire on their own. The host (or a
//! test) advances them explicitly, which makes timing fully deterministic.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Callback invoked on every timer tick.
pub type TimerCallback = Box<dyn FnMut() + Send + 'static>;

/// Callback invoked once, on the next frame.
pub type FrameCallback = Box<dyn FnOnce() + Send + 'static>;

/// Smallest period a timer is allowed to run at.
pub const MIN_TIMER_PERIOD: Duration = Duration::from_millis(1);

/// Identifier of an interval registered with a [`TimerService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// Identifier of a frame callback registered with a [`FrameScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Wall-clock interval timer service.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::scheduling::TimerService;
/// use std::time::Duration;
///
/// fn start_ticking(timers: &dyn TimerService) {
///     let handle = timers.set_interval(
///         Duration::from_millis(13),
///         Box::new(|| tracing::trace!("tick")),
///     );
///     // ... later
///     timers.clear_interval(handle);
/// }
/// ```
pub trait TimerService: Send + Sync {
    /// Invoke `callback` every `period` until the interval is cleared.
    ///
    /// The first invocation happens one full period after registration.
    fn set_interval(&self, period: Duration, callback: TimerCallback) -> TimerHandle;

    /// Stop an interval. No invocation starts after this returns.
    fn clear_interval(&self, handle: TimerHandle);
}

/// Rendering-frame callback scheduler.
pub trait FrameScheduler: Send + Sync {
    /// Run `callback` once on the next frame.
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;

    /// Drop a pending frame callback without running it.
    fn cancel_frame(&self, handle: FrameHandle);
}

// ============================================================================
// Manual Timer Service
// ============================================================================

/// Timer service driven by explicit calls to [`ManualTimerService::advance`].
///
/// Time starts at zero. Advancing fires every due interval in timestamp order
/// (ties broken by registration order), so a 13 ms timer advanced by 40 ms
/// fires three times.
#[derive(Default)]
pub struct ManualTimerService {
    state: Mutex<ManualTimers>,
}

#[derive(Default)]
struct ManualTimers {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<u64, ManualTimer>,
}

struct ManualTimer {
    period: Duration,
    next_due: Duration,
    // `None` while the callback is running
    callback: Option<TimerCallback>,
}

impl ManualTimers {
    fn take_due(&mut self, deadline: Duration) -> Option<(u64, TimerCallback)> {
        let (id, due) = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.callback.is_some() && timer.next_due <= deadline)
            .min_by_key(|(id, timer)| (timer.next_due, **id))
            .map(|(id, timer)| (*id, timer.next_due))?;

        self.now = due;
        let timer = self.timers.get_mut(&id)?;
        timer.next_due += timer.period;
        timer.callback.take().map(|callback| (id, callback))
    }
}

impl ManualTimerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of intervals still registered.
    pub fn pending(&self) -> usize {
        self.state.lock().timers.len()
    }

    /// Number of intervals ever registered, cleared ones included.
    pub fn intervals_started(&self) -> u64 {
        self.state.lock().next_id
    }

    /// Advance virtual time, firing every interval that falls due.
    ///
    /// Returns the number of callbacks invoked. Callbacks run without the
    /// internal lock held and may register or clear intervals, including
    /// their own.
    pub fn advance(&self, by: Duration) -> usize {
        let deadline = self.state.lock().now + by;
        let mut fired = 0;

        loop {
            let next = {
                let mut state = self.state.lock();
                match state.take_due(deadline) {
                    Some(next) => next,
                    None => {
                        state.now = deadline;
                        break;
                    }
                }
            };

            let (id, mut callback) = next;
            callback();
            fired += 1;

            let mut state = self.state.lock();
            if let Some(timer) = state.timers.get_mut(&id) {
                timer.callback = Some(callback);
            }
        }

        fired
    }
}

impl TimerService for ManualTimerService {
    fn set_interval(&self, period: Duration, callback: TimerCallback) -> TimerHandle {
        let period = period.max(MIN_TIMER_PERIOD);
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        let next_due = state.now + period;
        state.timers.insert(
            id,
            ManualTimer {
                period,
                next_due,
                callback: Some(callback),
            },
        );
        TimerHandle(id)
    }

    fn clear_interval(&self, handle: TimerHandle) {
        self.state.lock().timers.remove(&handle.0);
    }
}

impl fmt::Debug for ManualTimerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualTimerService")
            .field("now", &state.now)
            .field("pending", &state.timers.len())
            .finish()
    }
}

// ============================================================================
// Manual Frame Scheduler
// ============================================================================

/// Frame scheduler driven by explicit calls to [`ManualFrameScheduler::run_frame`].
///
/// Hosts with their own render loop call `run_frame` once per presented frame.
#[derive(Default)]
pub struct ManualFrameScheduler {
    state: Mutex<ManualFrames>,
}

#[derive(Default)]
struct ManualFrames {
    next_id: u64,
    frames_run: u64,
    queue: Vec<(u64, FrameCallback)>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Number of frames run so far.
    pub fn frames_run(&self) -> u64 {
        self.state.lock().frames_run
    }

    /// Run one frame.
    ///
    /// Only callbacks queued before this call run; callbacks requested while
    /// the frame is running wait for the next one. A callback cancelled by an
    /// earlier callback of the same frame does not run.
    pub fn run_frame(&self) -> usize {
        let batch: Vec<u64> = {
            let mut state = self.state.lock();
            state.frames_run += 1;
            state.queue.iter().map(|(id, _)| *id).collect()
        };

        let mut ran = 0;
        for id in batch {
            let callback = {
                let mut state = self.state.lock();
                state
                    .queue
                    .iter()
                    .position(|(queued, _)| *queued == id)
                    .map(|index| state.queue.remove(index).1)
            };

            if let Some(callback) = callback {
                callback();
                ran += 1;
            }
        }
        ran
    }

    /// Run frames until the queue drains or `max_frames` have run.
    ///
    /// Returns the number of frames run.
    pub fn run_frames(&self, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && self.pending() > 0 {
            self.run_frame();
            frames += 1;
        }
        frames
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.queue.push((id, callback));
        FrameHandle(id)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.state.lock().queue.retain(|(id, _)| *id != handle.0);
    }
}

impl fmt::Debug for ManualFrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualFrameScheduler")
            .field("frames_run", &state.frames_run)
            .field("pending", &state.queue.len())
            .finish()
    }
}
