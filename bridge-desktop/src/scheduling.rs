//! Tokio-backed Timer and Frame Scheduling

use bridge_traits::{
    error::{BridgeError, Result},
    scheduling::{
        FrameCallback, FrameHandle, FrameScheduler, TimerCallback, TimerHandle, TimerService,
        MIN_TIMER_PERIOD,
    },
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// Default refresh rate of [`TokioFrameScheduler`], in frames per second.
pub const DEFAULT_REFRESH_RATE: u32 = 60;

fn current_runtime(component: &str) -> Result<Handle> {
    Handle::try_current().map_err(|_| {
        BridgeError::NotAvailable(format!(
            "Tokio runtime: {} must be created inside a runtime or given a handle",
            component
        ))
    })
}

/// Tokio-based interval timer for desktop.
///
/// Every interval runs on its own task. Dropping the service stops all of
/// its intervals.
pub struct TokioTimerService {
    runtime: Handle,
    next_id: AtomicU64,
    timers: Mutex<HashMap<u64, oneshot::Sender<()>>>,
}

impl TokioTimerService {
    /// Create a timer service on the current Tokio runtime.
    pub fn new() -> Result<Self> {
        Ok(Self::with_handle(current_runtime("TokioTimerService")?))
    }

    /// Create a timer service that spawns onto the given runtime.
    pub fn with_handle(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(0),
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Number of intervals currently running.
    pub fn active(&self) -> usize {
        self.timers.lock().len()
    }
}

impl TimerService for TokioTimerService {
    fn set_interval(&self, period: Duration, mut callback: TimerCallback) -> TimerHandle {
        let period = period.max(MIN_TIMER_PERIOD);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        self.timers.lock().insert(id, cancel_tx);

        self.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break,
                    _ = ticker.tick() => callback(),
                }
            }

            trace!(timer_id = id, "Interval stopped");
        });

        debug!(timer_id = id, period_ms = period.as_millis() as u64, "Interval started");
        TimerHandle(id)
    }

    fn clear_interval(&self, handle: TimerHandle) {
        if let Some(cancel) = self.timers.lock().remove(&handle.0) {
            cancel.send(()).ok();
        }
    }
}

/// Tokio-based frame loop for desktop.
///
/// A single task ticks at the configured refresh rate and runs every callback
/// queued before the tick that has not been cancelled by the time its turn
/// comes. Late frames are skipped rather than bunched, so a
/// stalled host polls less often instead of catching up in a burst.
pub struct TokioFrameScheduler {
    queue: Arc<Mutex<FrameQueue>>,
    frame_interval: Duration,
    _shutdown: oneshot::Sender<()>,
}

#[derive(Default)]
struct FrameQueue {
    next_id: u64,
    pending: VecDeque<(u64, FrameCallback)>,
}

/// Run the callbacks queued before this frame started.
///
/// Callbacks are dequeued one at a time, so `cancel_frame` issued by an
/// earlier callback of the same frame still takes effect. Callbacks requested
/// during the frame wait for the next one.
fn run_frame(queue: &Mutex<FrameQueue>) {
    let last = queue.lock().next_id;
    loop {
        let callback = {
            let mut queue = queue.lock();
            let due = queue.pending.front().is_some_and(|(id, _)| *id <= last);
            if due {
                queue.pending.pop_front().map(|(_, callback)| callback)
            } else {
                None
            }
        };
        match callback {
            Some(callback) => callback(),
            None => break,
        }
    }
}

impl TokioFrameScheduler {
    /// Create a 60 Hz frame loop on the current Tokio runtime.
    pub fn new() -> Result<Self> {
        Self::with_refresh_rate(DEFAULT_REFRESH_RATE)
    }

    /// Create a frame loop on the current Tokio runtime.
    pub fn with_refresh_rate(frames_per_second: u32) -> Result<Self> {
        let runtime = current_runtime("TokioFrameScheduler")?;
        Ok(Self::with_handle(runtime, frames_per_second))
    }

    /// Create a frame loop that runs on the given runtime.
    pub fn with_handle(runtime: Handle, frames_per_second: u32) -> Self {
        let frame_interval = Duration::from_secs_f64(1.0 / frames_per_second.max(1) as f64);
        let queue = Arc::new(Mutex::new(FrameQueue::default()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let loop_queue = Arc::clone(&queue);
        runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + frame_interval, frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => run_frame(&loop_queue),
                }
            }

            trace!("Frame loop stopped");
        });

        Self {
            queue,
            frame_interval,
            _shutdown: shutdown_tx,
        }
    }

    /// Time between two frames.
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Number of callbacks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.queue.lock().pending.len()
    }
}

impl FrameScheduler for TokioFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let mut queue = self.queue.lock();
        queue.next_id += 1;
        let id = queue.next_id;
        queue.pending.push_back((id, callback));
        FrameHandle(id)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.queue.lock().pending.retain(|(id, _)| *id != handle.0);
    }
}
