//! Tests for the Tokio-backed schedulers
//!
//! These run against real time with generous margins; they check that
//! callbacks fire and that cancellation sticks, not exact tick counts.

use bridge_desktop::{TokioFrameScheduler, TokioTimerService, DEFAULT_REFRESH_RATE};
use bridge_traits::{BridgeError, FrameHandle, FrameScheduler, TimerService};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_interval_fires_repeatedly() {
    let timers = TokioTimerService::new().unwrap();
    let count = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&count);
    let handle = timers.set_interval(
        Duration::from_millis(5),
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    assert_eq!(timers.active(), 1);

    tokio::time::sleep(Duration::from_millis(80)).await;
    timers.clear_interval(handle);
    assert_eq!(timers.active(), 0);

    assert!(count.load(Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn test_cleared_interval_stays_silent() {
    let timers = TokioTimerService::new().unwrap();
    let count = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&count);
    let handle = timers.set_interval(
        Duration::from_millis(5),
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    tokio::time::sleep(Duration::from_millis(30)).await;
    timers.clear_interval(handle);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let after_clear = count.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(count.load(Ordering::SeqCst), after_clear);
}

#[tokio::test]
async fn test_frame_callback_runs_once() {
    let frames = TokioFrameScheduler::with_refresh_rate(120).unwrap();
    let count = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&count);
    frames.request_frame(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(frames.pending(), 0);
}

#[tokio::test]
async fn test_cancelled_frame_never_runs() {
    let frames = TokioFrameScheduler::new().unwrap();
    let count = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&count);
    let handle = frames.request_frame(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    frames.cancel_frame(handle);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_frame_cancelled_by_earlier_callback_in_same_frame() {
    let frames = Arc::new(TokioFrameScheduler::with_refresh_rate(30).unwrap());
    let count = Arc::new(AtomicUsize::new(0));
    let victim: Arc<Mutex<Option<FrameHandle>>> = Arc::new(Mutex::new(None));

    let canceller_frames = Arc::clone(&frames);
    let canceller_victim = Arc::clone(&victim);
    frames.request_frame(Box::new(move || {
        if let Some(handle) = canceller_victim.lock().take() {
            canceller_frames.cancel_frame(handle);
        }
    }));
    let counter = Arc::clone(&count);
    let handle = frames.request_frame(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    *victim.lock() = Some(handle);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(frames.pending(), 0);
}

#[tokio::test]
async fn test_frame_requested_during_frame_runs_next_frame() {
    let frames = Arc::new(TokioFrameScheduler::with_refresh_rate(30).unwrap());
    let count = Arc::new(AtomicUsize::new(0));

    let inner_frames = Arc::clone(&frames);
    let counter = Arc::clone(&count);
    frames.request_frame(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        let counter = Arc::clone(&counter);
        inner_frames.request_frame(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_default_frame_interval() {
    let frames = TokioFrameScheduler::new().unwrap();
    let expected = Duration::from_secs_f64(1.0 / DEFAULT_REFRESH_RATE as f64);
    assert_eq!(frames.frame_interval(), expected);
}

#[test]
fn test_requires_runtime() {
    assert!(matches!(
        TokioTimerService::new(),
        Err(BridgeError::NotAvailable(_))
    ));
    assert!(matches!(
        TokioFrameScheduler::new(),
        Err(BridgeError::NotAvailable(_))
    ));
}
