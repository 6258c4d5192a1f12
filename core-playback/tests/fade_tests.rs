//! Fade scheduler properties over the manual timer.

use bridge_traits::ManualTimerService;
use core_playback::{FadeOutcome, Fader, VolumeControl};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(13);

struct Knob {
    volume: Mutex<f32>,
    writes: Mutex<Vec<f32>>,
}

impl Knob {
    fn at(volume: f32) -> Arc<Self> {
        Arc::new(Self {
            volume: Mutex::new(volume),
            writes: Mutex::new(Vec::new()),
        })
    }
}

impl VolumeControl for Knob {
    fn volume(&self) -> f32 {
        *self.volume.lock()
    }

    fn set_volume(&self, volume: f32) {
        *self.volume.lock() = volume;
        self.writes.lock().push(volume);
    }
}

fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&count);
    (count, move || {
        hits.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn immediate_completion_is_synchronous_and_unscheduled() {
    for (start, target, duration) in [
        (0.2_f32, 0.9_f32, Duration::ZERO),
        (0.6, 0.6, Duration::from_secs(2)),
    ] {
        let timers = Arc::new(ManualTimerService::new());
        let fader = Fader::new(timers.clone(), TICK);
        let knob = Knob::at(start);
        let (completions, done) = counter();

        let outcome = fader.fade(knob.clone(), target, duration, done).unwrap();

        assert_eq!(outcome, FadeOutcome::Immediate);
        assert_eq!(knob.volume(), target);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(timers.pending(), 0);
        assert_eq!(timers.intervals_started(), 0);

        timers.advance(Duration::from_secs(5));
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn default_tick_step_count() {
    let timers = Arc::new(ManualTimerService::new());
    let fader = Fader::new(timers.clone(), TICK);
    let knob = Knob::at(1.0);
    let (_, done) = counter();

    let outcome = fader
        .fade(knob.clone(), 0.0, Duration::from_millis(500), done)
        .unwrap();

    // floor(500 / 13)
    assert_eq!(outcome, FadeOutcome::Scheduled { steps: 38 });
    timers.advance(TICK * 38);
    assert_eq!(knob.writes.lock().len(), 38);
    assert_eq!(knob.volume(), 0.0);
}

proptest! {
    #[test]
    fn ramp_is_monotonic_and_exact(
        start in 0.0_f32..=1.0,
        target in 0.0_f32..=1.0,
        duration_ms in 13_u64..3_000,
    ) {
        prop_assume!(start != target);

        let timers = Arc::new(ManualTimerService::new());
        let fader = Fader::new(timers.clone(), TICK);
        let knob = Knob::at(start);
        let (completions, done) = counter();

        let outcome = fader
            .fade(knob.clone(), target, Duration::from_millis(duration_ms), done)
            .unwrap();
        let steps = duration_ms / 13;
        prop_assert_eq!(outcome, FadeOutcome::Scheduled { steps: steps as u32 });

        timers.advance(Duration::from_millis(duration_ms + 13));

        let writes = knob.writes.lock().clone();
        prop_assert_eq!(writes.len() as u64, steps);
        let rising = target > start;
        for pair in writes.windows(2) {
            if rising {
                prop_assert!(pair[0] <= pair[1], "{:?}", pair);
            } else {
                prop_assert!(pair[0] >= pair[1], "{:?}", pair);
            }
        }
        prop_assert_eq!(writes.last().copied(), Some(target));
        prop_assert_eq!(completions.load(Ordering::SeqCst), 1);
        prop_assert_eq!(timers.pending(), 0);
    }
}
