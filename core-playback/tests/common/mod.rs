//! Shared fixtures: a recording adapter and a player wired to manual
//! schedulers.

#![allow(dead_code)]

use bridge_traits::{ManualFrameScheduler, ManualTimerService};
use core_playback::{
    AudioAdapter, PlayFuture, PlayerContext, Result, SegmentPlayer, VolumeControl,
};
use core_runtime::config::PlayerConfig;
use core_runtime::events::{EventBus, PlayerEvent};
use futures::FutureExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub const TICK: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Init,
    Destroy,
    Play,
    Pause,
    Seek(f64),
    SetVolume(f32),
}

#[derive(Default)]
struct DeviceState {
    time: f64,
    duration: f64,
    playing: bool,
    seeking: bool,
    volume: f32,
}

/// Adapter double that records every transport call.
///
/// With `emit_on_play` set, `play` reports `Playing` through the context the
/// way a real device would once output starts.
pub struct RecordingAdapter {
    device: Mutex<DeviceState>,
    calls: Mutex<Vec<Call>>,
    context: Mutex<Option<PlayerContext>>,
    emit_on_play: bool,
}

impl RecordingAdapter {
    pub fn new() -> Arc<Self> {
        Self::build(true)
    }

    pub fn silent() -> Arc<Self> {
        Self::build(false)
    }

    fn build(emit_on_play: bool) -> Arc<Self> {
        Arc::new(Self {
            device: Mutex::new(DeviceState {
                duration: 60.0,
                volume: 1.0,
                ..DeviceState::default()
            }),
            calls: Mutex::new(Vec::new()),
            context: Mutex::new(None),
            emit_on_play,
        })
    }

    pub fn set_time(&self, time: f64) {
        self.device.lock().time = time;
    }

    pub fn set_playing(&self, playing: bool) {
        self.device.lock().playing = playing;
    }

    pub fn set_seeking(&self, seeking: bool) {
        self.device.lock().seeking = seeking;
    }

    /// Emit an event as the device would.
    pub fn emit(&self, event: PlayerEvent) {
        let context = self.context.lock().clone();
        if let Some(context) = context {
            context.emit(event);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Seek(time) => Some(*time),
                _ => None,
            })
            .collect()
    }

    pub fn volumes(&self) -> Vec<f32> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::SetVolume(volume) => Some(*volume),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls.lock().iter().filter(|call| *call == wanted).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl VolumeControl for RecordingAdapter {
    fn volume(&self) -> f32 {
        self.device.lock().volume
    }

    fn set_volume(&self, volume: f32) {
        self.device.lock().volume = volume;
        self.record(Call::SetVolume(volume));
    }
}

impl AudioAdapter for RecordingAdapter {
    fn init(&self, context: &PlayerContext) -> Result<()> {
        *self.context.lock() = Some(context.clone());
        self.record(Call::Init);
        Ok(())
    }

    fn destroy(&self) {
        self.context.lock().take();
        self.record(Call::Destroy);
    }

    fn play(&self) -> PlayFuture {
        let time = {
            let mut device = self.device.lock();
            device.playing = true;
            device.time
        };
        self.record(Call::Play);
        if self.emit_on_play {
            self.emit(PlayerEvent::Playing { time });
        }
        futures::future::ready(Ok(())).boxed()
    }

    fn pause(&self) {
        self.device.lock().playing = false;
        self.record(Call::Pause);
    }

    fn is_playing(&self) -> bool {
        self.device.lock().playing
    }

    fn is_seeking(&self) -> bool {
        self.device.lock().seeking
    }

    fn current_time(&self) -> f64 {
        self.device.lock().time
    }

    fn duration(&self) -> f64 {
        self.device.lock().duration
    }

    fn seek(&self, time: f64) {
        self.device.lock().time = time;
        self.record(Call::Seek(time));
    }
}

/// A player over a [`RecordingAdapter`], driven by manual schedulers.
pub struct Harness {
    pub timers: Arc<ManualTimerService>,
    pub frames: Arc<ManualFrameScheduler>,
    pub events: EventBus,
    pub adapter: Arc<RecordingAdapter>,
    pub player: SegmentPlayer,
    pub diagnostics: Arc<Mutex<Vec<String>>>,
    pub ended: Arc<Mutex<Vec<f64>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_adapter(RecordingAdapter::new())
    }

    pub fn with_adapter(adapter: Arc<RecordingAdapter>) -> Self {
        let timers = Arc::new(ManualTimerService::new());
        let frames = Arc::new(ManualFrameScheduler::new());
        let events = EventBus::new(64);
        let diagnostics = Arc::new(Mutex::new(Vec::new()));
        let ended = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&diagnostics);
        let config = PlayerConfig::builder()
            .timer_service(timers.clone())
            .frame_scheduler(frames.clone())
            .event_bus(events.clone())
            .fade_tick_interval(TICK)
            .logger(Arc::new(move |message: &str| {
                sink.lock().push(message.to_string())
            }))
            .build()
            .expect("manual services are provided");

        let ended_sink = Arc::clone(&ended);
        events.add_listener(move |event| {
            if let PlayerEvent::Ended { time } = event {
                ended_sink.lock().push(*time);
            }
        });

        let player = SegmentPlayer::new(PlayerContext::new(config), adapter.clone())
            .expect("recording adapter is complete");

        Self {
            timers,
            frames,
            events,
            adapter,
            player,
            diagnostics,
            ended,
        }
    }

    /// Report `time` from the device and run one frame.
    pub fn frame_at(&self, time: f64) -> usize {
        self.adapter.set_time(time);
        self.frames.run_frame()
    }

    pub fn ended_count(&self) -> usize {
        self.ended.lock().len()
    }
}
