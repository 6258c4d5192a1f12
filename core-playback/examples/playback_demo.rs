//! # Segment Playback Example
//!
//! Plays a looping two-second segment with edge fades against a simulated
//! device, driven by the Tokio timer and frame schedulers.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use bridge_desktop::{TokioFrameScheduler, TokioTimerService};
use core_playback::{
    AudioAdapter, PlayFuture, PlayerContext, Result, Segment, SegmentOptions, SegmentPlayer,
    VolumeControl,
};
use core_runtime::config::PlayerConfig;
use core_runtime::events::{EventBus, EventStream, PlayerEvent};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use futures::FutureExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================================
// Simulated Device
// ============================================================================

struct Transport {
    anchor: f64,
    started: Option<Instant>,
    volume: f32,
}

impl Transport {
    fn position(&self) -> f64 {
        match self.started {
            Some(at) => self.anchor + at.elapsed().as_secs_f64(),
            None => self.anchor,
        }
    }
}

/// A device whose clock runs in real time while playing.
struct SimulatedDevice {
    duration: f64,
    transport: Mutex<Transport>,
    context: Mutex<Option<PlayerContext>>,
}

impl SimulatedDevice {
    fn new(duration: f64) -> Self {
        Self {
            duration,
            transport: Mutex::new(Transport {
                anchor: 0.0,
                started: None,
                volume: 1.0,
            }),
            context: Mutex::new(None),
        }
    }

    fn emit(&self, event: PlayerEvent) {
        let context = self.context.lock().clone();
        if let Some(context) = context {
            context.emit(event);
        }
    }
}

impl VolumeControl for SimulatedDevice {
    fn volume(&self) -> f32 {
        self.transport.lock().volume
    }

    fn set_volume(&self, volume: f32) {
        self.transport.lock().volume = volume;
    }
}

impl AudioAdapter for SimulatedDevice {
    fn init(&self, context: &PlayerContext) -> Result<()> {
        *self.context.lock() = Some(context.clone());
        Ok(())
    }

    fn destroy(&self) {
        self.context.lock().take();
    }

    fn play(&self) -> PlayFuture {
        let time = {
            let mut transport = self.transport.lock();
            if transport.started.is_none() {
                transport.started = Some(Instant::now());
            }
            transport.position()
        };
        self.emit(PlayerEvent::Playing { time });
        futures::future::ready(Ok(())).boxed()
    }

    fn pause(&self) {
        let time = {
            let mut transport = self.transport.lock();
            transport.anchor = transport.position();
            transport.started = None;
            transport.anchor
        };
        self.emit(PlayerEvent::Pause { time });
    }

    fn is_playing(&self) -> bool {
        self.transport.lock().started.is_some()
    }

    fn is_seeking(&self) -> bool {
        false
    }

    fn current_time(&self) -> f64 {
        self.transport.lock().position().min(self.duration)
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn seek(&self, time: f64) {
        {
            let mut transport = self.transport.lock();
            transport.anchor = time.min(self.duration);
            if transport.started.is_some() {
                transport.started = Some(Instant::now());
            }
        }
        self.emit(PlayerEvent::Seeked { time });
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_filter("core_playback=debug"),
    )?;

    println!("=== Segment Playback Demo ===\n");

    let events = EventBus::new(256);
    let config = PlayerConfig::builder()
        .timer_service(Arc::new(TokioTimerService::new()?))
        .frame_scheduler(Arc::new(TokioFrameScheduler::new()?))
        .event_bus(events.clone())
        .logger(Arc::new(|message: &str| eprintln!("[player] {message}")))
        .build()?;

    let device = Arc::new(SimulatedDevice::new(30.0));
    let player = SegmentPlayer::new(PlayerContext::new(config), device.clone())?;

    let mut stream = EventStream::new(events.subscribe())
        .filter(|event| !matches!(event, PlayerEvent::TimeUpdate { .. }));
    let printer = tokio::spawn(async move {
        while let Ok(event) = stream.recv().await {
            match event.time() {
                Some(time) => println!("  {:<16} at {:.3}s", event.name(), time),
                None => println!("  {}", event.name()),
            }
        }
    });

    // Looping pass: three times through 4.0..6.0 with short edge fades.
    let chorus = Segment::new(4.0, 6.0)?;
    let options = SegmentOptions::new()
        .looping(true)
        .fade_in(0.25)
        .fade_out(0.25);
    println!("Looping {:.1}s..{:.1}s", chorus.start(), chorus.end());
    if let Some(started) = player.play_segment(&chorus, options) {
        started.await?;
    }
    tokio::time::sleep(Duration::from_millis(6_500)).await;
    println!("State: {:?}", player.state());

    // Single pass supersedes the loop and ends on its own.
    let outro = Segment::new(10.0, 11.5)?;
    println!("\nPlaying {:.1}s..{:.1}s once", outro.start(), outro.end());
    if let Some(started) = player.play_segment(&outro, SegmentOptions::new().fade_out(0.5)) {
        started.await?;
    }
    tokio::time::sleep(Duration::from_millis(2_000)).await;
    println!("State: {:?}, volume {:.2}", player.state(), device.volume());

    // Rejected input is reported through the diagnostic logger.
    player.seek(-3.0);

    player.destroy();
    printer.abort();

    println!("\n=== Demo Complete ===");
    Ok(())
}
