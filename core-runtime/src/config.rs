//! # Player Configuration Module
//!
//! Provides configuration management for the playback synchronization layer.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `PlayerConfig` instance that holds the host services the player drives and
//! the settings it runs with. It enforces fail-fast validation so a player is
//! never created without the scheduling capabilities it needs.
//!
//! ## Required Dependencies
//!
//! - `TimerService` - Fixed-interval wall-clock timer (volume fades)
//! - `FrameScheduler` - Per-frame callbacks (segment boundary polling)
//!
//! When the `desktop-shims` feature is enabled, Tokio-backed defaults for both
//! are injected automatically if not provided. They must then be built inside
//! a Tokio runtime.
//!
//! ## Optional Settings
//!
//! - `EventBus` - Reuse an existing bus (default: a new bus)
//! - `fade_tick_interval` - Fade step period (default: 13 ms)
//! - `logger` - Diagnostic sink for rejected input
//!
//! ## Usage
//!
//! ```
//! use bridge_traits::{ManualFrameScheduler, ManualTimerService};
//! use core_runtime::config::PlayerConfig;
//! use std::sync::Arc;
//!
//! let config = PlayerConfig::builder()
//!     .timer_service(Arc::new(ManualTimerService::new()))
//!     .frame_scheduler(Arc::new(ManualFrameScheduler::new()))
//!     .logger(Arc::new(|message: &str| eprintln!("{message}")))
//!     .build()
//!     .expect("scheduling services provided");
//! ```

use crate::error::{Error, Result};
use crate::events::{EventBus, DEFAULT_EVENT_BUFFER_SIZE};
use bridge_traits::{FrameScheduler, TimerService};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default fade step period.
pub const DEFAULT_FADE_TICK: Duration = Duration::from_millis(13);

/// Longest accepted fade step period.
pub const MAX_FADE_TICK: Duration = Duration::from_secs(1);

/// Receives human-readable diagnostics about rejected input.
pub type DiagnosticLogger = Arc<dyn Fn(&str) + Send + Sync>;

/// Configuration for a player instance.
///
/// Use [`PlayerConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct PlayerConfig {
    /// Timer driving volume fades
    pub timer_service: Arc<dyn TimerService>,

    /// Frame scheduler driving boundary polling
    pub frame_scheduler: Arc<dyn FrameScheduler>,

    /// Event channel shared with the adapter and observers
    pub event_bus: EventBus,

    /// Period between two fade steps
    pub fade_tick_interval: Duration,

    /// Optional diagnostic sink
    pub logger: Option<DiagnosticLogger>,
}

impl fmt::Debug for PlayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerConfig")
            .field("timer_service", &"TimerService { ... }")
            .field("frame_scheduler", &"FrameScheduler { ... }")
            .field("event_bus", &self.event_bus)
            .field("fade_tick_interval", &self.fade_tick_interval)
            .field("logger", &self.logger.as_ref().map(|_| "Fn(&str) { ... }"))
            .finish()
    }
}

impl PlayerConfig {
    /// Creates a new builder for constructing a `PlayerConfig`.
    pub fn builder() -> PlayerConfigBuilder {
        PlayerConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.fade_tick_interval.is_zero() {
            return Err(Error::Config(
                "Fade tick interval must be greater than 0ms".to_string(),
            ));
        }

        if self.fade_tick_interval > MAX_FADE_TICK {
            return Err(Error::Config(format!(
                "Fade tick interval exceeds maximum of {}ms",
                MAX_FADE_TICK.as_millis()
            )));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_timer_service() -> Result<Arc<dyn TimerService>> {
    Err(Error::CapabilityMissing {
        capability: "TimerService".to_string(),
        message: "TimerService implementation is required for volume fades. \
                 Desktop: enable the 'desktop-shims' feature to use the default TokioTimerService. \
                 Otherwise: inject a host timer or a ManualTimerService."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_timer_service() -> Result<Arc<dyn TimerService>> {
    let timers = bridge_desktop::TokioTimerService::new().map_err(|e| Error::CapabilityMissing {
        capability: "TimerService".to_string(),
        message: format!("Default TokioTimerService unavailable: {}", e),
    })?;
    Ok(Arc::new(timers))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_frame_scheduler() -> Result<Arc<dyn FrameScheduler>> {
    Err(Error::CapabilityMissing {
        capability: "FrameScheduler".to_string(),
        message: "FrameScheduler implementation is required for segment boundary polling. \
                 Desktop: enable the 'desktop-shims' feature to use the default TokioFrameScheduler. \
                 Otherwise: hook the host render loop or use a ManualFrameScheduler."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_frame_scheduler() -> Result<Arc<dyn FrameScheduler>> {
    let frames =
        bridge_desktop::TokioFrameScheduler::new().map_err(|e| Error::CapabilityMissing {
            capability: "FrameScheduler".to_string(),
            message: format!("Default TokioFrameScheduler unavailable: {}", e),
        })?;
    Ok(Arc::new(frames))
}

/// Builder for constructing [`PlayerConfig`] instances.
#[derive(Default)]
pub struct PlayerConfigBuilder {
    timer_service: Option<Arc<dyn TimerService>>,
    frame_scheduler: Option<Arc<dyn FrameScheduler>>,
    event_bus: Option<EventBus>,
    event_buffer_size: Option<usize>,
    fade_tick_interval: Option<Duration>,
    logger: Option<DiagnosticLogger>,
}

impl PlayerConfigBuilder {
    /// Sets the timer service used for volume fades.
    pub fn timer_service(mut self, timers: Arc<dyn TimerService>) -> Self {
        self.timer_service = Some(timers);
        self
    }

    /// Sets the frame scheduler used for boundary polling.
    pub fn frame_scheduler(mut self, frames: Arc<dyn FrameScheduler>) -> Self {
        self.frame_scheduler = Some(frames);
        self
    }

    /// Reuses an existing event bus.
    ///
    /// Takes precedence over [`event_buffer_size`](Self::event_buffer_size).
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Sets the buffer size of a newly created event bus.
    ///
    /// Default: 100 events
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the fade step period.
    ///
    /// Default: 13 ms
    pub fn fade_tick_interval(mut self, interval: Duration) -> Self {
        self.fade_tick_interval = Some(interval);
        self
    }

    /// Sets the diagnostic sink for rejected input.
    pub fn logger(mut self, logger: DiagnosticLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Builds the final `PlayerConfig` instance.
    ///
    /// # Errors
    ///
    /// - `Error::CapabilityMissing` when a scheduling service is missing and
    ///   no default can be provided
    /// - `Error::Config` for a zero event buffer or an out-of-range fade tick
    pub fn build(self) -> Result<PlayerConfig> {
        let event_bus = match (self.event_bus, self.event_buffer_size) {
            (Some(bus), _) => bus,
            (None, Some(0)) => {
                return Err(Error::Config(
                    "Event buffer size must be greater than 0".to_string(),
                ))
            }
            (None, size) => EventBus::new(size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE)),
        };

        let timer_service = match self.timer_service {
            Some(timers) => timers,
            None => provide_default_timer_service()?,
        };

        let frame_scheduler = match self.frame_scheduler {
            Some(frames) => frames,
            None => provide_default_frame_scheduler()?,
        };

        let config = PlayerConfig {
            timer_service,
            frame_scheduler,
            event_bus,
            fade_tick_interval: self.fade_tick_interval.unwrap_or(DEFAULT_FADE_TICK),
            logger: self.logger,
        };

        config.validate()?;

        Ok(config)
    }
}
