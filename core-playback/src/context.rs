//! Shared services handed to the controller and its adapter.

use core_runtime::config::{DiagnosticLogger, PlayerConfig};
use core_runtime::events::{EventBus, PlayerEvent};
use bridge_traits::{FrameScheduler, TimerService};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Owning context of a player.
///
/// Passed to [`AudioAdapter::init`](crate::AudioAdapter::init). Cheap to
/// clone; clones share the same services.
#[derive(Clone)]
pub struct PlayerContext {
    events: EventBus,
    timers: Arc<dyn TimerService>,
    frames: Arc<dyn FrameScheduler>,
    fade_tick: Duration,
    logger: Option<DiagnosticLogger>,
}

impl PlayerContext {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            events: config.event_bus,
            timers: config.timer_service,
            frames: config.frame_scheduler,
            fade_tick: config.fade_tick_interval,
            logger: config.logger,
        }
    }

    /// Publish a player event. Having no observers is not an error.
    pub fn emit(&self, event: PlayerEvent) {
        if self.events.emit(event).is_err() {
            trace!("Player event dropped: no observers");
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn timers(&self) -> &Arc<dyn TimerService> {
        &self.timers
    }

    pub fn frames(&self) -> &Arc<dyn FrameScheduler> {
        &self.frames
    }

    pub fn fade_tick(&self) -> Duration {
        self.fade_tick
    }

    /// Send a diagnostic to the host logger, if one is configured.
    pub fn diagnose(&self, message: &str) {
        if let Some(logger) = &self.logger {
            logger(message);
        }
    }
}

impl From<PlayerConfig> for PlayerContext {
    fn from(config: PlayerConfig) -> Self {
        Self::new(config)
    }
}

impl fmt::Debug for PlayerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerContext")
            .field("events", &self.events)
            .field("fade_tick", &self.fade_tick)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}
