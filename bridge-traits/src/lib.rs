//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host must provide to the playback core.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the
//! host-specific services it drives. Each trait represents a capability the
//! core requires but that is implemented differently per host (desktop event
//! loop, UI toolkit render loop, embedded runtime).
//!
//! ## Traits
//!
//! ### Scheduling
//! - [`TimerService`](scheduling::TimerService) - Fixed-interval wall-clock timers (volume fades)
//! - [`FrameScheduler`](scheduling::FrameScheduler) - Per-frame callbacks tied to the refresh cycle (boundary polling)
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Deterministic Drivers
//!
//! [`ManualTimerService`](scheduling::ManualTimerService) and
//! [`ManualFrameScheduler`](scheduling::ManualFrameScheduler) only fire when the
//! host tells them to. They back hosts that already own a render loop and
//! make every timing-dependent test reproducible.
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with a descriptive error when a required capability is
//! missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! let timers = config.timer_service.ok_or_else(|| Error::CapabilityMissing {
//!     capability: "TimerService".to_string(),
//!     message: "No timer service provided. \
//!              Desktop: enable the desktop-shims feature. \
//!              Otherwise: inject a host timer.".to_string(),
//! })?;
//! ```
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! behind `Arc` and driven from whichever thread the host runs its loop on.

pub mod error;
pub mod logging;
pub mod scheduling;

pub use error::BridgeError;

// Re-export commonly used types
pub use logging::{LogEntry, LogLevel, LoggerSink, MemorySink, StderrSink};
pub use scheduling::{
    FrameCallback, FrameHandle, FrameScheduler, ManualFrameScheduler, ManualTimerService,
    TimerCallback, TimerHandle, TimerService,
};
