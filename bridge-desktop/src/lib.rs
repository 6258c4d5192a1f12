//! # Desktop Bridge Implementations
//!
//! Default implementations of the scheduling bridge traits for desktop
//! platforms (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides Tokio-backed implementations:
//! - `TimerService` using one Tokio interval task per registered timer
//! - `FrameScheduler` using a single frame-loop task at a fixed refresh rate
//!
//! Both must be created from within a Tokio runtime (or given a runtime
//! handle explicitly).
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{TokioFrameScheduler, TokioTimerService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let timers = Arc::new(TokioTimerService::new().unwrap());
//!     let frames = Arc::new(TokioFrameScheduler::new().unwrap());
//!
//!     // Hand both to the player configuration
//! }
//! ```

mod scheduling;

pub use scheduling::{TokioFrameScheduler, TokioTimerService, DEFAULT_REFRESH_RATE};
