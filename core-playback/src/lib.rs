//! # Segment Playback Core
//!
//! Synchronises an abstract audio device with time-range annotations.
//!
//! ## Overview
//!
//! This crate handles:
//! - The adapter capability contract every audio device must satisfy
//! - Volume fades on an injected wall-clock timer
//! - Whole-track and segment playback, with looping and edge fades
//! - Frame-driven boundary polling and `Ended` notification
//!
//! Rendering, decoding and UI handling live outside this crate; devices are
//! reached only through [`AudioAdapter`].

pub mod adapter;
pub mod context;
pub mod error;
pub mod fade;
pub mod player;
pub mod segment;
pub mod session;
pub mod traits;

pub use adapter::{validate_adapter, CallbackAdapter, CallbackAdapterBuilder};
pub use context::PlayerContext;
pub use error::{PlaybackError, Result};
pub use fade::{ease, FadeOutcome, Fader};
pub use player::{PlayerState, SegmentPlayer};
pub use segment::{Segment, SegmentOptions};
pub use session::{Boundary, PlaybackSession, PollDecision, SessionPhase};
pub use traits::{AudioAdapter, Capability, PlayFuture, VolumeControl};
