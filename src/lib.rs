//! Workspace facade crate.
//!
//! Re-exports the segment playback controller together with the runtime and
//! bridge crates it is wired from, so a host application can depend on
//! `playsync` alone. The `desktop-shims` feature (default) adds the
//! Tokio-backed timer and frame schedulers.

pub use bridge_traits as bridge;
pub use core_playback as playback;
pub use core_runtime as runtime;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop as desktop;

pub use core_playback::{
    AudioAdapter, Fader, PlaybackError, PlayerContext, PlayerState, Segment, SegmentOptions,
    SegmentPlayer,
};
pub use core_runtime::config::PlayerConfig;
pub use core_runtime::events::{EventBus, PlayerEvent};
