//! # Segment Session State Machine
//!
//! One [`PlaybackSession`] describes a single `play_segment` run. It holds no
//! handles to the device or the schedulers: the controller feeds it the
//! `Playing` signal and each frame's time snapshot, and applies the decisions
//! it returns.
//!
//! ```text
//!                  activate()                 poll(): not playing / end
//! AwaitingPlaying ───────────> Polling ────────────────────────────────> Finished
//!                               │   ▲
//!                               └───┘ poll(): continue / rewind (looping)
//! ```
//!
//! `activate` only does something on the first `Playing` signal, so repeated
//! signals never restart the fade-in or schedule a second polling loop. The
//! fade-out trigger fires at most once per session, across loop passes too.

use crate::segment::{Segment, SegmentOptions};
use std::time::Duration;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the device to report that playback started.
    AwaitingPlaying,
    /// Boundary polling is running.
    Polling,
    /// Terminal: the segment ended or playback stopped.
    Finished,
}

/// What to do when a session is activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    /// Ramp the volume up to 1 over this length.
    pub fade_in: Option<Duration>,
}

/// Boundary outcome of one poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boundary {
    /// Inside the segment; poll again next frame.
    Continue,
    /// Looping segment reached its end; seek here and poll again.
    Rewind(f64),
    /// The device stopped playing; pause and stop polling.
    Halt,
    /// Non-looping segment reached its end; pause, emit `Ended`, stop polling.
    End,
}

impl Boundary {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Boundary::Halt | Boundary::End)
    }
}

/// Decision for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollDecision {
    pub boundary: Boundary,
    /// Start ramping the volume down to 0 over this length.
    pub fade_out: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct PlaybackSession {
    id: u64,
    segment: Segment,
    options: SegmentOptions,
    phase: SessionPhase,
    fading: bool,
}

impl PlaybackSession {
    pub fn new(id: u64, segment: Segment, options: SegmentOptions) -> Self {
        Self {
            id,
            segment,
            options,
            phase: SessionPhase::AwaitingPlaying,
            fading: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn options(&self) -> &SegmentOptions {
        &self.options
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the fade-out has been triggered.
    pub fn is_fading(&self) -> bool {
        self.fading
    }

    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    /// Volume to apply before playback starts.
    pub fn initial_volume(&self) -> f32 {
        if self.options.fade_in_duration().is_some() {
            0.0
        } else {
            1.0
        }
    }

    /// Handle the device's `Playing` signal.
    ///
    /// Returns `Some` exactly once, on the transition into polling.
    pub fn activate(&mut self) -> Option<Activation> {
        if self.phase != SessionPhase::AwaitingPlaying {
            return None;
        }
        self.phase = SessionPhase::Polling;
        Some(Activation {
            fade_in: self.options.fade_in_duration(),
        })
    }

    /// Evaluate one frame against a snapshot of the device state.
    ///
    /// Returns `None` when the session is not polling; the caller should stop
    /// scheduling frames for it.
    pub fn poll(&mut self, time: f64, playing: bool) -> Option<PollDecision> {
        if self.phase != SessionPhase::Polling {
            return None;
        }

        if !playing {
            self.phase = SessionPhase::Finished;
            return Some(PollDecision {
                boundary: Boundary::Halt,
                fade_out: None,
            });
        }

        let boundary = if time >= self.segment.end() {
            if self.options.looping {
                Boundary::Rewind(self.segment.start())
            } else {
                self.phase = SessionPhase::Finished;
                Boundary::End
            }
        } else {
            Boundary::Continue
        };

        let fade_out = match self.options.fade_out_duration() {
            Some(length) if !self.fading && time >= self.segment.end() - length.as_secs_f64() => {
                self.fading = true;
                Some(length)
            }
            _ => None,
        };

        Some(PollDecision { boundary, fade_out })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(options: SegmentOptions) -> PlaybackSession {
        PlaybackSession::new(1, Segment::new(1.0, 2.0).unwrap(), options)
    }

    #[test]
    fn activation_happens_once() {
        let mut session = session(SegmentOptions::new().fade_in(0.2));

        assert_eq!(session.initial_volume(), 0.0);
        assert_eq!(
            session.activate(),
            Some(Activation {
                fade_in: Some(Duration::from_millis(200))
            })
        );
        assert_eq!(session.activate(), None);
        assert_eq!(session.phase(), SessionPhase::Polling);
    }

    #[test]
    fn poll_before_activation_does_nothing() {
        let mut session = session(SegmentOptions::new());
        assert_eq!(session.poll(5.0, true), None);
        assert_eq!(session.phase(), SessionPhase::AwaitingPlaying);
    }

    #[test]
    fn inside_segment_continues() {
        let mut session = session(SegmentOptions::new());
        session.activate();

        let decision = session.poll(1.5, true).unwrap();
        assert_eq!(decision.boundary, Boundary::Continue);
        assert_eq!(decision.fade_out, None);
    }

    #[test]
    fn looping_rewinds_and_stays_active() {
        let mut session = session(SegmentOptions::new().looping(true));
        session.activate();

        let decision = session.poll(2.0, true).unwrap();
        assert_eq!(decision.boundary, Boundary::Rewind(1.0));
        assert!(!decision.boundary.is_terminal());
        assert_eq!(session.phase(), SessionPhase::Polling);
    }

    #[test]
    fn single_pass_ends_once() {
        let mut session = session(SegmentOptions::new());
        session.activate();

        assert_eq!(session.poll(2.01, true).unwrap().boundary, Boundary::End);
        assert!(session.is_finished());
        assert_eq!(session.poll(2.02, true), None);
    }

    #[test]
    fn stopped_device_halts() {
        let mut session = session(SegmentOptions::new().looping(true).fade_out(0.5));
        session.activate();

        let decision = session.poll(1.9, false).unwrap();
        assert_eq!(decision.boundary, Boundary::Halt);
        assert_eq!(decision.fade_out, None);
        assert!(session.is_finished());
    }

    #[test]
    fn fade_out_triggers_once() {
        let mut session = session(SegmentOptions::new().fade_out(0.5));
        session.activate();

        assert_eq!(session.poll(1.4, true).unwrap().fade_out, None);
        assert_eq!(
            session.poll(1.5, true).unwrap().fade_out,
            Some(Duration::from_millis(500))
        );
        assert!(session.is_fading());
        assert_eq!(session.poll(1.7, true).unwrap().fade_out, None);
        assert_eq!(session.poll(1.9, true).unwrap().fade_out, None);
    }

    #[test]
    fn fade_out_and_end_compose_on_one_frame() {
        let mut session = session(SegmentOptions::new().fade_out(0.5));
        session.activate();

        let decision = session.poll(2.0, true).unwrap();
        assert_eq!(decision.boundary, Boundary::End);
        assert_eq!(decision.fade_out, Some(Duration::from_millis(500)));
    }

    #[test]
    fn fade_out_stays_spent_across_loops() {
        let mut session = session(SegmentOptions::new().looping(true).fade_out(0.5));
        session.activate();

        assert!(session.poll(1.6, true).unwrap().fade_out.is_some());
        assert_eq!(session.poll(2.0, true).unwrap().boundary, Boundary::Rewind(1.0));
        assert_eq!(session.poll(1.6, true).unwrap().fade_out, None);
    }
}
