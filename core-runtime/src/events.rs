//! # Event Bus System
//!
//! Provides the publish/subscribe channel that carries player lifecycle
//! events between the playback controller, the audio adapter, and the
//! observers layered on top (waveform visualisation, transport UI).
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: the strongly-typed [`PlayerEvent`] enum
//! - **EventBus**: central channel for publishing events
//! - **EventStream**: wrapper for consuming events with filtering
//! - **Listeners**: synchronous callbacks invoked inline on `emit`
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   emit    ┌───────────┐   listener (inline)   ┌──────────────┐
//! │ Audio adapter├──────────>│           ├──────────────────────>│ SegmentPlayer│
//! └──────────────┘           │ EventBus  │                       └──────────────┘
//!                            │           │
//! ┌──────────────┐   emit    │ (broadcast│   subscribe (async)   ┌──────────────┐
//! │ SegmentPlayer├──────────>│  channel) ├──────────────────────>│ Visualisation│
//! └──────────────┘           └───────────┘                       └──────────────┘
//! ```
//!
//! Listeners serve consumers that must react within the same call stack as
//! the producer (the playback controller advancing its segment session on
//! `Playing`). Broadcast subscribers serve everything else.
//!
//! ## Usage
//!
//! ### Publishing Events
//!
//! ```rust
//! use core_runtime::events::{EventBus, PlayerEvent};
//!
//! let event_bus = EventBus::new(100);
//! let _observer = event_bus.subscribe();
//!
//! event_bus.emit(PlayerEvent::Playing { time: 1.5 }).ok();
//! ```
//!
//! ### Subscribing to Events
//!
//! ```rust
//! use core_runtime::events::{EventBus, RecvError};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! tokio::spawn(async move {
//!     loop {
//!         match stream.recv().await {
//!             Ok(event) => println!("Received: {}", event.name()),
//!             Err(RecvError::Lagged(n)) => {
//!                 eprintln!("Missed {} events", n);
//!             }
//!             Err(RecvError::Closed) => break,
//!         }
//!     }
//! });
//! # }
//! ```
//!
//! ### Listening Synchronously
//!
//! ```rust
//! use core_runtime::events::{EventBus, PlayerEvent};
//!
//! let event_bus = EventBus::new(100);
//! let id = event_bus.add_listener(|event| {
//!     if let PlayerEvent::Ended { time } = event {
//!         println!("segment ended at {time}");
//!     }
//! });
//!
//! event_bus.emit(PlayerEvent::Ended { time: 2.0 }).ok();
//! event_bus.remove_listener(id);
//! ```
//!
//! ## Error Handling
//!
//! The broadcast side uses `tokio::sync::broadcast`, which can produce two
//! types of errors:
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! ## Thread Safety
//!
//! The event bus is `Send + Sync` and cheap to clone; clones share the same
//! channel and listener set.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Player Events
// ============================================================================

/// Lifecycle events of the audio player.
///
/// Times are playback positions in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum PlayerEvent {
    /// The device has buffered enough to start playback.
    CanPlay,
    /// Playback actually started (or resumed).
    Playing { time: f64 },
    /// Playback paused.
    Pause { time: f64 },
    /// A seek completed.
    Seeked { time: f64 },
    /// Coarse periodic position update from the device.
    TimeUpdate { time: f64 },
    /// The track, or a non-looping segment, reached its end.
    Ended { time: f64 },
    /// The device reported an error.
    Error { message: String },
}

impl PlayerEvent {
    /// Wire name of the event, as seen by host-side listeners.
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::CanPlay => "player.canplay",
            PlayerEvent::Playing { .. } => "player.playing",
            PlayerEvent::Pause { .. } => "player.pause",
            PlayerEvent::Seeked { .. } => "player.seeked",
            PlayerEvent::TimeUpdate { .. } => "player.timeupdate",
            PlayerEvent::Ended { .. } => "player.ended",
            PlayerEvent::Error { .. } => "player.error",
        }
    }

    /// Playback position carried by the event, if any.
    pub fn time(&self) -> Option<f64> {
        match self {
            PlayerEvent::Playing { time }
            | PlayerEvent::Pause { time }
            | PlayerEvent::Seeked { time }
            | PlayerEvent::TimeUpdate { time }
            | PlayerEvent::Ended { time } => Some(*time),
            PlayerEvent::CanPlay | PlayerEvent::Error { .. } => None,
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            PlayerEvent::Error { .. } => EventSeverity::Error,
            PlayerEvent::TimeUpdate { .. } => EventSeverity::Debug,
            _ => EventSeverity::Info,
        }
    }
}

/// Event severity levels, used to pick the level `emit` logs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Error events
    Error,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Synchronous event listener.
pub type Listener = Arc<dyn Fn(&PlayerEvent) + Send + Sync>;

/// Identifier returned by [`EventBus::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Central event bus for player events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
    listeners: Arc<RwLock<Vec<(ListenerId, Listener)>>>,
    next_listener: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Panics
    ///
    /// Panics if `buffer_size` is zero.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self {
            sender,
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_listener: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publishes an event to all listeners and subscribers.
    ///
    /// Listeners run first, inline and in registration order. A listener may
    /// emit further events or (un)register listeners; changes to the listener
    /// set apply from the next `emit`.
    ///
    /// Returns the number of listeners and subscribers reached.
    ///
    /// # Errors
    ///
    /// Returns `SendError` if there was nobody to deliver the event to.
    pub fn emit(&self, event: PlayerEvent) -> Result<usize, SendError<PlayerEvent>> {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in &listeners {
            listener(&event);
        }

        let reached = listeners.len();
        match event.severity() {
            EventSeverity::Error => {
                warn!(event = event.name(), listeners = reached, "Event emitted")
            }
            EventSeverity::Info => {
                debug!(event = event.name(), listeners = reached, "Event emitted")
            }
            EventSeverity::Debug => {
                trace!(event = event.name(), listeners = reached, "Event emitted")
            }
        }

        match self.sender.send(event) {
            Ok(subscribers) => Ok(subscribers + listeners.len()),
            Err(_) if !listeners.is_empty() => Ok(listeners.len()),
            Err(err) => Err(err),
        }
    }

    /// Creates a new broadcast subscriber.
    ///
    /// The subscriber only receives events emitted after this call.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    /// Registers a synchronous listener.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed) + 1);
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Returns the current number of broadcast subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Returns the current number of synchronous listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

// ============================================================================
// Event Stream
// ============================================================================

type EventFilter = Box<dyn Fn(&PlayerEvent) -> bool + Send + Sync>;

/// Wrapper around a broadcast receiver with optional filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, PlayerEvent};
///
/// let event_bus = EventBus::new(100);
/// let stream = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, PlayerEvent::Ended { .. }));
/// ```
pub struct EventStream {
    receiver: Receiver<PlayerEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<PlayerEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PlayerEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<PlayerEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<PlayerEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_event_emission_no_observers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(PlayerEvent::CanPlay).is_err());
    }

    #[tokio::test]
    async fn test_event_emission_with_subscribers() {
        let bus = EventBus::new(10);
        let mut sub = bus.subscribe();

        let event = PlayerEvent::Playing { time: 1.0 };
        let result = bus.emit(event.clone());
        assert_eq!(result.unwrap(), 1);

        let received = sub.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = PlayerEvent::Seeked { time: 12.5 };
        bus.emit(event.clone()).ok();

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[test]
    fn test_listener_runs_inline() {
        let bus = EventBus::new(10);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        bus.add_listener(move |event| sink.lock().push(event.name()));

        assert_eq!(bus.emit(PlayerEvent::Playing { time: 0.0 }).unwrap(), 1);
        assert_eq!(*seen.lock(), vec!["player.playing"]);
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let bus = EventBus::new(10);
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&order);
        bus.add_listener(move |_| first.lock().push(1));
        let second = Arc::clone(&order);
        bus.add_listener(move |_| second.lock().push(2));

        bus.emit(PlayerEvent::CanPlay).ok();
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[test]
    fn test_removed_listener_is_not_called() {
        let bus = EventBus::new(10);
        let calls = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&calls);
        let id = bus.add_listener(move |_| *counter.lock() += 1);
        assert!(bus.remove_listener(id));
        assert!(!bus.remove_listener(id));

        assert!(bus.emit(PlayerEvent::CanPlay).is_err());
        assert_eq!(*calls.lock(), 0);
    }

    #[test]
    fn test_listener_can_emit_reentrantly() {
        let bus = EventBus::new(10);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner_bus = bus.clone();
        bus.add_listener(move |event| {
            if let PlayerEvent::Playing { time } = event {
                inner_bus.emit(PlayerEvent::TimeUpdate { time: *time }).ok();
            }
        });
        let sink = Arc::clone(&seen);
        bus.add_listener(move |event| sink.lock().push(event.clone()));

        bus.emit(PlayerEvent::Playing { time: 3.0 }).ok();
        assert_eq!(
            *seen.lock(),
            vec![
                PlayerEvent::TimeUpdate { time: 3.0 },
                PlayerEvent::Playing { time: 3.0 },
            ]
        );
    }

    #[tokio::test]
    async fn test_listeners_and_subscribers_both_counted() {
        let bus = EventBus::new(10);
        let _sub = bus.subscribe();
        bus.add_listener(|_| {});

        assert_eq!(bus.emit(PlayerEvent::Pause { time: 4.0 }).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, PlayerEvent::Ended { .. }));

        bus.emit(PlayerEvent::TimeUpdate { time: 1.9 }).ok();
        bus.emit(PlayerEvent::Ended { time: 2.0 }).ok();

        let received = stream.recv().await.unwrap();
        assert_eq!(received, PlayerEvent::Ended { time: 2.0 });
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(PlayerEvent::TimeUpdate { time: i as f64 }).ok();
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_names_and_times() {
        assert_eq!(PlayerEvent::Ended { time: 2.0 }.name(), "player.ended");
        assert_eq!(PlayerEvent::Ended { time: 2.0 }.time(), Some(2.0));
        assert_eq!(PlayerEvent::CanPlay.time(), None);
        assert_eq!(
            PlayerEvent::Error {
                message: "decode failed".to_string()
            }
            .severity(),
            EventSeverity::Error
        );
        assert_eq!(
            PlayerEvent::TimeUpdate { time: 0.5 }.severity(),
            EventSeverity::Debug
        );
    }

    #[test]
    fn test_emit_logs_at_event_severity() {
        use bridge_traits::logging::{LogLevel, MemorySink};
        use tracing_subscriber::layer::SubscriberExt;

        let sink = Arc::new(MemorySink::new(LogLevel::Trace));
        let subscriber =
            tracing_subscriber::registry().with(crate::logging::logger_sink_layer(sink.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let bus = EventBus::new(10);
        bus.add_listener(|_| {});
        bus.emit(PlayerEvent::TimeUpdate { time: 0.5 }).ok();
        bus.emit(PlayerEvent::Ended { time: 2.0 }).ok();
        bus.emit(PlayerEvent::Error {
            message: "decode failed".to_string(),
        })
        .ok();

        let levels: Vec<(LogLevel, Option<String>)> = sink
            .entries()
            .into_iter()
            .filter(|entry| entry.message == "Event emitted")
            .map(|entry| (entry.level, entry.field("event").map(str::to_string)))
            .collect();
        assert_eq!(
            levels,
            vec![
                (LogLevel::Trace, Some("player.timeupdate".to_string())),
                (LogLevel::Debug, Some("player.ended".to_string())),
                (LogLevel::Warn, Some("player.error".to_string())),
            ]
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = PlayerEvent::Seeked { time: 42.0 };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Seeked"));

        let deserialized: PlayerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());

        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_try_recv_with_event() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());

        bus.emit(PlayerEvent::CanPlay).ok();

        let received = stream.try_recv().unwrap().unwrap();
        assert_eq!(received, PlayerEvent::CanPlay);
    }
}
