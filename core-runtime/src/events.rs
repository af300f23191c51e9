//! # Event Bus
//!
//! A broadcast channel that lets a host observe playback-core activity from
//! one place instead of juggling `PlaybackEngine`'s separate state/error
//! channels and a reporting sink. Anything that wants to mirror events into
//! analytics, a UI toast, or a desktop notification subscribes here.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::EventBus;
//!
//! let event_bus = EventBus::new(100); // buffer size of 100 events
//! ```
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent};
//! use core_playback::ReportingEvent;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = stream.recv().await {
//!         println!("received: {:?}", event);
//!     }
//! });
//!
//! event_bus.emit(CoreEvent::Reporting(ReportingEvent::NewSessionId {
//!     session_id: "abc123".to_string(),
//!     context_uri: "spotify:playlist:p".to_string(),
//!     context_size: Some(42),
//! })).ok();
//! # }
//! ```
//!
//! ## Error Handling
//!
//! The event bus uses `tokio::sync::broadcast`, which can produce two types
//! of errors:
//!
//! - `RecvError::Lagged(n)`: subscriber was too slow and missed `n` events.
//!   Non-fatal; the subscriber can keep receiving new events.
//! - `RecvError::Closed`: all senders have been dropped, signalling shutdown.

use core_playback::{ErrorEvent, ReportingEvent};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event published on the bus.
///
/// Wraps the two observer-facing event families `PlaybackEngine` exposes:
/// reporting events (session/playback identity, track transitions) and
/// playback errors.
#[derive(Debug, Clone)]
pub enum CoreEvent {
    /// A reporting event, mirrored from the engine's `ReportingSink`.
    Reporting(ReportingEvent),
    /// A playback error, mirrored from the engine's error broadcast channel.
    Error(ErrorEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Reporting(ReportingEvent::NewSessionId { .. }) => "new reporting session",
            CoreEvent::Reporting(ReportingEvent::NewPlaybackId { .. }) => "new playback id",
            CoreEvent::Reporting(ReportingEvent::TrackTransition { .. }) => "track transition",
            CoreEvent::Error(_) => "playback error",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Reporting(_) => EventSeverity::Info,
            CoreEvent::Error(e) if e.transient => EventSeverity::Warning,
            CoreEvent::Error(_) => EventSeverity::Error,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// `capacity` bounds how many events a subscriber can fall behind by
    /// before it receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events. Past events are not
    /// replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream. Only events that match the
    /// filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events, or `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
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

    /// Attempts to receive an event without blocking. Returns `None` if no
    /// events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use core_playback::reporting::{EndReason, StartReason, TrackTransitionMetrics};

    fn session_event() -> CoreEvent {
        CoreEvent::Reporting(ReportingEvent::NewSessionId {
            session_id: "sess-1".to_string(),
            context_uri: "spotify:playlist:p".to_string(),
            context_size: Some(10),
        })
    }

    fn transient_error_event() -> CoreEvent {
        CoreEvent::Error(ErrorEvent {
            message: "timed out".to_string(),
            transient: true,
            auto_advance: false,
        })
    }

    #[tokio::test]
    async fn bus_creation_starts_with_no_subscribers() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn bus_tracks_subscriber_count() {
        let bus = EventBus::new(10);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn emit_without_subscribers_errors() {
        let bus = EventBus::new(10);
        assert!(bus.emit(session_event()).is_err());
    }

    #[tokio::test]
    async fn subscriber_receives_emitted_event() {
        let bus = EventBus::new(10);
        let mut sub = bus.subscribe();

        let event = session_event();
        let result = bus.emit(event.clone());
        assert!(result.is_ok());

        let received = sub.recv().await.unwrap();
        assert!(matches!(received, CoreEvent::Reporting(ReportingEvent::NewSessionId { .. })));
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        bus.emit(session_event()).ok();

        sub1.recv().await.unwrap();
        sub2.recv().await.unwrap();
    }

    #[tokio::test]
    async fn stream_filter_skips_non_matching_events() {
        let bus = EventBus::new(10);
        let mut stream =
            EventStream::new(bus.subscribe()).filter(|e| matches!(e, CoreEvent::Error(_)));

        bus.emit(session_event()).ok();
        bus.emit(transient_error_event()).ok();

        let received = stream.recv().await.unwrap();
        assert!(matches!(received, CoreEvent::Error(_)));
    }

    #[tokio::test]
    async fn lagged_subscriber_reports_lag() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for _ in 0..5 {
            bus.emit(session_event()).ok();
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn severity_reflects_transience() {
        assert_eq!(transient_error_event().severity(), EventSeverity::Warning);
        assert_eq!(session_event().severity(), EventSeverity::Info);

        let fatal = CoreEvent::Error(ErrorEvent {
            message: "no decoder".to_string(),
            transient: false,
            auto_advance: false,
        });
        assert_eq!(fatal.severity(), EventSeverity::Error);
    }

    #[test]
    fn track_transition_event_is_constructible_and_cloneable() {
        let event = CoreEvent::Reporting(ReportingEvent::TrackTransition {
            device_id: None,
            last_command_device: None,
            metrics: TrackTransitionMetrics {
                track_id: "spotify:track:b".to_string(),
                playback_id: "pb-1".to_string(),
                context_uri: "spotify:playlist:p".to_string(),
                source_start: "track-done".to_string(),
                reason_start: StartReason::FwdBtn,
                source_end: "track-done".to_string(),
                reason_end: EndReason::TrackDone,
                intervals: Vec::new(),
                player: Default::default(),
            },
        });
        let cloned = event.clone();
        assert!(matches!(cloned, CoreEvent::Reporting(ReportingEvent::TrackTransition { .. })));
    }

    #[tokio::test]
    async fn try_recv_returns_none_when_empty() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());
    }
}
