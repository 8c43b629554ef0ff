//! # Event Bus System
//!
//! Broadcasts library sync progress to any number of observers using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: [`SyncEvent`] for the progress state machine and
//!   [`LibraryEvent`] for "the library contents changed" notifications
//! - **EventBus**: central broadcast channel the sync controller publishes to
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! Events are snapshots: observers never hold a reference into controller
//! state, they only see copies published after each transition.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Sync(SyncEvent::Started { total: 3 })).ok();
//!
//! let event = rx.recv().await.unwrap();
//! assert_eq!(event, CoreEvent::Sync(SyncEvent::Started { total: 3 }));
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{self, error::RecvError, error::SendError, Receiver};

/// Default number of buffered events per subscriber.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Sync(SyncEvent),
    Library(LibraryEvent),
}

impl CoreEvent {
    /// Short human-readable description, for logging.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Sync(event) => event.description(),
            CoreEvent::Library(event) => event.description(),
        }
    }
}

/// Progress of a library sync run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// Prior library state is being deleted.
    Clearing,
    /// Clear finished without a follow-up scan.
    Cleared,
    /// Scanning started; `total` is fixed for the rest of the run.
    Started {
        total: u64,
    },
    /// One more item was attempted.
    Progress {
        processed: u64,
        total: u64,
        percent: f64,
        message: String,
    },
    /// The built library is being written.
    Saving {
        artists: usize,
        albums: usize,
        tracks: usize,
    },
    Completed {
        artists: usize,
        albums: usize,
        tracks: usize,
        duration_ms: u64,
    },
    Failed {
        message: String,
        processed: u64,
        total: u64,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::Clearing => "Library clearing",
            SyncEvent::Cleared => "Library cleared",
            SyncEvent::Started { .. } => "Sync started",
            SyncEvent::Progress { .. } => "Sync in progress",
            SyncEvent::Saving { .. } => "Sync saving",
            SyncEvent::Completed { .. } => "Sync completed successfully",
            SyncEvent::Failed { .. } => "Sync failed",
        }
    }

    /// Whether this event ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncEvent::Completed { .. } | SyncEvent::Failed { .. })
    }
}

/// Library content notifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// Library contents were rebuilt or cleared; views should reload.
    Refreshed {
        /// Epoch milliseconds.
        at: i64,
    },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::Refreshed { .. } => "Library refreshed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus built on a broadcast channel.
///
/// Cloning the bus shares the same channel. Slow subscribers receive
/// `RecvError::Lagged` instead of blocking publishers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when nobody is listening.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
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
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` wrapper that skips events rejected by a filter.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let sync_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Sync(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Receives without waiting; `None` when nothing matching is buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
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
