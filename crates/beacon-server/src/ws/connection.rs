//! Server-side state for one connected client.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use beacon_proto::LinkState;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Failure enqueueing an outbound message for one connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The connection's outbound channel has been closed.
    #[error("outbound channel closed")]
    Closed,
    /// The connection's outbound queue is full.
    #[error("outbound queue full")]
    Full,
}

/// A connected client. Owned by the `ConnectionRegistry` for its lifetime.
pub struct Connection {
    /// Unique connection id.
    pub id: String,
    /// Lifecycle state.
    state: Mutex<LinkState>,
    /// Send channel to the connection's writer task.
    tx: mpsc::Sender<Arc<String>>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Whether the client has responded since the last ping.
    pub is_alive: AtomicBool,
    /// When the last Pong (or any activity) was received.
    last_pong: Mutex<Instant>,
    /// Count of messages dropped due to a full or closed channel.
    dropped_messages: AtomicU64,
}

impl Connection {
    /// Create a new connection in the `Connecting` state.
    pub fn new(id: String, tx: mpsc::Sender<Arc<String>>) -> Self {
        let now = Instant::now();
        Self {
            id,
            state: Mutex::new(LinkState::Connecting),
            tx,
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LinkState {
        *self.state.lock()
    }

    /// Advance the lifecycle state. Invalid transitions (including any
    /// transition out of `Closed`) are ignored.
    pub fn set_state(&self, next: LinkState) {
        let mut state = self.state.lock();
        if state.can_transition_to(next) {
            *state = next;
        }
    }

    /// Enqueue a text message for the client.
    ///
    /// Non-blocking; a full or closed channel counts as a dropped message.
    pub fn send(&self, message: Arc<String>) -> Result<(), SendError> {
        match self.tx.try_send(message) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
                Err(SendError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
                Err(SendError::Closed)
            }
        }
    }

    /// Total messages dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Mark the connection as alive (pong received).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Duration since the last pong (or connection establishment).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Check and reset the alive flag for the heartbeat.
    ///
    /// Returns `true` if the connection was alive since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
