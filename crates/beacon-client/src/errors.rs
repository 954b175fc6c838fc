//! Client-side error type.

/// Error surfaced by [`crate::HubClient`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The link is not open (never opened, closing, or closed).
    #[error("connection is closed")]
    Disconnected,

    /// The hub answered with an error reply.
    #[error("{message}")]
    Remote {
        /// Machine-readable wire code (e.g. `UNKNOWN_METHOD`).
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// The handshake did not complete.
    #[error("handshake failed: {message}")]
    Handshake {
        /// What went wrong.
        message: String,
    },

    /// A frame could not be encoded.
    #[error("protocol error: {message}")]
    Protocol {
        /// What went wrong.
        message: String,
    },

    /// Underlying WebSocket transport error.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}
