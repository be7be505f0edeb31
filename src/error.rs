//! Error types for the buzzer client.

use thiserror::Error;

/// Errors that can occur when using the buzzer client.
#[derive(Debug, Error)]
pub enum BuzzerError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection has already been closed.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The background loop has exited; intents are dropped, never queued.
    #[error("not connected to server")]
    NotConnected,

    /// A page or server URL could not be turned into session endpoints.
    #[error("invalid session url: {0}")]
    InvalidUrl(String),

    /// The audio sink failed to play the buzz clip.
    #[error("audio playback failed: {0}")]
    Playback(String),

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for buzzer client operations.
pub type Result<T> = std::result::Result<T, BuzzerError>;
