//! Error types for `evbridge` core library.

use thiserror::Error;

/// Result type alias using `evbridge` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building transports or moving events between them.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed factory configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A factory had valid configuration but could not build its transport
    #[error("Construction error: {0}")]
    Construction(String),

    /// Delivery of a single event failed
    #[error("Send error: {0}")]
    Send(String),

    /// The cancellation token fired before the operation completed
    #[error("Operation cancelled")]
    Cancelled,

    /// Event attributes violate the envelope rules
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Wire encoding or decoding failed
    #[error("Codec error: {0}")]
    Codec(String),

    /// The transport does not play the requested role
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the error is the cancellation signal rather than a failure.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
