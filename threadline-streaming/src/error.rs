//! Streaming errors.

use thiserror::Error;

/// Errors that can occur while reading an event stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Undelimited input grew past the parser's limit.
    #[error("SSE buffer exceeded {limit} bytes without an event boundary")]
    BufferOverflow {
        /// The limit in bytes.
        limit: usize,
    },

    /// IO error from the underlying byte stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection closed before a terminal event arrived.
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    /// Connection could not be established or was rejected.
    #[error("Connection error: {0}")]
    Connection(String),
}

impl StreamError {
    /// Build a connection error from any displayable error.
    pub fn connection<E: std::fmt::Display>(err: E) -> Self {
        Self::Connection(err.to_string())
    }
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;
