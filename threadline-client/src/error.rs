//! Error types for the threadline client.

use thiserror::Error;
use threadline_core::ThreadId;
use threadline_protocol::ValidationError;
use threadline_streaming::StreamError;

use crate::transcript::TranscriptError;

/// Errors surfaced by the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The run start endpoint answered with a non-success status.
    #[error("Run start request failed with status {status}: {body}")]
    StartRequest {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The run start response carried an empty run id.
    #[error("Run start response did not include a run id")]
    MissingRunId,

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Event stream failure.
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// An event frame failed validation.
    #[error("Invalid event: {0}")]
    Validation(#[from] ValidationError),

    /// The agent reported a run error.
    #[error("Run failed: {message}")]
    Run {
        /// Error message from the agent.
        message: String,
        /// Optional error code.
        code: Option<String>,
    },

    /// The thread already has an active run.
    #[error("A run is already active on thread {0}")]
    RunInProgress(ThreadId),

    /// Transcript invariant violation.
    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The run task panicked or was aborted.
    #[error("Run task failed: {0}")]
    TaskFailed(String),
}

impl ClientError {
    /// Create a stream connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Stream(StreamError::Connection(msg.into()))
    }

    /// Whether the error came from the network layer.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Stream(_))
    }

    /// Whether the error was reported by the agent itself.
    #[must_use]
    pub fn is_run_error(&self) -> bool {
        matches!(self, Self::Run { .. })
    }
}
