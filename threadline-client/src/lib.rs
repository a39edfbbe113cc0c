//! # threadline-client
//!
//! Client side of an AG-UI conversation: starts agent runs, consumes their
//! event streams and keeps an ordered, invariant-checked transcript.
//!
//! ## Core Concepts
//!
//! - **[`Thread`]**: a conversation; each submit starts one run
//! - **[`RunHandle`]**: observes a run through transcript snapshots and phases
//! - **[`EventInterpreter`]**: applies events to the transcript one at a time,
//!   invoking local capabilities for tool calls
//! - **[`TranscriptStore`]**: the ordered messages plus the tool-call index
//! - **[`Transport`]**: how runs are started and streamed; [`HttpTransport`]
//!   speaks JSON over HTTP and server-sent events
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use threadline_client::{ClientConfig, Thread};
//! use threadline_tools::{default_registry, ThemeState};
//!
//! # async fn run() -> Result<(), threadline_client::ClientError> {
//! let theme = Arc::new(ThemeState::default());
//! let thread = Thread::connect(ClientConfig::from_env()?, default_registry(theme));
//!
//! let handle = thread.submit("Switch to the dark theme").await?;
//! let outcome = handle.wait().await;
//! for message in outcome.transcript.visible() {
//!     println!("{}: {}", message.role(), message.content().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod interpreter;
pub mod session;
pub mod transcript;
pub mod transport;

pub use config::{ClientConfig, DeltaMode};
pub use error::ClientError;
pub use interpreter::{EventInterpreter, Flow};
pub use session::{RunHandle, RunOutcome, RunPhase, Thread};
pub use transcript::{
    Mutation, ToolCallMutation, TranscriptError, TranscriptResult, TranscriptSnapshot,
    TranscriptStore,
};
pub use transport::{EventPayloadStream, HttpTransport, Transport};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        ClientConfig, ClientError, DeltaMode, RunHandle, RunOutcome, RunPhase, Thread,
        TranscriptSnapshot, Transport,
    };
}
