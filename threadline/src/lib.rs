//! # threadline - AG-UI Chat Client for Rust
//!
//! threadline talks to agent backends that speak the AG-UI event protocol. A
//! user message starts a run; the backend answers with a stream of events
//! (text messages, tool calls, run lifecycle) that threadline folds into an
//! ordered transcript, invoking locally registered capabilities whenever the
//! agent calls one.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use threadline::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let theme = Arc::new(ThemeState::default());
//!     let thread = Thread::connect(ClientConfig::from_env()?, default_registry(theme.clone()));
//!
//!     let outcome = thread.submit("Switch to the dark theme").await?.wait().await;
//!     println!("run {} ended as {}; theme is {}", outcome.run_id, outcome.phase, theme.current());
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - Events of a run are applied strictly in arrival order, one at a time
//! - A capability invocation completes before the next event is applied
//! - Observers only ever see immutable transcript snapshots
//! - At most one run is active per thread
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|--------|
//! | `client` | Run sessions over HTTP and SSE | ✅ |
//!
//! ## Architecture
//!
//! threadline is organized as a workspace of focused crates:
//!
//! - [`threadline_core`] - Identifiers and transcript messages
//! - [`threadline_protocol`] - AG-UI events, validation and run requests
//! - [`threadline_streaming`] - Server-sent event parsing
//! - [`threadline_tools`] - Capabilities and their registry
//! - `threadline_client` - Run sessions, interpreter and transcript store (optional)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Identifiers and transcript messages.
pub use threadline_core as core;

/// AG-UI events, validation and run requests.
pub use threadline_protocol as protocol;

/// Server-sent event parsing.
pub use threadline_streaming as streaming;

/// Capabilities and their registry.
pub use threadline_tools as tools;

/// Run sessions over HTTP and SSE.
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub use threadline_client as client;

// ============================================================================
// Type Re-exports (Flat)
// ============================================================================

// Identifiers
pub use threadline_core::{MessageId, RunId, ThreadId, ToolCallId};

// Messages
pub use threadline_core::{AssistantMessage, Message, Role, ToolCall, ToolCallState};

// Protocol
pub use threadline_protocol::{
    decode_event, encode_event, Event, EventType, OutputFormat, RunAgentInput, RunStartResponse,
    ToolDescriptor, ValidationError,
};

// Streaming
pub use threadline_streaming::{SseEvent, SseParser, SseStream, StreamError};

// Capabilities
pub use threadline_tools::{
    default_registry, Capability, CapabilityDefinition, CapabilityError, CapabilityRegistry,
    CapabilityResult, EchoCapability, FunctionCapability, SchemaBuilder, Theme, ThemeCapability,
    ThemeSink, ThemeState,
};

// Client
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub use threadline_client::{
    ClientConfig, ClientError, DeltaMode, EventInterpreter, HttpTransport, RunHandle, RunOutcome,
    RunPhase, Thread, TranscriptSnapshot, TranscriptStore, Transport,
};

// ============================================================================
// Prelude Module
// ============================================================================

/// Convenient prelude for common imports.
///
/// ```rust
/// use threadline::prelude::*;
/// ```
pub mod prelude {
    // Identifiers and messages
    pub use crate::core::{Message, MessageId, Role, RunId, ThreadId, ToolCall, ToolCallId};

    // Protocol
    pub use crate::protocol::{Event, EventType, RunAgentInput};

    // Capabilities
    pub use crate::tools::{
        default_registry, Capability, CapabilityDefinition, CapabilityError, CapabilityRegistry,
        CapabilityResult, FunctionCapability, SchemaBuilder, Theme, ThemeState,
    };

    // Client
    #[cfg(feature = "client")]
    pub use crate::client::{
        ClientConfig, ClientError, DeltaMode, RunHandle, RunOutcome, RunPhase, Thread,
        TranscriptSnapshot, Transport,
    };
}

// ============================================================================
// Version Information
// ============================================================================

/// Returns the current version of threadline.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns version information as a tuple (major, minor, patch).
pub fn version_tuple() -> (u32, u32, u32) {
    let version = version();
    let parts: Vec<&str> = version.split('.').collect();
    (
        parts.first().and_then(|s| s.parse().ok()).unwrap_or(0),
        parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0),
        parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(0),
    )
}
