//! # threadline-protocol
//!
//! The AG-UI subset spoken between a threadline client and an agent server.
//!
//! - **[`Event`]**: the nine event kinds a client consumes, as a tagged union
//! - **[`decode_event`]**: turn an untrusted payload into an [`Event`] or a
//!   [`ValidationError`]
//! - **[`encode_event`]**: frame an event as SSE or NDJSON
//! - **[`RunAgentInput`]**: the run start request body
//!
//! ## Example
//!
//! ```rust
//! use threadline_protocol::{decode_event, Event, EventType};
//!
//! let event = decode_event(r#"{"type":"TEXT_MESSAGE_START","messageId":"m1"}"#).unwrap();
//! assert_eq!(event.event_type(), EventType::TextMessageStart);
//!
//! assert!(decode_event(r#"{"type":"TEXT_MESSAGE_START"}"#).is_err());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod encode;
pub mod event;
pub mod request;
pub mod validate;

pub use encode::{encode_event, encode_events, OutputFormat};
pub use event::{
    Event, EventType, RunErrorEvent, RunFinishedEvent, RunStartedEvent, TextMessageContentEvent,
    TextMessageEndEvent, TextMessageStartEvent, ToolCallArgsEvent, ToolCallEndEvent,
    ToolCallStartEvent,
};
pub use request::{
    ContextItem, FunctionCall, RunAgentInput, RunStartResponse, ToolDescriptor, WireMessage,
    WireToolCall,
};
pub use validate::{decode_event, decode_value, validate, ValidationError, ValidationResult};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::encode::{encode_event, OutputFormat};
    pub use crate::event::*;
    pub use crate::request::{RunAgentInput, RunStartResponse, ToolDescriptor};
    pub use crate::validate::{decode_event, ValidationError};
}
