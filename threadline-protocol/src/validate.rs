//! Decoding and structural validation of incoming events.
//!
//! [`decode_event`] is the single entry point for untrusted payloads. It never
//! panics and never returns a partially decoded event: the caller either gets a
//! typed [`Event`] or a [`ValidationError`] and must treat the stream as broken.

use serde_json::Value;
use thiserror::Error;
use threadline_core::Role;

use crate::event::{Event, EventType};

/// A payload that does not match any of the known event shapes.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The payload is not JSON at all.
    #[error("Event payload is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),

    /// The payload is JSON but not an object.
    #[error("Event payload must be a JSON object")]
    NotObject,

    /// The `type` discriminator is missing or not a string.
    #[error("Event payload has no `type` discriminator")]
    MissingType,

    /// The discriminator names no AG-UI event.
    #[error("Unknown event type: {0}")]
    UnknownType(String),

    /// The discriminator names an AG-UI event the client does not consume.
    #[error("Unsupported event type: {0}")]
    UnsupportedType(EventType),

    /// Fields are missing or have the wrong shape.
    #[error("Malformed {kind} event: {source}")]
    Malformed {
        /// Event kind being decoded.
        kind: EventType,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// An identifier or name field is empty.
    #[error("{kind} event has an empty `{field}`")]
    EmptyField {
        /// Event kind.
        kind: EventType,
        /// Offending field, in wire spelling.
        field: &'static str,
    },

    /// A text message cannot be started with this role.
    #[error("Text messages cannot be started with role `{role}`")]
    InvalidRole {
        /// The rejected role.
        role: Role,
    },
}

/// Result type for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Decode and validate one raw event payload.
///
/// # Errors
///
/// Returns a [`ValidationError`] describing the first problem found.
pub fn decode_event(raw: &str) -> ValidationResult<Event> {
    let value: Value = serde_json::from_str(raw).map_err(ValidationError::NotJson)?;
    decode_value(value)
}

/// Decode and validate an already parsed payload.
///
/// # Errors
///
/// Returns a [`ValidationError`] describing the first problem found.
pub fn decode_value(value: Value) -> ValidationResult<Event> {
    let kind = event_kind(&value)?;
    if !kind.is_supported() {
        return Err(ValidationError::UnsupportedType(kind));
    }

    let event: Event =
        serde_json::from_value(value).map_err(|source| ValidationError::Malformed { kind, source })?;
    validate(&event)?;
    Ok(event)
}

fn event_kind(value: &Value) -> ValidationResult<EventType> {
    let object = value.as_object().ok_or(ValidationError::NotObject)?;
    let name = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingType)?;
    serde_json::from_value(Value::String(name.to_string()))
        .map_err(|_| ValidationError::UnknownType(name.to_string()))
}

/// Check field-level rules that the type system does not capture.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyField`] for blank identifiers or names and
/// [`ValidationError::InvalidRole`] for a `tool` text message.
pub fn validate(event: &Event) -> ValidationResult<()> {
    let kind = event.event_type();
    let require = |field: &'static str, value: &str| {
        if value.is_empty() {
            Err(ValidationError::EmptyField { kind, field })
        } else {
            Ok(())
        }
    };

    match event {
        Event::TextMessageStart(e) => {
            require("messageId", e.message_id.as_str())?;
            if e.role == Some(Role::Tool) {
                return Err(ValidationError::InvalidRole { role: Role::Tool });
            }
            Ok(())
        }
        Event::TextMessageContent(e) => require("messageId", e.message_id.as_str()),
        Event::TextMessageEnd(e) => require("messageId", e.message_id.as_str()),
        Event::ToolCallStart(e) => {
            require("toolCallId", e.tool_call_id.as_str())?;
            require("toolCallName", &e.tool_call_name)?;
            match &e.parent_message_id {
                Some(parent) => require("parentMessageId", parent.as_str()),
                None => Ok(()),
            }
        }
        Event::ToolCallArgs(e) => require("toolCallId", e.tool_call_id.as_str()),
        Event::ToolCallEnd(e) => require("toolCallId", e.tool_call_id.as_str()),
        Event::RunStarted(_) | Event::RunError(_) | Event::RunFinished(_) => Ok(()),
    }
}
