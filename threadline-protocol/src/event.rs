//! AG-UI protocol event types.
//!
//! Every event on the wire is a JSON object with a `type` discriminator in
//! SCREAMING_SNAKE_CASE, camelCase fields and an optional millisecond
//! `timestamp`. Nine kinds are consumed by the client:
//!
//! - **Run lifecycle**: `RUN_STARTED`, `RUN_FINISHED`, `RUN_ERROR`
//! - **Text messages**: `TEXT_MESSAGE_START`, `TEXT_MESSAGE_CONTENT`, `TEXT_MESSAGE_END`
//! - **Tool calls**: `TOOL_CALL_START`, `TOOL_CALL_ARGS`, `TOOL_CALL_END`
//!
//! The remaining AG-UI kinds are recognised by [`EventType`] so they can be
//! reported precisely, but [`Event`] has no variant for them.

use serde::{Deserialize, Serialize};
use threadline_core::identifier::now_millis;
use threadline_core::{MessageId, Role, RunId, ThreadId, ToolCallId};

/// Event type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Run has started.
    RunStarted,
    /// Run has finished successfully.
    RunFinished,
    /// Run encountered an error.
    RunError,
    /// Text message started.
    TextMessageStart,
    /// Text message content.
    TextMessageContent,
    /// Text message ended.
    TextMessageEnd,
    /// Tool call started.
    ToolCallStart,
    /// Tool call arguments.
    ToolCallArgs,
    /// Tool call ended.
    ToolCallEnd,
    /// Single-shot text message chunk.
    TextMessageChunk,
    /// Single-shot tool call chunk.
    ToolCallChunk,
    /// Tool call result produced server-side.
    ToolCallResult,
    /// Thinking started.
    ThinkingStart,
    /// Thinking ended.
    ThinkingEnd,
    /// Step started.
    StepStarted,
    /// Step finished.
    StepFinished,
    /// State snapshot.
    StateSnapshot,
    /// State delta.
    StateDelta,
    /// Messages snapshot.
    MessagesSnapshot,
    /// Custom event.
    Custom,
    /// Raw passthrough event.
    Raw,
}

impl EventType {
    /// Whether the client has a transition for this kind.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            Self::RunStarted
                | Self::RunFinished
                | Self::RunError
                | Self::TextMessageStart
                | Self::TextMessageContent
                | Self::TextMessageEnd
                | Self::ToolCallStart
                | Self::ToolCallArgs
                | Self::ToolCallEnd
        )
    }

    /// The wire name, e.g. `RUN_STARTED`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunStarted => "RUN_STARTED",
            Self::RunFinished => "RUN_FINISHED",
            Self::RunError => "RUN_ERROR",
            Self::TextMessageStart => "TEXT_MESSAGE_START",
            Self::TextMessageContent => "TEXT_MESSAGE_CONTENT",
            Self::TextMessageEnd => "TEXT_MESSAGE_END",
            Self::ToolCallStart => "TOOL_CALL_START",
            Self::ToolCallArgs => "TOOL_CALL_ARGS",
            Self::ToolCallEnd => "TOOL_CALL_END",
            Self::TextMessageChunk => "TEXT_MESSAGE_CHUNK",
            Self::ToolCallChunk => "TOOL_CALL_CHUNK",
            Self::ToolCallResult => "TOOL_CALL_RESULT",
            Self::ThinkingStart => "THINKING_START",
            Self::ThinkingEnd => "THINKING_END",
            Self::StepStarted => "STEP_STARTED",
            Self::StepFinished => "STEP_FINISHED",
            Self::StateSnapshot => "STATE_SNAPSHOT",
            Self::StateDelta => "STATE_DELTA",
            Self::MessagesSnapshot => "MESSAGES_SNAPSHOT",
            Self::Custom => "CUSTOM",
            Self::Raw => "RAW",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Run Lifecycle Events
// ============================================================================

/// Run started.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStartedEvent {
    /// Thread identifier, echoed by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<ThreadId>,
    /// Run identifier, echoed by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    /// Timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl RunStartedEvent {
    /// Create a new run started event.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timestamp: Some(now_millis()),
            ..Self::default()
        }
    }

    /// Attach the thread and run identifiers.
    #[must_use]
    pub fn with_ids(mut self, thread_id: impl Into<ThreadId>, run_id: impl Into<RunId>) -> Self {
        self.thread_id = Some(thread_id.into());
        self.run_id = Some(run_id.into());
        self
    }
}

/// Run finished.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFinishedEvent {
    /// Thread identifier, echoed by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<ThreadId>,
    /// Run identifier, echoed by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    /// Timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl RunFinishedEvent {
    /// Create a new run finished event.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timestamp: Some(now_millis()),
            ..Self::default()
        }
    }

    /// Attach the thread and run identifiers.
    #[must_use]
    pub fn with_ids(mut self, thread_id: impl Into<ThreadId>, run_id: impl Into<RunId>) -> Self {
        self.thread_id = Some(thread_id.into());
        self.run_id = Some(run_id.into());
        self
    }
}

/// Run failed server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunErrorEvent {
    /// Error message.
    pub message: String,
    /// Optional machine-readable code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl RunErrorEvent {
    /// Create a new run error event.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            timestamp: Some(now_millis()),
        }
    }

    /// Set the error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

// ============================================================================
// Text Message Events
// ============================================================================

/// A text message has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageStartEvent {
    /// Message identifier.
    pub message_id: MessageId,
    /// Author role; assistant when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl TextMessageStartEvent {
    /// Create a new text message start event.
    #[must_use]
    pub fn new(message_id: impl Into<MessageId>) -> Self {
        Self {
            message_id: message_id.into(),
            role: None,
            timestamp: Some(now_millis()),
        }
    }

    /// Set the role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// The effective role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role.unwrap_or_default()
    }
}

/// Text for a message.
///
/// Whether `delta` is the whole current text or a fragment to append is a
/// property of the producer, not of the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageContentEvent {
    /// Message identifier.
    pub message_id: MessageId,
    /// Text.
    pub delta: String,
    /// Timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl TextMessageContentEvent {
    /// Create a new text message content event.
    #[must_use]
    pub fn new(message_id: impl Into<MessageId>, delta: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            delta: delta.into(),
            timestamp: Some(now_millis()),
        }
    }
}

/// A text message has ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageEndEvent {
    /// Message identifier.
    pub message_id: MessageId,
    /// Timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl TextMessageEndEvent {
    /// Create a new text message end event.
    #[must_use]
    pub fn new(message_id: impl Into<MessageId>) -> Self {
        Self {
            message_id: message_id.into(),
            timestamp: Some(now_millis()),
        }
    }
}

// ============================================================================
// Tool Call Events
// ============================================================================

/// A tool call has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallStartEvent {
    /// Tool call identifier.
    pub tool_call_id: ToolCallId,
    /// Capability name.
    pub tool_call_name: String,
    /// Assistant message owning the call, if the server names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<MessageId>,
    /// Timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ToolCallStartEvent {
    /// Create a new tool call start event.
    #[must_use]
    pub fn new(tool_call_id: impl Into<ToolCallId>, tool_call_name: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_call_name: tool_call_name.into(),
            parent_message_id: None,
            timestamp: Some(now_millis()),
        }
    }

    /// Set the parent message.
    #[must_use]
    pub fn with_parent_message_id(mut self, id: impl Into<MessageId>) -> Self {
        self.parent_message_id = Some(id.into());
        self
    }
}

/// Arguments for a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallArgsEvent {
    /// Tool call identifier.
    pub tool_call_id: ToolCallId,
    /// Raw argument text.
    pub delta: String,
    /// Timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ToolCallArgsEvent {
    /// Create a new tool call args event.
    #[must_use]
    pub fn new(tool_call_id: impl Into<ToolCallId>, delta: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            delta: delta.into(),
            timestamp: Some(now_millis()),
        }
    }
}

/// A tool call's arguments are complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallEndEvent {
    /// Tool call identifier.
    pub tool_call_id: ToolCallId,
    /// Timestamp in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ToolCallEndEvent {
    /// Create a new tool call end event.
    #[must_use]
    pub fn new(tool_call_id: impl Into<ToolCallId>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            timestamp: Some(now_millis()),
        }
    }
}

// ============================================================================
// Event union
// ============================================================================

/// One unit of protocol progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    /// Run started.
    RunStarted(RunStartedEvent),
    /// Text message started.
    TextMessageStart(TextMessageStartEvent),
    /// Text message content.
    TextMessageContent(TextMessageContentEvent),
    /// Text message ended.
    TextMessageEnd(TextMessageEndEvent),
    /// Tool call started.
    ToolCallStart(ToolCallStartEvent),
    /// Tool call arguments.
    ToolCallArgs(ToolCallArgsEvent),
    /// Tool call ended.
    ToolCallEnd(ToolCallEndEvent),
    /// Run failed.
    RunError(RunErrorEvent),
    /// Run finished.
    RunFinished(RunFinishedEvent),
}

impl Event {
    /// The discriminator of this event.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::RunStarted(_) => EventType::RunStarted,
            Self::TextMessageStart(_) => EventType::TextMessageStart,
            Self::TextMessageContent(_) => EventType::TextMessageContent,
            Self::TextMessageEnd(_) => EventType::TextMessageEnd,
            Self::ToolCallStart(_) => EventType::ToolCallStart,
            Self::ToolCallArgs(_) => EventType::ToolCallArgs,
            Self::ToolCallEnd(_) => EventType::ToolCallEnd,
            Self::RunError(_) => EventType::RunError,
            Self::RunFinished(_) => EventType::RunFinished,
        }
    }

    /// The timestamp (milliseconds since epoch), if present.
    #[must_use]
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Self::RunStarted(e) => e.timestamp,
            Self::TextMessageStart(e) => e.timestamp,
            Self::TextMessageContent(e) => e.timestamp,
            Self::TextMessageEnd(e) => e.timestamp,
            Self::ToolCallStart(e) => e.timestamp,
            Self::ToolCallArgs(e) => e.timestamp,
            Self::ToolCallEnd(e) => e.timestamp,
            Self::RunError(e) => e.timestamp,
            Self::RunFinished(e) => e.timestamp,
        }
    }

    /// Whether no further events are expected after this one.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RunError(_) | Self::RunFinished(_))
    }
}

macro_rules! impl_from_event {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Event {
                fn from(event: $ty) -> Self {
                    Self::$variant(event)
                }
            }
        )*
    };
}

impl_from_event!(
    RunStarted(RunStartedEvent),
    TextMessageStart(TextMessageStartEvent),
    TextMessageContent(TextMessageContentEvent),
    TextMessageEnd(TextMessageEndEvent),
    ToolCallStart(ToolCallStartEvent),
    ToolCallArgs(ToolCallArgsEvent),
    ToolCallEnd(ToolCallEndEvent),
    RunError(RunErrorEvent),
    RunFinished(RunFinishedEvent),
);
