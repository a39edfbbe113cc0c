//! Conversation message model.
//!
//! A transcript is an ordered list of [`Message`]s. The role decides the
//! shape: assistant messages may own [`ToolCall`]s, tool messages answer
//! exactly one tool call, and the remaining roles are plain text.

use serde::{Deserialize, Serialize};

use crate::identifier::{MessageId, ToolCallId};

/// The author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human on the other end of the thread.
    User,
    /// The agent.
    #[default]
    Assistant,
    /// A capability result.
    Tool,
    /// System instructions.
    System,
    /// Developer instructions.
    Developer,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::System => "system",
            Self::Developer => "developer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a tool call through the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallState {
    /// Announced, no arguments received yet.
    #[default]
    Pending,
    /// Arguments are arriving.
    ArgsStreaming,
    /// Arguments are final and the result has been recorded.
    Completed,
}

/// A request, embedded in an assistant message, to invoke a named capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Server-assigned identifier.
    pub id: ToolCallId,
    /// Capability name.
    pub name: String,
    /// Raw argument text; only parsed once the call ends.
    #[serde(default)]
    pub arguments: String,
    /// Streaming state.
    #[serde(default)]
    pub state: ToolCallState,
}

impl ToolCall {
    /// Create a pending tool call with no arguments.
    #[must_use]
    pub fn new(id: impl Into<ToolCallId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: String::new(),
            state: ToolCallState::Pending,
        }
    }

    /// Set the raw arguments.
    #[must_use]
    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = arguments.into();
        self
    }

    /// Set the state.
    #[must_use]
    pub fn with_state(mut self, state: ToolCallState) -> Self {
        self.state = state;
        self
    }

    /// Whether the call has been resolved.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state == ToolCallState::Completed
    }
}

/// A plain text message (user, system or developer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessage {
    /// Message identifier.
    pub id: MessageId,
    /// Text body.
    #[serde(default)]
    pub content: String,
}

/// A message authored by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    /// Message identifier.
    pub id: MessageId,
    /// Text body; absent on placeholders and pure tool-call parents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls owned by this message, in arrival order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantMessage {
    /// Find an owned tool call.
    #[must_use]
    pub fn tool_call(&self, id: &str) -> Option<&ToolCall> {
        self.tool_calls.iter().find(|c| c.id.as_str() == id)
    }

    /// Find an owned tool call mutably.
    pub fn tool_call_mut(&mut self, id: &str) -> Option<&mut ToolCall> {
        self.tool_calls.iter_mut().find(|c| c.id.as_str() == id)
    }
}

/// The result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMessage {
    /// Message identifier.
    pub id: MessageId,
    /// Serialized capability result, empty when there was none.
    #[serde(default)]
    pub content: String,
    /// The call this message answers.
    pub tool_call_id: ToolCallId,
}

/// A transcript entry, discriminated by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// User message.
    User(TextMessage),
    /// Assistant message.
    Assistant(AssistantMessage),
    /// Tool result message.
    Tool(ToolMessage),
    /// System message.
    System(TextMessage),
    /// Developer message.
    Developer(TextMessage),
}

impl Message {
    /// Create a user message.
    #[must_use]
    pub fn user(id: impl Into<MessageId>, content: impl Into<String>) -> Self {
        Self::User(TextMessage {
            id: id.into(),
            content: content.into(),
        })
    }

    /// Create a system message.
    #[must_use]
    pub fn system(id: impl Into<MessageId>, content: impl Into<String>) -> Self {
        Self::System(TextMessage {
            id: id.into(),
            content: content.into(),
        })
    }

    /// Create an assistant message with the given content and no tool calls.
    #[must_use]
    pub fn assistant(id: impl Into<MessageId>, content: Option<String>) -> Self {
        Self::Assistant(AssistantMessage {
            id: id.into(),
            content,
            tool_calls: Vec::new(),
        })
    }

    /// Create a tool result message.
    #[must_use]
    pub fn tool(
        id: impl Into<MessageId>,
        tool_call_id: impl Into<ToolCallId>,
        content: impl Into<String>,
    ) -> Self {
        Self::Tool(ToolMessage {
            id: id.into(),
            content: content.into(),
            tool_call_id: tool_call_id.into(),
        })
    }

    /// Create an empty message for a streamed text message start.
    ///
    /// Returns `None` for [`Role::Tool`], which cannot exist without a call
    /// to answer.
    #[must_use]
    pub fn empty(id: impl Into<MessageId>, role: Role) -> Option<Self> {
        let id = id.into();
        let text = |id| TextMessage {
            id,
            content: String::new(),
        };
        Some(match role {
            Role::Assistant => Self::assistant(id, Some(String::new())),
            Role::User => Self::User(text(id)),
            Role::System => Self::System(text(id)),
            Role::Developer => Self::Developer(text(id)),
            Role::Tool => return None,
        })
    }

    /// The message identifier.
    #[must_use]
    pub fn id(&self) -> &MessageId {
        match self {
            Self::User(m) | Self::System(m) | Self::Developer(m) => &m.id,
            Self::Assistant(m) => &m.id,
            Self::Tool(m) => &m.id,
        }
    }

    /// The message role.
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::User(_) => Role::User,
            Self::Assistant(_) => Role::Assistant,
            Self::Tool(_) => Role::Tool,
            Self::System(_) => Role::System,
            Self::Developer(_) => Role::Developer,
        }
    }

    /// The text body, if any.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::User(m) | Self::System(m) | Self::Developer(m) => Some(&m.content),
            Self::Assistant(m) => m.content.as_deref(),
            Self::Tool(m) => Some(&m.content),
        }
    }

    /// Replace the text body.
    pub fn set_content(&mut self, content: String) {
        match self {
            Self::User(m) | Self::System(m) | Self::Developer(m) => m.content = content,
            Self::Assistant(m) => m.content = Some(content),
            Self::Tool(m) => m.content = content,
        }
    }

    /// Append to the text body.
    pub fn push_content(&mut self, delta: &str) {
        match self {
            Self::User(m) | Self::System(m) | Self::Developer(m) => m.content.push_str(delta),
            Self::Assistant(m) => m.content.get_or_insert_with(String::new).push_str(delta),
            Self::Tool(m) => m.content.push_str(delta),
        }
    }

    /// Tool calls owned by this message. Empty for non-assistant roles.
    #[must_use]
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant(m) => &m.tool_calls,
            _ => &[],
        }
    }

    /// Borrow as an assistant message.
    #[must_use]
    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            Self::Assistant(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow as an assistant message mutably.
    pub fn as_assistant_mut(&mut self) -> Option<&mut AssistantMessage> {
        match self {
            Self::Assistant(m) => Some(m),
            _ => None,
        }
    }

    /// The answered call, for tool messages.
    #[must_use]
    pub fn tool_call_id(&self) -> Option<&ToolCallId> {
        match self {
            Self::Tool(m) => Some(&m.tool_call_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_message_serializes_with_role_tag() {
        let msg = Message::tool("m9", "t1", r#"{"theme":"dark"}"#);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "tool",
                "id": "m9",
                "content": "{\"theme\":\"dark\"}",
                "toolCallId": "t1"
            })
        );
    }

    #[test]
    fn test_assistant_omits_empty_tool_calls() {
        let msg = Message::assistant("m1", Some("hi".into()));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("toolCalls"));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_tool_call_state_names() {
        let call = ToolCall::new("t1", "setTheme").with_state(ToolCallState::ArgsStreaming);
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["state"], "args_streaming");
        assert_eq!(json["name"], "setTheme");
    }

    #[rstest]
    #[case(Role::Assistant, Some(Role::Assistant))]
    #[case(Role::User, Some(Role::User))]
    #[case(Role::System, Some(Role::System))]
    #[case(Role::Developer, Some(Role::Developer))]
    #[case(Role::Tool, None)]
    fn test_empty_message_per_role(#[case] role: Role, #[case] expected: Option<Role>) {
        let msg = Message::empty("m1", role);
        assert_eq!(msg.as_ref().map(Message::role), expected);
        if let Some(msg) = msg {
            assert_eq!(msg.content(), Some(""));
        }
    }

    #[test]
    fn test_content_mutation() {
        let mut msg = Message::assistant("m1", None);
        assert_eq!(msg.content(), None);
        msg.push_content("Hel");
        msg.push_content("lo");
        assert_eq!(msg.content(), Some("Hello"));
        msg.set_content("Bye".into());
        assert_eq!(msg.content(), Some("Bye"));
    }

    #[test]
    fn test_tool_call_lookup() {
        let mut msg = Message::assistant("m2", None);
        msg.as_assistant_mut()
            .unwrap()
            .tool_calls
            .push(ToolCall::new("t1", "setTheme"));
        assert_eq!(msg.tool_calls().len(), 1);
        let assistant = msg.as_assistant_mut().unwrap();
        assistant.tool_call_mut("t1").unwrap().arguments = "{}".into();
        assert_eq!(assistant.tool_call("t1").unwrap().arguments, "{}");
        assert!(assistant.tool_call("t2").is_none());
    }
}
