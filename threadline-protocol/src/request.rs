//! Run start request and response bodies.
//!
//! The client opens a run by posting a [`RunAgentInput`]; the server answers
//! with a [`RunStartResponse`] naming the run whose event stream to subscribe to.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use threadline_core::{Message, MessageId, RunId, ThreadId, ToolCall, ToolCallId};

/// A capability advertised to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Capability name.
    pub name: String,
    /// What the capability does.
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

/// Extra context forwarded to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    /// What the value is.
    pub description: String,
    /// The value.
    pub value: String,
}

/// Function part of a wire tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Capability name.
    pub name: String,
    /// Raw JSON argument text.
    pub arguments: String,
}

/// A tool call as the server expects to see it in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireToolCall {
    /// Tool call identifier.
    pub id: ToolCallId,
    /// Always `"function"`.
    #[serde(rename = "type")]
    pub call_type: String,
    /// Name and arguments.
    pub function: FunctionCall,
}

impl From<&ToolCall> for WireToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        }
    }
}

/// A history message in AG-UI wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum WireMessage {
    /// User message.
    #[serde(rename_all = "camelCase")]
    User {
        /// Message identifier.
        id: MessageId,
        /// Text.
        content: String,
    },
    /// System message.
    #[serde(rename_all = "camelCase")]
    System {
        /// Message identifier.
        id: MessageId,
        /// Text.
        content: String,
    },
    /// Developer message.
    #[serde(rename_all = "camelCase")]
    Developer {
        /// Message identifier.
        id: MessageId,
        /// Text.
        content: String,
    },
    /// Assistant message.
    #[serde(rename_all = "camelCase")]
    Assistant {
        /// Message identifier.
        id: MessageId,
        /// Text, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Tool calls, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<WireToolCall>>,
    },
    /// Tool result.
    #[serde(rename_all = "camelCase")]
    Tool {
        /// Message identifier.
        id: MessageId,
        /// Serialized result.
        content: String,
        /// The call this answers.
        tool_call_id: ToolCallId,
    },
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        match message {
            Message::User(m) => Self::User {
                id: m.id.clone(),
                content: m.content.clone(),
            },
            Message::System(m) => Self::System {
                id: m.id.clone(),
                content: m.content.clone(),
            },
            Message::Developer(m) => Self::Developer {
                id: m.id.clone(),
                content: m.content.clone(),
            },
            Message::Assistant(m) => Self::Assistant {
                id: m.id.clone(),
                content: m.content.clone(),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(m.tool_calls.iter().map(WireToolCall::from).collect())
                },
            },
            Message::Tool(m) => Self::Tool {
                id: m.id.clone(),
                content: m.content.clone(),
                tool_call_id: m.tool_call_id.clone(),
            },
        }
    }
}

/// Body of the run start request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAgentInput {
    /// Conversation the run belongs to.
    pub thread_id: ThreadId,
    /// Client-generated run identifier.
    pub run_id: RunId,
    /// Shared agent state.
    pub state: Value,
    /// Prior transcript followed by the new user message.
    pub messages: Vec<WireMessage>,
    /// Capabilities the agent may call.
    pub tools: Vec<ToolDescriptor>,
    /// Extra context.
    pub context: Vec<ContextItem>,
    /// Opaque properties forwarded to the agent.
    pub forwarded_props: Value,
}

impl RunAgentInput {
    /// Create a request with empty state, context and forwarded props.
    #[must_use]
    pub fn new(thread_id: ThreadId, run_id: RunId) -> Self {
        Self {
            thread_id,
            run_id,
            state: Value::Object(Default::default()),
            messages: Vec::new(),
            tools: Vec::new(),
            context: Vec::new(),
            forwarded_props: Value::Object(Default::default()),
        }
    }

    /// Set the message history.
    #[must_use]
    pub fn with_messages<'a>(mut self, messages: impl IntoIterator<Item = &'a Message>) -> Self {
        self.messages = messages.into_iter().map(WireMessage::from).collect();
        self
    }

    /// Set the advertised capabilities.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the shared state.
    #[must_use]
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    /// Set the forwarded props.
    #[must_use]
    pub fn with_forwarded_props(mut self, props: Value) -> Self {
        self.forwarded_props = props;
        self
    }
}

/// Body of a successful run start response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStartResponse {
    /// Run to subscribe to.
    pub run_id: RunId,
}
