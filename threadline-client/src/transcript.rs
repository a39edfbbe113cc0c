//! Transcript store.
//!
//! Owns the ordered messages of a thread while a run is active. Every mutation
//! goes through this type, which keeps three invariants:
//!
//! - message ids are unique
//! - tool call ids are unique across all messages
//! - every tool message answers a tool call that is already present
//!
//! At most one placeholder message exists at a time. It is an empty assistant
//! message standing in for a response that has not produced content yet; it is
//! never patched and never leaves the store via [`TranscriptStore::into_messages`].

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;
use threadline_core::{Message, MessageId, ToolCall, ToolCallId, ToolCallState};

/// Transcript invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    /// A message with this id already exists.
    #[error("Message '{0}' already exists")]
    DuplicateMessage(MessageId),

    /// No message with this id exists.
    #[error("Message '{0}' not found")]
    UnknownMessage(MessageId),

    /// The placeholder cannot be patched.
    #[error("Message '{0}' is the placeholder")]
    PlaceholderTarget(MessageId),

    /// A tool call with this id already exists.
    #[error("Tool call '{0}' already exists")]
    DuplicateToolCall(ToolCallId),

    /// No tool call with this id exists.
    #[error("Tool call '{0}' not found")]
    UnknownToolCall(ToolCallId),

    /// The tool call has already completed.
    #[error("Tool call '{0}' is already completed")]
    ToolCallCompleted(ToolCallId),

    /// Tool calls can only be owned by assistant messages.
    #[error("Message '{0}' is not an assistant message")]
    NotAssistant(MessageId),
}

/// Result type for transcript operations.
pub type TranscriptResult<T> = Result<T, TranscriptError>;

/// A change to a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Replace the text body.
    SetContent(String),
    /// Append to the text body.
    AppendContent(String),
    /// Attach a new tool call. Assistant messages only.
    AddToolCall(ToolCall),
}

/// A change to a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCallMutation {
    /// Replace the argument text.
    SetArguments(String),
    /// Append to the argument text.
    AppendArguments(String),
    /// Mark the call completed.
    Complete,
}

/// Immutable view of the transcript, published to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSnapshot {
    messages: Arc<[Message]>,
    placeholder: Option<MessageId>,
}

impl Default for TranscriptSnapshot {
    fn default() -> Self {
        Self {
            messages: Arc::from(Vec::new()),
            placeholder: None,
        }
    }
}

impl TranscriptSnapshot {
    /// All messages in order, placeholder included.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The placeholder id, if one is present.
    #[must_use]
    pub fn placeholder(&self) -> Option<&MessageId> {
        self.placeholder.as_ref()
    }

    /// Whether a placeholder is present.
    #[must_use]
    pub fn has_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }

    /// Whether `id` is the placeholder.
    #[must_use]
    pub fn is_placeholder(&self, id: &MessageId) -> bool {
        self.placeholder.as_ref() == Some(id)
    }

    /// Messages in order, placeholder excluded.
    pub fn visible(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| !self.is_placeholder(m.id()))
    }

    /// Find a message by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id().as_str() == id)
    }

    /// Number of messages, placeholder included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Ordered, invariant-checked message store.
#[derive(Debug, Clone, Default)]
pub struct TranscriptStore {
    messages: IndexMap<MessageId, Message>,
    tool_calls: HashMap<ToolCallId, MessageId>,
    placeholder: Option<MessageId>,
    revision: u64,
}

impl TranscriptStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with prior messages.
    ///
    /// # Errors
    ///
    /// Fails if the history breaks an invariant, e.g. a repeated message id or
    /// a tool message with no matching call.
    pub fn with_history(history: impl IntoIterator<Item = Message>) -> TranscriptResult<Self> {
        let mut store = Self::new();
        for message in history {
            store.append(message)?;
        }
        store.revision = 0;
        Ok(store)
    }

    /// Append a message at the end.
    ///
    /// Tool calls carried by the message are indexed. The store is left
    /// untouched on error.
    pub fn append(&mut self, message: Message) -> TranscriptResult<()> {
        let id = message.id().clone();
        if self.messages.contains_key(&id) {
            return Err(TranscriptError::DuplicateMessage(id));
        }
        if let Some(call_id) = message.tool_call_id() {
            if !self.tool_calls.contains_key(call_id) {
                return Err(TranscriptError::UnknownToolCall(call_id.clone()));
            }
        }
        for call in message.tool_calls() {
            if self.tool_calls.contains_key(&call.id) {
                return Err(TranscriptError::DuplicateToolCall(call.id.clone()));
            }
        }

        for call in message.tool_calls() {
            self.tool_calls.insert(call.id.clone(), id.clone());
        }
        self.messages.insert(id, message);
        self.bump();
        Ok(())
    }

    /// Apply a mutation to an existing message.
    pub fn patch(&mut self, id: &MessageId, mutation: Mutation) -> TranscriptResult<()> {
        if self.is_placeholder(id) {
            return Err(TranscriptError::PlaceholderTarget(id.clone()));
        }
        if let Mutation::AddToolCall(call) = &mutation {
            if self.tool_calls.contains_key(&call.id) {
                return Err(TranscriptError::DuplicateToolCall(call.id.clone()));
            }
        }
        let message = self
            .messages
            .get_mut(id)
            .ok_or_else(|| TranscriptError::UnknownMessage(id.clone()))?;

        match mutation {
            Mutation::SetContent(content) => message.set_content(content),
            Mutation::AppendContent(delta) => message.push_content(&delta),
            Mutation::AddToolCall(call) => {
                let assistant = message
                    .as_assistant_mut()
                    .ok_or_else(|| TranscriptError::NotAssistant(id.clone()))?;
                self.tool_calls.insert(call.id.clone(), id.clone());
                assistant.tool_calls.push(call);
            }
        }
        self.bump();
        Ok(())
    }

    /// Apply a mutation to an existing tool call and return the updated call.
    pub fn patch_tool_call(
        &mut self,
        id: &ToolCallId,
        mutation: ToolCallMutation,
    ) -> TranscriptResult<&ToolCall> {
        let owner = self
            .tool_calls
            .get(id)
            .ok_or_else(|| TranscriptError::UnknownToolCall(id.clone()))?;
        let call = self
            .messages
            .get_mut(owner)
            .and_then(Message::as_assistant_mut)
            .and_then(|m| m.tool_call_mut(id.as_str()))
            .ok_or_else(|| TranscriptError::UnknownToolCall(id.clone()))?;

        if call.is_completed() {
            return Err(TranscriptError::ToolCallCompleted(id.clone()));
        }
        match mutation {
            ToolCallMutation::SetArguments(args) => {
                call.arguments = args;
                call.state = ToolCallState::ArgsStreaming;
            }
            ToolCallMutation::AppendArguments(delta) => {
                call.arguments.push_str(&delta);
                call.state = ToolCallState::ArgsStreaming;
            }
            ToolCallMutation::Complete => call.state = ToolCallState::Completed,
        }
        self.revision += 1;
        Ok(call)
    }

    /// Replace any existing placeholder with a fresh one at the end.
    pub fn insert_placeholder(&mut self) -> MessageId {
        self.remove_placeholder();
        let id = MessageId::new();
        self.messages
            .insert(id.clone(), Message::assistant(id.clone(), None));
        self.placeholder = Some(id.clone());
        self.bump();
        id
    }

    /// Remove the placeholder. Returns whether one was present.
    pub fn remove_placeholder(&mut self) -> bool {
        match self.placeholder.take() {
            Some(id) => {
                self.messages.shift_remove(&id);
                self.bump();
                true
            }
            None => false,
        }
    }

    /// The placeholder id, if one is present.
    #[must_use]
    pub fn placeholder(&self) -> Option<&MessageId> {
        self.placeholder.as_ref()
    }

    /// Whether a placeholder is present.
    #[must_use]
    pub fn has_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }

    fn is_placeholder(&self, id: &MessageId) -> bool {
        self.placeholder.as_ref() == Some(id)
    }

    /// Whether a message with this id exists.
    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.contains_key(id)
    }

    /// Find a message by id.
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.get(id)
    }

    /// Find a tool call by id.
    #[must_use]
    pub fn tool_call(&self, id: &ToolCallId) -> Option<&ToolCall> {
        let owner = self.tool_calls.get(id)?;
        self.messages.get(owner)?.as_assistant()?.tool_call(id.as_str())
    }

    /// The message owning a tool call.
    #[must_use]
    pub fn tool_call_owner(&self, id: &ToolCallId) -> Option<&MessageId> {
        self.tool_calls.get(id)
    }

    /// Messages in order, placeholder included.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    /// Number of messages, placeholder included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Counter bumped on every successful mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Capture the current state.
    #[must_use]
    pub fn snapshot(&self) -> TranscriptSnapshot {
        TranscriptSnapshot {
            messages: self.messages.values().cloned().collect(),
            placeholder: self.placeholder.clone(),
        }
    }

    /// Consume the store, dropping the placeholder.
    #[must_use]
    pub fn into_messages(mut self) -> Vec<Message> {
        self.remove_placeholder();
        self.messages.into_values().collect()
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assistant_with_call(id: &str, call: &str) -> Message {
        let mut message = Message::assistant(id, None);
        if let Some(a) = message.as_assistant_mut() {
            a.tool_calls.push(ToolCall::new(call, "echo"));
        }
        message
    }

    #[test]
    fn test_append_rejects_duplicate_id() {
        let mut store = TranscriptStore::new();
        store.append(Message::user("m1", "hi")).unwrap();

        let err = store.append(Message::user("m1", "again")).unwrap_err();
        assert_eq!(err, TranscriptError::DuplicateMessage("m1".into()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&"m1".into()).unwrap().content(), Some("hi"));
    }

    #[test]
    fn test_tool_message_requires_known_call() {
        let mut store = TranscriptStore::new();
        let err = store.append(Message::tool("r1", "c1", "")).unwrap_err();
        assert_eq!(err, TranscriptError::UnknownToolCall("c1".into()));

        store.append(assistant_with_call("a1", "c1")).unwrap();
        store.append(Message::tool("r1", "c1", "")).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_tool_call_ids_unique_across_messages() {
        let mut store = TranscriptStore::new();
        store.append(assistant_with_call("a1", "c1")).unwrap();

        let err = store.append(assistant_with_call("a2", "c1")).unwrap_err();
        assert_eq!(err, TranscriptError::DuplicateToolCall("c1".into()));
        assert!(!store.contains(&"a2".into()));

        store.append(Message::assistant("a2", None)).unwrap();
        let err = store
            .patch(&"a2".into(), Mutation::AddToolCall(ToolCall::new("c1", "echo")))
            .unwrap_err();
        assert_eq!(err, TranscriptError::DuplicateToolCall("c1".into()));
        assert!(store.get(&"a2".into()).unwrap().tool_calls().is_empty());
    }

    #[test]
    fn test_patch_content() {
        let mut store = TranscriptStore::new();
        store.append(Message::assistant("a1", Some(String::new()))).unwrap();

        store
            .patch(&"a1".into(), Mutation::AppendContent("Hel".into()))
            .unwrap();
        store
            .patch(&"a1".into(), Mutation::AppendContent("lo".into()))
            .unwrap();
        assert_eq!(store.get(&"a1".into()).unwrap().content(), Some("Hello"));

        store
            .patch(&"a1".into(), Mutation::SetContent("Bye".into()))
            .unwrap();
        assert_eq!(store.get(&"a1".into()).unwrap().content(), Some("Bye"));
    }

    #[test]
    fn test_patch_unknown_is_noop() {
        let mut store = TranscriptStore::new();
        let before = store.revision();
        let err = store
            .patch(&"ghost".into(), Mutation::SetContent("x".into()))
            .unwrap_err();
        assert_eq!(err, TranscriptError::UnknownMessage("ghost".into()));
        assert_eq!(store.revision(), before);
    }

    #[test]
    fn test_add_tool_call_to_user_message_fails() {
        let mut store = TranscriptStore::new();
        store.append(Message::user("u1", "hi")).unwrap();
        let err = store
            .patch(&"u1".into(), Mutation::AddToolCall(ToolCall::new("c1", "echo")))
            .unwrap_err();
        assert_eq!(err, TranscriptError::NotAssistant("u1".into()));
        assert!(store.tool_call(&"c1".into()).is_none());
    }

    #[test]
    fn test_placeholder_lifecycle() {
        let mut store = TranscriptStore::new();
        store.append(Message::user("u1", "hi")).unwrap();

        let first = store.insert_placeholder();
        let second = store.insert_placeholder();
        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
        assert_eq!(store.placeholder(), Some(&second));
        assert!(store.get(&second).unwrap().content().is_none());

        let err = store
            .patch(&second, Mutation::SetContent("x".into()))
            .unwrap_err();
        assert_eq!(err, TranscriptError::PlaceholderTarget(second.clone()));

        assert!(store.remove_placeholder());
        assert!(!store.remove_placeholder());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_patch_tool_call() {
        let mut store = TranscriptStore::new();
        store.append(assistant_with_call("a1", "c1")).unwrap();
        let id = ToolCallId::from("c1");

        store
            .patch_tool_call(&id, ToolCallMutation::AppendArguments("{\"a\":".into()))
            .unwrap();
        let call = store
            .patch_tool_call(&id, ToolCallMutation::AppendArguments("1}".into()))
            .unwrap();
        assert_eq!(call.arguments, "{\"a\":1}");
        assert_eq!(call.state, ToolCallState::ArgsStreaming);

        store
            .patch_tool_call(&id, ToolCallMutation::Complete)
            .unwrap();
        assert!(store.tool_call(&id).unwrap().is_completed());

        let err = store
            .patch_tool_call(&id, ToolCallMutation::SetArguments("{}".into()))
            .unwrap_err();
        assert_eq!(err, TranscriptError::ToolCallCompleted(id));
    }

    #[test]
    fn test_snapshot_and_into_messages() {
        let mut store =
            TranscriptStore::with_history(vec![Message::user("u1", "hi")]).unwrap();
        let placeholder = store.insert_placeholder();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.is_placeholder(&placeholder));
        assert_eq!(snapshot.visible().count(), 1);

        let messages = store.into_messages();
        assert_eq!(messages, vec![Message::user("u1", "hi")]);
    }

    #[test]
    fn test_with_history_validates() {
        let err = TranscriptStore::with_history(vec![
            Message::user("u1", "hi"),
            Message::user("u1", "hi"),
        ])
        .unwrap_err();
        assert_eq!(err, TranscriptError::DuplicateMessage("u1".into()));

        let store = TranscriptStore::with_history(vec![
            assistant_with_call("a1", "c1"),
            Message::tool("r1", "c1", "{}"),
        ])
        .unwrap();
        assert_eq!(store.tool_call_owner(&"c1".into()), Some(&"a1".into()));
    }
}
