//! Event interpreter.
//!
//! The single writer over a [`TranscriptStore`]. Events are applied one at a
//! time; [`EventInterpreter::apply`] only returns once the event's whole
//! effect, including any capability invocation, is in the store. A snapshot
//! is published to observers after every event that changed the transcript.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use threadline_core::{Message, MessageId, ToolCall, ToolCallId};
use threadline_protocol::{
    Event, RunErrorEvent, TextMessageContentEvent, TextMessageStartEvent, ToolCallArgsEvent,
    ToolCallStartEvent,
};
use threadline_tools::CapabilityRegistry;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::DeltaMode;
use crate::transcript::{Mutation, ToolCallMutation, TranscriptSnapshot, TranscriptStore};

/// What the caller should do after an event was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Keep consuming events.
    Continue,
    /// The run finished.
    Finished,
    /// The agent reported an error.
    Errored {
        /// Error message.
        message: String,
        /// Optional error code.
        code: Option<String>,
    },
    /// A terminal event was already applied; the event was ignored.
    Halted,
}

impl Flow {
    /// Whether the run is over.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// Applies protocol events to a transcript.
#[derive(Debug)]
pub struct EventInterpreter {
    store: TranscriptStore,
    registry: Arc<CapabilityRegistry>,
    delta_mode: DeltaMode,
    publisher: watch::Sender<TranscriptSnapshot>,
    published: u64,
    terminal: Option<Flow>,
}

impl EventInterpreter {
    /// Create an interpreter and a receiver for its snapshots.
    pub fn new(
        store: TranscriptStore,
        registry: Arc<CapabilityRegistry>,
        delta_mode: DeltaMode,
    ) -> (Self, watch::Receiver<TranscriptSnapshot>) {
        let (publisher, receiver) = watch::channel(store.snapshot());
        let published = store.revision();
        (
            Self {
                store,
                registry,
                delta_mode,
                publisher,
                published,
                terminal: None,
            },
            receiver,
        )
    }

    /// Another receiver for snapshots.
    pub fn subscribe(&self) -> watch::Receiver<TranscriptSnapshot> {
        self.publisher.subscribe()
    }

    /// The current transcript.
    #[must_use]
    pub fn snapshot(&self) -> TranscriptSnapshot {
        self.store.snapshot()
    }

    /// Borrow the store.
    #[must_use]
    pub fn store(&self) -> &TranscriptStore {
        &self.store
    }

    /// Consume the interpreter, returning its store.
    #[must_use]
    pub fn into_store(self) -> TranscriptStore {
        self.store
    }

    /// Whether a terminal event has been applied.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.terminal.is_some()
    }

    /// The terminal flow the run ended with, once a terminal event is applied.
    #[must_use]
    pub fn terminal(&self) -> Option<&Flow> {
        self.terminal.as_ref()
    }

    /// Apply one event.
    pub async fn apply(&mut self, event: Event) -> Flow {
        if self.terminal.is_some() {
            debug!(event_type = %event.event_type(), "Ignoring event after terminal event");
            return Flow::Halted;
        }

        if self.supersedes_placeholder(&event) && self.store.remove_placeholder() {
            debug!(event_type = %event.event_type(), "Removed placeholder");
        }

        let flow = match event {
            Event::RunStarted(_) => {
                let id = self.store.insert_placeholder();
                debug!(placeholder = %id, "Run started");
                Flow::Continue
            }
            Event::TextMessageStart(e) => {
                self.on_text_message_start(e);
                Flow::Continue
            }
            Event::TextMessageContent(e) => {
                self.on_text_message_content(e);
                Flow::Continue
            }
            Event::TextMessageEnd(e) => {
                if !self.store.contains(&e.message_id) {
                    debug!(message_id = %e.message_id, "End for unknown message");
                }
                Flow::Continue
            }
            Event::ToolCallStart(e) => {
                self.on_tool_call_start(e);
                Flow::Continue
            }
            Event::ToolCallArgs(e) => {
                self.on_tool_call_args(e);
                Flow::Continue
            }
            Event::ToolCallEnd(e) => {
                self.on_tool_call_end(e.tool_call_id).await;
                Flow::Continue
            }
            Event::RunError(RunErrorEvent { message, code, .. }) => {
                error!(%message, code = ?code, "Run error");
                Flow::Errored { message, code }
            }
            Event::RunFinished(_) => {
                info!("Run finished");
                Flow::Finished
            }
        };

        if flow.is_terminal() {
            self.terminal = Some(flow.clone());
        }
        self.publish();
        flow
    }

    /// Whether the event introduces or finalizes a concrete message.
    fn supersedes_placeholder(&self, event: &Event) -> bool {
        match event {
            Event::TextMessageStart(_) | Event::TextMessageEnd(_) | Event::ToolCallStart(_) => {
                true
            }
            Event::ToolCallEnd(e) => self
                .store
                .tool_call(&e.tool_call_id)
                .is_some_and(|call| !call.is_completed()),
            _ => false,
        }
    }

    fn on_text_message_start(&mut self, event: TextMessageStartEvent) {
        let role = event.role();
        let id = event.message_id;
        if self.store.contains(&id) {
            debug!(message_id = %id, "Message already started");
            return;
        }
        let Some(message) = Message::empty(id.clone(), role) else {
            warn!(message_id = %id, role = %role, "Cannot start a message with this role");
            return;
        };
        if let Err(e) = self.store.append(message) {
            warn!(message_id = %id, error = %e, "Failed to start message");
        }
    }

    fn on_text_message_content(&mut self, event: TextMessageContentEvent) {
        let mutation = match self.delta_mode {
            DeltaMode::Snapshot => Mutation::SetContent(event.delta),
            DeltaMode::Incremental => Mutation::AppendContent(event.delta),
        };
        if let Err(e) = self.store.patch(&event.message_id, mutation) {
            warn!(message_id = %event.message_id, error = %e, "Skipping message content");
        }
    }

    fn on_tool_call_start(&mut self, event: ToolCallStartEvent) {
        let ToolCallStartEvent {
            tool_call_id,
            tool_call_name,
            parent_message_id,
            ..
        } = event;

        if self.store.tool_call(&tool_call_id).is_some() {
            warn!(tool_call_id = %tool_call_id, "Tool call already started");
            return;
        }

        let owner = parent_message_id.unwrap_or_default();
        if !self.store.contains(&owner) {
            debug!(message_id = %owner, "Synthesizing tool call parent");
            if let Err(e) = self.store.append(Message::assistant(owner.clone(), None)) {
                warn!(message_id = %owner, error = %e, "Failed to synthesize tool call parent");
                return;
            }
        }

        let call = ToolCall::new(tool_call_id.clone(), tool_call_name);
        match self.store.patch(&owner, Mutation::AddToolCall(call)) {
            Ok(()) => debug!(tool_call_id = %tool_call_id, message_id = %owner, "Tool call started"),
            Err(e) => warn!(tool_call_id = %tool_call_id, error = %e, "Skipping tool call start"),
        }
    }

    fn on_tool_call_args(&mut self, event: ToolCallArgsEvent) {
        let mutation = match self.delta_mode {
            DeltaMode::Snapshot => ToolCallMutation::SetArguments(event.delta),
            DeltaMode::Incremental => ToolCallMutation::AppendArguments(event.delta),
        };
        if let Err(e) = self.store.patch_tool_call(&event.tool_call_id, mutation) {
            warn!(tool_call_id = %event.tool_call_id, error = %e, "Skipping tool call args");
        }
    }

    async fn on_tool_call_end(&mut self, tool_call_id: ToolCallId) {
        let (name, arguments) = match self.store.tool_call(&tool_call_id) {
            Some(call) if call.is_completed() => {
                warn!(tool_call_id = %tool_call_id, "Tool call already completed");
                return;
            }
            Some(call) => (call.name.clone(), call.arguments.clone()),
            None => {
                warn!(tool_call_id = %tool_call_id, "End for unknown tool call");
                return;
            }
        };

        let args = parse_arguments(&tool_call_id, &arguments);
        let content = if self.registry.contains(&name) {
            match self.registry.invoke(&name, args).await {
                Ok(result) => serde_json::to_string(&result).unwrap_or_default(),
                Err(e) => {
                    warn!(tool = %name, tool_call_id = %tool_call_id, error = %e, "Capability failed");
                    String::new()
                }
            }
        } else {
            debug!(tool = %name, "No local capability for tool call");
            String::new()
        };

        let result = Message::tool(MessageId::new(), tool_call_id.clone(), content);
        if let Err(e) = self.store.append(result) {
            warn!(tool_call_id = %tool_call_id, error = %e, "Failed to record tool result");
        }
        if let Err(e) = self
            .store
            .patch_tool_call(&tool_call_id, ToolCallMutation::Complete)
        {
            warn!(tool_call_id = %tool_call_id, error = %e, "Failed to complete tool call");
        }
    }

    fn publish(&mut self) {
        let revision = self.store.revision();
        if revision != self.published {
            self.published = revision;
            self.publisher.send_replace(self.store.snapshot());
        }
    }
}

/// Parse accumulated tool arguments, falling back to an empty object.
fn parse_arguments(tool_call_id: &ToolCallId, arguments: &str) -> JsonValue {
    if arguments.trim().is_empty() {
        return JsonValue::Object(Default::default());
    }
    serde_json::from_str(arguments).unwrap_or_else(|e| {
        warn!(tool_call_id = %tool_call_id, error = %e, "Tool arguments are not valid JSON");
        JsonValue::Object(Default::default())
    })
}
