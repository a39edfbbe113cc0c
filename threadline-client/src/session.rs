//! Threads and run sessions.
//!
//! A [`Thread`] is one conversation. Each [`Thread::submit`] starts a run:
//! the run request is posted, then a background task reads the event stream
//! into a bounded queue while a second loop drains that queue through an
//! [`EventInterpreter`], one event at a time.
//!
//! The interpreter's transcript holds only the active run: the submitted
//! user message and whatever the agent sends. Earlier runs travel in the run
//! request but are never targets for new events, so a backend may reuse
//! message or tool-call ids across runs. When the run ends, its messages are
//! appended to the thread's history.

use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use threadline_core::{Message, MessageId, RunId, ThreadId};
use threadline_protocol::{decode_event, RunAgentInput};
use threadline_streaming::StreamError;
use threadline_tools::CapabilityRegistry;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

use crate::config::{ClientConfig, DeltaMode, DEFAULT_QUEUE_CAPACITY};
use crate::error::ClientError;
use crate::interpreter::{EventInterpreter, Flow};
use crate::transcript::{TranscriptError, TranscriptSnapshot, TranscriptStore};
use crate::transport::{EventPayloadStream, HttpTransport, Transport};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Created, nothing sent yet.
    Init,
    /// Start request in flight.
    Starting,
    /// Consuming events.
    Streaming,
    /// The agent finished the run.
    Finished,
    /// The agent reported an error or sent an invalid event.
    Errored,
    /// The stream failed, ended early, or was closed by the caller.
    Closed,
}

impl RunPhase {
    /// Whether the run is over.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Errored | Self::Closed)
    }

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Starting => "starting",
            Self::Streaming => "streaming",
            Self::Finished => "finished",
            Self::Errored => "errored",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a run ended.
#[derive(Debug)]
pub struct RunOutcome {
    /// The run.
    pub run_id: RunId,
    /// Terminal phase.
    pub phase: RunPhase,
    /// Why the run did not finish, if it did not.
    pub error: Option<ClientError>,
    /// Final transcript.
    pub transcript: TranscriptSnapshot,
}

impl RunOutcome {
    /// Whether the agent finished the run.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == RunPhase::Finished
    }
}

#[derive(Debug, Default)]
struct ThreadState {
    history: Vec<Message>,
    active: Option<RunId>,
}

/// A conversation with an agent backend.
///
/// Cloning a thread shares its history; at most one run is active at a time.
#[derive(Clone)]
pub struct Thread {
    id: ThreadId,
    transport: Arc<dyn Transport>,
    registry: Arc<CapabilityRegistry>,
    delta_mode: DeltaMode,
    queue_capacity: usize,
    state: Arc<Mutex<ThreadState>>,
}

impl Thread {
    /// Create a thread with a fresh id.
    pub fn new(
        transport: impl Transport + 'static,
        registry: impl Into<Arc<CapabilityRegistry>>,
    ) -> Self {
        Self {
            id: ThreadId::new(),
            transport: Arc::new(transport),
            registry: registry.into(),
            delta_mode: DeltaMode::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            state: Arc::default(),
        }
    }

    /// Create a thread talking HTTP to the configured backend.
    pub fn connect(config: ClientConfig, registry: impl Into<Arc<CapabilityRegistry>>) -> Self {
        let delta_mode = config.delta_mode;
        let queue_capacity = config.queue_capacity;
        Self::new(HttpTransport::new(config), registry)
            .with_delta_mode(delta_mode)
            .with_queue_capacity(queue_capacity)
    }

    /// Use a specific thread id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ThreadId>) -> Self {
        self.id = id.into();
        self
    }

    /// Seed the thread with earlier messages.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transcript`] if the messages break a transcript
    /// invariant.
    pub fn with_history(self, history: Vec<Message>) -> Result<Self, ClientError> {
        TranscriptStore::with_history(history.iter().cloned())?;
        self.state.lock().history = history;
        Ok(self)
    }

    /// Set the delta mode.
    #[must_use]
    pub fn with_delta_mode(mut self, mode: DeltaMode) -> Self {
        self.delta_mode = mode;
        self
    }

    /// Set the event queue capacity (at least 1).
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// The thread id.
    #[must_use]
    pub fn id(&self) -> &ThreadId {
        &self.id
    }

    /// The capability registry.
    #[must_use]
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Messages of all completed runs.
    #[must_use]
    pub fn history(&self) -> Vec<Message> {
        self.state.lock().history.clone()
    }

    /// Whether a run is starting or streaming.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// Send a user message and start a run.
    ///
    /// Returns once the backend has accepted the run; events are processed in
    /// the background and observed through the returned [`RunHandle`].
    ///
    /// # Errors
    ///
    /// - [`ClientError::RunInProgress`] if a run is already active
    /// - [`ClientError::StartRequest`] and other transport errors if the run
    ///   could not be started
    pub async fn submit(&self, text: impl Into<String>) -> Result<RunHandle, ClientError> {
        self.submit_message(Message::user(MessageId::new(), text))
            .await
    }

    /// Like [`Thread::submit`], with a message built by the caller.
    ///
    /// # Errors
    ///
    /// See [`Thread::submit`]. Also fails with [`ClientError::Transcript`] if
    /// the message id is already used in the history.
    #[instrument(skip_all, fields(thread_id = %self.id, message_id = %message.id()))]
    pub async fn submit_message(&self, message: Message) -> Result<RunHandle, ClientError> {
        let request_id = RunId::new();
        let (reservation, mut messages) = self.reserve(request_id.clone(), message.id())?;
        let store = TranscriptStore::with_history([message.clone()])?;
        messages.push(message);

        let input = RunAgentInput::new(self.id.clone(), request_id)
            .with_messages(&messages)
            .with_tools(self.registry.descriptors());

        let (phase_tx, phase_rx) = watch::channel(RunPhase::Init);
        phase_tx.send_replace(RunPhase::Starting);

        let started = self.transport.start_run(&input).await.map_err(|e| {
            warn!(error = %e, "Run start failed");
            e
        })?;
        let run_id = started.run_id;
        info!(run_id = %run_id, "Run accepted");

        let (interpreter, transcript_rx) =
            EventInterpreter::new(store, self.registry.clone(), self.delta_mode);
        let cancel = CancellationToken::new();

        let driver = RunDriver {
            run_id: run_id.clone(),
            transport: self.transport.clone(),
            interpreter,
            phase: phase_tx,
            cancel: cancel.clone(),
            queue_capacity: self.queue_capacity,
            reservation,
        };
        let span = info_span!("run", thread_id = %self.id, run_id = %run_id);
        let task = tokio::spawn(driver.run().instrument(span));

        Ok(RunHandle {
            run_id,
            transcript: transcript_rx,
            phase: phase_rx,
            cancel,
            task,
        })
    }

    fn reserve(
        &self,
        run_id: RunId,
        message_id: &MessageId,
    ) -> Result<(Reservation, Vec<Message>), ClientError> {
        let mut state = self.state.lock();
        if state.active.is_some() {
            return Err(ClientError::RunInProgress(self.id.clone()));
        }
        if state.history.iter().any(|m| m.id() == message_id) {
            return Err(TranscriptError::DuplicateMessage(message_id.clone()).into());
        }
        state.active = Some(run_id.clone());
        let messages = state.history.clone();
        drop(state);

        let reservation = Reservation {
            state: self.state.clone(),
            run_id,
            committed: false,
        };
        Ok((reservation, messages))
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("capabilities", &self.registry.names())
            .field("delta_mode", &self.delta_mode)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Marks a thread busy for the lifetime of a run.
///
/// Dropping it without committing frees the thread and leaves its history
/// untouched.
struct Reservation {
    state: Arc<Mutex<ThreadState>>,
    run_id: RunId,
    committed: bool,
}

impl Reservation {
    fn commit(mut self, messages: Vec<Message>) {
        self.committed = true;
        let mut state = self.state.lock();
        state.history.extend(messages);
        state.active = None;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut state = self.state.lock();
        if state.active.as_ref() == Some(&self.run_id) {
            state.active = None;
        }
    }
}

/// Observes and controls a run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    transcript: watch::Receiver<TranscriptSnapshot>,
    phase: watch::Receiver<RunPhase>,
    cancel: CancellationToken,
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    /// The run id assigned by the backend.
    #[must_use]
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// A receiver notified after every transcript change.
    #[must_use]
    pub fn transcript(&self) -> watch::Receiver<TranscriptSnapshot> {
        self.transcript.clone()
    }

    /// The latest transcript.
    #[must_use]
    pub fn snapshot(&self) -> TranscriptSnapshot {
        self.transcript.borrow().clone()
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        *self.phase.borrow()
    }

    /// A receiver notified on every phase change.
    #[must_use]
    pub fn phases(&self) -> watch::Receiver<RunPhase> {
        self.phase.clone()
    }

    /// Close the subscription. Events not yet applied are dropped; an event
    /// being applied finishes first.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Wait for the run to end.
    pub async fn wait(self) -> RunOutcome {
        let transcript = self.snapshot();
        let run_id = self.run_id;
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => RunOutcome {
                run_id,
                phase: RunPhase::Closed,
                error: Some(ClientError::TaskFailed(e.to_string())),
                transcript,
            },
        }
    }
}

struct RunDriver {
    run_id: RunId,
    transport: Arc<dyn Transport>,
    interpreter: EventInterpreter,
    phase: watch::Sender<RunPhase>,
    cancel: CancellationToken,
    queue_capacity: usize,
    reservation: Reservation,
}

impl RunDriver {
    async fn run(mut self) -> RunOutcome {
        let (phase, error) = self.consume().await;
        self.cancel.cancel();

        let Self {
            run_id,
            interpreter,
            phase: phase_tx,
            reservation,
            ..
        } = self;
        let transcript = interpreter.snapshot();
        reservation.commit(interpreter.into_store().into_messages());
        phase_tx.send_replace(phase);

        match &error {
            Some(e) => info!(%phase, error = %e, "Run ended"),
            None => info!(%phase, "Run ended"),
        }
        RunOutcome {
            run_id,
            phase,
            error,
            transcript,
        }
    }

    async fn consume(&mut self) -> (RunPhase, Option<ClientError>) {
        let subscription = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return (RunPhase::Closed, None),
            subscription = self.transport.subscribe(&self.run_id) => subscription,
        };
        let stream = match subscription {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Subscription failed");
                return (RunPhase::Closed, Some(e));
            }
        };
        self.phase.send_replace(RunPhase::Streaming);

        let (tx, mut rx) = mpsc::channel(self.queue_capacity);
        let reader = tokio::spawn(read_payloads(stream, tx, self.cancel.clone()).in_current_span());

        let result = loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                next = rx.recv() => Some(next),
            };
            let Some(next) = next else {
                debug!("Run closed by caller");
                break (RunPhase::Closed, None);
            };

            let payload = match next {
                Some(Ok(payload)) => payload,
                Some(Err(e)) => {
                    warn!(error = %e, "Event stream failed");
                    break (RunPhase::Closed, Some(e));
                }
                None => {
                    warn!("Event stream ended before the run finished");
                    break (
                        RunPhase::Closed,
                        Some(ClientError::Stream(StreamError::ConnectionClosed)),
                    );
                }
            };

            let event = match decode_event(&payload) {
                Ok(event) => event,
                Err(e) => {
                    error!(error = %e, "Invalid event");
                    break (RunPhase::Errored, Some(e.into()));
                }
            };
            let flow = self.interpreter.apply(event).await;
            if flow.is_terminal() {
                break terminal_phase(&flow, self.interpreter.terminal());
            }
        };

        self.cancel.cancel();
        drop(rx);
        if let Err(e) = reader.await {
            warn!(error = %e, "Event reader failed");
        }
        result
    }
}

/// Phase and error for a terminal flow. An ignored event reports the
/// terminal event that halted the interpreter.
fn terminal_phase(flow: &Flow, first: Option<&Flow>) -> (RunPhase, Option<ClientError>) {
    match flow {
        Flow::Continue => (RunPhase::Streaming, None),
        Flow::Finished => (RunPhase::Finished, None),
        Flow::Errored { message, code } => (
            RunPhase::Errored,
            Some(ClientError::Run {
                message: message.clone(),
                code: code.clone(),
            }),
        ),
        Flow::Halted => match first {
            Some(first) if !matches!(first, Flow::Halted) => terminal_phase(first, None),
            _ => (RunPhase::Closed, None),
        },
    }
}

/// Forward stream payloads into the queue until the stream ends, fails, or
/// the run is cancelled.
async fn read_payloads(
    mut stream: EventPayloadStream,
    tx: mpsc::Sender<Result<String, ClientError>>,
    cancel: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = stream.next() => next,
        };
        let Some(item) = next else { break };
        let failed = item.is_err();

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = tx.send(item) => sent,
        };
        if sent.is_err() || failed {
            break;
        }
    }
    debug!("Event reader stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::stream;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;
    use threadline_core::Role;
    use threadline_protocol::{
        encode_event, Event, OutputFormat, RunErrorEvent, RunFinishedEvent, RunStartResponse,
        RunStartedEvent, TextMessageContentEvent, TextMessageEndEvent, TextMessageStartEvent,
        ToolCallArgsEvent, ToolCallEndEvent, ToolCallStartEvent,
    };
    use threadline_tools::{default_registry, Theme, ThemeState};
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Replays fixed frames for every run and records run requests.
    #[derive(Default)]
    struct ScriptedTransport {
        frames: Vec<String>,
        later_runs: Vec<Vec<String>>,
        hold_open: bool,
        reject_start: bool,
        requests: Mutex<Vec<RunAgentInput>>,
    }

    impl ScriptedTransport {
        fn new(events: Vec<Event>) -> Self {
            Self {
                frames: events
                    .iter()
                    .map(|e| serde_json::to_string(e).unwrap())
                    .collect(),
                ..Self::default()
            }
        }

        /// One script per run, in submit order; the last one repeats.
        fn runs(runs: Vec<Vec<Event>>) -> Self {
            let mut scripts: Vec<Vec<String>> = runs
                .iter()
                .map(|events| {
                    events
                        .iter()
                        .map(|e| serde_json::to_string(e).unwrap())
                        .collect()
                })
                .collect();
            let frames = scripts.remove(0);
            Self {
                frames,
                later_runs: scripts,
                ..Self::default()
            }
        }

        fn raw(frames: &[&str]) -> Self {
            Self {
                frames: frames.iter().map(|f| f.to_string()).collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn start_run(&self, input: &RunAgentInput) -> Result<RunStartResponse, ClientError> {
            if self.reject_start {
                return Err(ClientError::StartRequest {
                    status: 503,
                    body: String::new(),
                });
            }
            self.requests.lock().push(input.clone());
            Ok(RunStartResponse {
                run_id: input.run_id.clone(),
            })
        }

        async fn subscribe(&self, _run_id: &RunId) -> Result<EventPayloadStream, ClientError> {
            let run = self.requests.lock().len().saturating_sub(1);
            let script = match run.checked_sub(1) {
                Some(i) => self
                    .later_runs
                    .get(i)
                    .or(self.later_runs.last())
                    .unwrap_or(&self.frames),
                None => &self.frames,
            };
            let frames = stream::iter(script.clone().into_iter().map(Ok));
            if self.hold_open {
                Ok(frames.chain(stream::pending()).boxed())
            } else {
                Ok(frames.boxed())
            }
        }
    }

    fn greeting_run() -> Vec<Event> {
        vec![
            RunStartedEvent::new().into(),
            TextMessageStartEvent::new("m1").into(),
            TextMessageContentEvent::new("m1", "Hello").into(),
            TextMessageEndEvent::new("m1").into(),
            RunFinishedEvent::new().into(),
        ]
    }

    #[tokio::test]
    async fn test_submit_runs_to_completion() {
        let transport = Arc::new(ScriptedTransport::new(greeting_run()));
        let thread = Thread::new(
            transport.clone(),
            default_registry(Arc::new(ThemeState::default())),
        )
        .with_id("thread-1");

        let handle = thread.submit("hi").await.unwrap();
        let outcome = handle.wait().await;

        assert_eq!(outcome.phase, RunPhase::Finished);
        assert!(outcome.error.is_none());
        assert!(!outcome.transcript.has_placeholder());
        assert!(!thread.is_running());

        let history = thread.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role(), Role::User);
        assert_eq!(history[0].content(), Some("hi"));
        assert_eq!(history[1], Message::assistant("m1", Some("Hello".into())));

        let requests = transport.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].thread_id.as_str(), "thread-1");
        assert_eq!(requests[0].messages.len(), 1);
        let tools: Vec<_> = requests[0].tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tools, vec!["setTheme", "echo"]);
    }

    fn reply_run(text: &str) -> Vec<Event> {
        vec![
            RunStartedEvent::new().into(),
            TextMessageStartEvent::new("m1").into(),
            TextMessageContentEvent::new("m1", text).into(),
            TextMessageEndEvent::new("m1").into(),
            RunFinishedEvent::new().into(),
        ]
    }

    fn contents(messages: &[Message]) -> Vec<(Role, String)> {
        messages
            .iter()
            .map(|m| (m.role(), m.content().unwrap_or_default().to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_next_run_sends_history() {
        let transport = Arc::new(ScriptedTransport::runs(vec![
            reply_run("first answer"),
            reply_run("second answer"),
        ]));
        let thread = Thread::new(transport.clone(), CapabilityRegistry::new());

        thread.submit("q1").await.unwrap().wait().await;
        let err = thread.submit_message(Message::user("m1", "dup")).await.unwrap_err();
        assert!(matches!(err, ClientError::Transcript(_)));
        assert!(!thread.is_running());

        let outcome = thread.submit("q2").await.unwrap().wait().await;
        assert_eq!(outcome.phase, RunPhase::Finished);

        // The second run's transcript only holds that run.
        assert_eq!(
            contents(outcome.transcript.messages()),
            vec![
                (Role::User, "q2".to_string()),
                (Role::Assistant, "second answer".to_string()),
            ]
        );
        assert_eq!(
            contents(&thread.history()),
            vec![
                (Role::User, "q1".to_string()),
                (Role::Assistant, "first answer".to_string()),
                (Role::User, "q2".to_string()),
                (Role::Assistant, "second answer".to_string()),
            ]
        );

        let requests = transport.requests.lock();
        assert_eq!(requests[1].messages.len(), 3);
    }

    #[tokio::test]
    async fn test_tool_call_id_reused_in_later_run() {
        let theme = Arc::new(ThemeState::default());
        let tool_run = |theme: &str| -> Vec<Event> {
            vec![
                RunStartedEvent::new().into(),
                ToolCallStartEvent::new("t1", "setTheme")
                    .with_parent_message_id("a1")
                    .into(),
                ToolCallArgsEvent::new("t1", format!(r#"{{"theme":"{theme}"}}"#)).into(),
                ToolCallEndEvent::new("t1").into(),
                RunFinishedEvent::new().into(),
            ]
        };
        let transport = ScriptedTransport::runs(vec![tool_run("dark"), tool_run("cupcake")]);
        let thread = Thread::new(transport, default_registry(theme.clone()));

        thread.submit("dark please").await.unwrap().wait().await;
        assert_eq!(theme.current(), Theme::Dark);

        let outcome = thread.submit("now pink").await.unwrap().wait().await;
        assert!(outcome.is_finished());
        assert_eq!(theme.current(), Theme::Cupcake);

        let results: Vec<_> = thread
            .history()
            .iter()
            .filter(|m| m.role() == Role::Tool)
            .map(|m| m.content().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            results,
            vec![r#"{"theme":"dark"}"#, r#"{"theme":"cupcake"}"#]
        );
        assert_eq!(thread.history().len(), 6);
    }

    #[tokio::test]
    async fn test_run_error_drops_buffered_events() {
        let transport = ScriptedTransport::new(vec![
            RunStartedEvent::new().into(),
            TextMessageStartEvent::new("m1").into(),
            RunErrorEvent::new("boom").into(),
            TextMessageStartEvent::new("m2").into(),
            RunFinishedEvent::new().into(),
        ]);
        let thread = Thread::new(transport, CapabilityRegistry::new());

        let outcome = thread.submit("hi").await.unwrap().wait().await;

        assert_eq!(outcome.phase, RunPhase::Errored);
        match outcome.error {
            Some(ClientError::Run { message, .. }) => assert_eq!(message, "boom"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(outcome.transcript.get("m1").is_some());
        assert!(outcome.transcript.get("m2").is_none());
        assert!(thread.history().iter().all(|m| m.id().as_str() != "m2"));
    }

    #[tokio::test]
    async fn test_malformed_event_errors_run() {
        let transport = ScriptedTransport::raw(&[
            r#"{"type":"RUN_STARTED"}"#,
            r#"{"type":"TEXT_MESSAGE_START"}"#,
            r#"{"type":"RUN_FINISHED"}"#,
        ]);
        let thread = Thread::new(transport, CapabilityRegistry::new());

        let outcome = thread.submit("hi").await.unwrap().wait().await;
        assert_eq!(outcome.phase, RunPhase::Errored);
        assert!(matches!(outcome.error, Some(ClientError::Validation(_))));
        // The placeholder never reaches the history.
        assert_eq!(thread.history().len(), 1);
    }

    #[tokio::test]
    async fn test_stream_end_without_terminal_event_closes() {
        let transport = ScriptedTransport::new(vec![
            RunStartedEvent::new().into(),
            TextMessageStartEvent::new("m1").into(),
        ]);
        let thread = Thread::new(transport, CapabilityRegistry::new());

        let outcome = thread.submit("hi").await.unwrap().wait().await;
        assert_eq!(outcome.phase, RunPhase::Closed);
        assert!(outcome.error.unwrap().is_transport());
    }

    #[tokio::test]
    async fn test_one_run_at_a_time() {
        let transport = ScriptedTransport {
            hold_open: true,
            ..ScriptedTransport::new(vec![RunStartedEvent::new().into()])
        };
        let thread = Thread::new(transport, CapabilityRegistry::new());

        let handle = thread.submit("first").await.unwrap();
        assert!(thread.is_running());
        let err = thread.submit("second").await.unwrap_err();
        assert!(matches!(err, ClientError::RunInProgress(_)));

        let mut transcript = handle.transcript();
        transcript
            .wait_for(|s| s.has_placeholder())
            .await
            .unwrap();
        assert_eq!(handle.phase(), RunPhase::Streaming);

        handle.close();
        let outcome = handle.wait().await;
        assert_eq!(outcome.phase, RunPhase::Closed);
        assert!(outcome.error.is_none());
        assert!(!thread.is_running());
        assert!(thread.submit("third").await.is_ok());
    }

    #[tokio::test]
    async fn test_start_failure_frees_thread() {
        let transport = ScriptedTransport {
            reject_start: true,
            ..ScriptedTransport::default()
        };
        let thread = Thread::new(transport, CapabilityRegistry::new());

        let err = thread.submit("hi").await.unwrap_err();
        assert!(matches!(err, ClientError::StartRequest { status: 503, .. }));
        assert!(!thread.is_running());
        assert!(thread.history().is_empty());
    }

    #[tokio::test]
    async fn test_tool_call_round_trip() {
        let theme = Arc::new(ThemeState::default());
        let transport = ScriptedTransport::new(vec![
            RunStartedEvent::new().into(),
            ToolCallStartEvent::new("t1", "setTheme")
                .with_parent_message_id("m2")
                .into(),
            ToolCallArgsEvent::new("t1", r#"{"theme":"cupcake"}"#).into(),
            ToolCallEndEvent::new("t1").into(),
            TextMessageStartEvent::new("m3").into(),
            TextMessageContentEvent::new("m3", "Done").into(),
            RunFinishedEvent::new().into(),
        ]);
        let thread = Thread::new(transport, default_registry(theme.clone()));

        let outcome = thread.submit("make it pink").await.unwrap().wait().await;

        assert!(outcome.is_finished());
        assert_eq!(theme.current(), Theme::Cupcake);
        let roles: Vec<_> = thread.history().iter().map(Message::role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        assert_eq!(
            thread.history()[2].content(),
            Some(r#"{"theme":"cupcake"}"#)
        );
    }

    #[tokio::test]
    async fn test_events_wait_for_slow_capability() {
        let registry = CapabilityRegistry::new().with(threadline_tools::FunctionCapability::new(
            "slow",
            "Sleeps before answering",
            json!({"type": "object"}),
            |_args| async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok::<_, threadline_tools::CapabilityError>(json!({"ok": true}))
            },
        ));
        let transport = ScriptedTransport::new(vec![
            ToolCallStartEvent::new("t1", "slow").with_parent_message_id("a1").into(),
            ToolCallEndEvent::new("t1").into(),
            TextMessageStartEvent::new("m2").into(),
            TextMessageContentEvent::new("m2", "after").into(),
            RunFinishedEvent::new().into(),
        ]);
        let thread = Thread::new(transport, registry).with_queue_capacity(1);

        let outcome = thread.submit("go").await.unwrap().wait().await;

        let ids: Vec<_> = outcome
            .transcript
            .visible()
            .map(|m| (m.role(), m.content().map(str::to_string)))
            .collect();
        assert_eq!(ids[2], (Role::Tool, Some(r#"{"ok":true}"#.to_string())));
        assert_eq!(ids[3], (Role::Assistant, Some("after".to_string())));
    }

    #[tokio::test]
    async fn test_with_history_rejects_orphan_tool_message() {
        let thread = Thread::new(ScriptedTransport::default(), CapabilityRegistry::new());
        let err = thread
            .with_history(vec![Message::tool("r1", "missing", "")])
            .unwrap_err();
        assert!(matches!(err, ClientError::Transcript(_)));
    }

    #[tokio::test]
    async fn test_http_session_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"runId": "run-42"})))
            .mount(&server)
            .await;

        let body: String = greeting_run()
            .iter()
            .map(|e| encode_event(e, OutputFormat::Sse).unwrap())
            .collect();
        Mock::given(method("GET"))
            .and(path_regex(r"^/api/v1/chat/stream/run-42$"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let config = ClientConfig::new()
            .with_base_url(&format!("{}/api/v1", server.uri()))
            .unwrap();
        let thread = Thread::connect(config, CapabilityRegistry::new());

        let handle = thread.submit("hi").await.unwrap();
        assert_eq!(handle.run_id().as_str(), "run-42");
        let outcome = handle.wait().await;

        assert_eq!(outcome.phase, RunPhase::Finished);
        assert_eq!(thread.history()[1].content(), Some("Hello"));
    }

    #[test]
    fn test_terminal_phase_keeps_first_terminal_event() {
        let errored = Flow::Errored {
            message: "boom".into(),
            code: None,
        };
        let (phase, error) = terminal_phase(&Flow::Halted, Some(&errored));
        assert_eq!(phase, RunPhase::Errored);
        assert!(error.unwrap().is_run_error());

        assert_eq!(
            terminal_phase(&Flow::Halted, Some(&Flow::Finished)).0,
            RunPhase::Finished
        );
        assert_eq!(terminal_phase(&Flow::Halted, None).0, RunPhase::Closed);
    }

    #[test]
    fn test_run_phase() {
        assert!(!RunPhase::Streaming.is_terminal());
        assert!(RunPhase::Closed.is_terminal());
        assert_eq!(RunPhase::Errored.to_string(), "errored");
    }
}
