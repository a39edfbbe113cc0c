//! Transport between the client and the agent backend.
//!
//! A run is started with a JSON `POST`, then its events are read from a
//! server-sent event stream scoped to the returned run id.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::header::ACCEPT;
use reqwest::Client;
use threadline_core::RunId;
use threadline_protocol::{RunAgentInput, RunStartResponse};
use threadline_streaming::SseStream;
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Raw event payloads of a run, in arrival order.
pub type EventPayloadStream = BoxStream<'static, Result<String, ClientError>>;

/// Starts runs and subscribes to their events.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start a run.
    async fn start_run(&self, input: &RunAgentInput) -> Result<RunStartResponse, ClientError>;

    /// Subscribe to the events of a started run.
    async fn subscribe(&self, run_id: &RunId) -> Result<EventPayloadStream, ClientError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn start_run(&self, input: &RunAgentInput) -> Result<RunStartResponse, ClientError> {
        (**self).start_run(input).await
    }

    async fn subscribe(&self, run_id: &RunId) -> Result<EventPayloadStream, ClientError> {
        (**self).subscribe(run_id).await
    }
}

/// HTTP and SSE transport built on reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Create a transport with its own HTTP client.
    pub fn new(config: ClientConfig) -> Self {
        let client = config.build_client();
        Self { client, config }
    }

    /// Create a transport sharing an existing HTTP client.
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    /// The transport configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip_all, fields(thread_id = %input.thread_id, run_id = %input.run_id))]
    async fn start_run(&self, input: &RunAgentInput) -> Result<RunStartResponse, ClientError> {
        let url = self.config.start_url()?;
        let mut request = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(input);
        if let Some(timeout) = self.config.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::StartRequest {
                status: status.as_u16(),
                body,
            });
        }

        let started: RunStartResponse = response.json().await?;
        if started.run_id.is_empty() {
            return Err(ClientError::MissingRunId);
        }
        debug!(server_run_id = %started.run_id, "Run started");
        Ok(started)
    }

    #[instrument(skip_all, fields(run_id = %run_id))]
    async fn subscribe(&self, run_id: &RunId) -> Result<EventPayloadStream, ClientError> {
        let url = self.config.stream_url(run_id)?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::connection(format!(
                "event stream returned status {}",
                status
            )));
        }
        debug!("Subscribed to event stream");

        let bytes = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
            .boxed();
        let payloads = SseStream::new(bytes)
            .map_ok(|event| event.data)
            .map_err(ClientError::from);
        Ok(payloads.boxed())
    }
}
