//! Client configuration.

use std::str::FromStr;
use std::time::Duration;

use reqwest::Client;
use threadline_core::RunId;
use url::Url;

use crate::error::ClientError;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";
/// Default path of the run start endpoint, relative to the base URL.
pub const DEFAULT_START_PATH: &str = "/chat/start";
/// Default path of the event stream endpoint; the run id is appended.
pub const DEFAULT_STREAM_PATH: &str = "/chat/stream";
/// Default capacity of the event queue between reader and interpreter.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// How content and argument deltas combine with what is already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeltaMode {
    /// Each delta is the full current value and replaces the previous one.
    #[default]
    Snapshot,
    /// Each delta is a fragment appended to the previous value.
    Incremental,
}

impl FromStr for DeltaMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshot" | "replace" => Ok(Self::Snapshot),
            "incremental" | "append" => Ok(Self::Incremental),
            other => Err(ClientError::Config(format!("unknown delta mode '{}'", other))),
        }
    }
}

/// Backend endpoints and run behaviour.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL all endpoint paths are appended to.
    pub base_url: Url,
    /// Run start endpoint path.
    pub start_path: String,
    /// Event stream endpoint path.
    pub stream_path: String,
    /// Timeout for the run start request. Streams are never timed out.
    pub timeout: Option<Duration>,
    /// Delta accumulation mode.
    pub delta_mode: DeltaMode,
    /// Events buffered between the stream reader and the interpreter.
    pub queue_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL"),
            start_path: DEFAULT_START_PATH.to_string(),
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            timeout: None,
            delta_mode: DeltaMode::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `url` does not parse or cannot take
    /// a path.
    pub fn with_base_url(mut self, url: &str) -> Result<Self, ClientError> {
        self.base_url = parse_base_url(url)?;
        Ok(self)
    }

    /// Set the run start path.
    #[must_use]
    pub fn with_start_path(mut self, path: impl Into<String>) -> Self {
        self.start_path = path.into();
        self
    }

    /// Set the event stream path.
    #[must_use]
    pub fn with_stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    /// Set the run start timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
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

    /// Load from environment variables.
    ///
    /// Looks for:
    /// - `BACKEND_URL`
    /// - `BACKEND_TIMEOUT_SECS`
    /// - `BACKEND_DELTA_MODE` (`snapshot` or `incremental`)
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ClientError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("BACKEND_URL") {
            config.base_url = parse_base_url(&url)?;
        }
        if let Ok(secs) = std::env::var("BACKEND_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| ClientError::Config(format!("invalid BACKEND_TIMEOUT_SECS '{}'", secs)))?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        if let Ok(mode) = std::env::var("BACKEND_DELTA_MODE") {
            config.delta_mode = mode.parse()?;
        }

        Ok(config)
    }

    /// Full URL of the run start endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the base URL cannot take a path.
    pub fn start_url(&self) -> Result<Url, ClientError> {
        self.endpoint(&self.start_path)
    }

    /// Full URL of the event stream for `run_id`. The id is percent-encoded
    /// as a single path segment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the base URL cannot take a path.
    pub fn stream_url(&self, run_id: &RunId) -> Result<Url, ClientError> {
        let mut url = self.endpoint(&self.stream_path)?;
        segments(&mut url)?.push(run_id.as_str());
        Ok(url)
    }

    /// Build an HTTP client with this config.
    pub fn build_client(&self) -> Client {
        Client::builder().build().unwrap_or_default()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        segments(&mut url)?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }
}

fn segments(url: &mut Url) -> Result<url::PathSegmentsMut<'_>, ClientError> {
    let display = url.to_string();
    url.path_segments_mut()
        .map_err(|_| ClientError::Config(format!("'{}' cannot be a base URL", display)))
}

fn parse_base_url(url: &str) -> Result<Url, ClientError> {
    let parsed = Url::parse(url)
        .map_err(|e| ClientError::Config(format!("invalid base URL '{}': {}", url, e)))?;
    if parsed.cannot_be_a_base() {
        return Err(ClientError::Config(format!("'{}' cannot be a base URL", url)));
    }
    Ok(parsed)
}
