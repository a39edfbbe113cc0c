//! # threadline-streaming
//!
//! Server-Sent Events support for threadline.
//!
//! - **[`SseParser`]**: incremental, chunk-boundary agnostic SSE parser
//! - **[`SseStream`]**: adapter from an async byte stream to parsed events
//!
//! ## Example
//!
//! ```rust
//! use threadline_streaming::SseParser;
//!
//! let mut parser = SseParser::new();
//! parser.feed_str("data: {\"type\":\"RUN_STARTED\"}\n").unwrap();
//! parser.feed_str("\n").unwrap();
//!
//! let event = parser.next_event().unwrap();
//! assert_eq!(event.data, r#"{"type":"RUN_STARTED"}"#);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod sse;

pub use error::{StreamError, StreamResult};
pub use sse::{SseEvent, SseParser, SseStream, MAX_BUFFER_SIZE};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::error::{StreamError, StreamResult};
    pub use crate::sse::{SseEvent, SseParser, SseStream};
}
