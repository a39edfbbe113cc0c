//! Server-Sent Events (SSE) parsing.
//!
//! [`SseParser`] turns arbitrarily chunked text into complete events;
//! [`SseStream`] drives it from an async byte stream such as an HTTP body.

use crate::error::{StreamError, StreamResult};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Upper bound on buffered, not yet delimited input.
pub const MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// A parsed SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name (if specified).
    pub event: Option<String>,
    /// Event data; multiple `data:` lines are joined with `\n`.
    pub data: String,
    /// Event ID (if specified).
    pub id: Option<String>,
    /// Reconnection time in milliseconds (if specified).
    pub retry: Option<u64>,
}

impl SseEvent {
    /// Create an event carrying only data.
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
            id: None,
            retry: None,
        }
    }

    /// Set the event name.
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Parse the data as JSON.
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.data)
    }

    /// Render the event back into wire form.
    #[must_use]
    pub fn to_frame(&self) -> String {
        let mut frame = String::new();
        if let Some(event) = &self.event {
            frame.push_str(&format!("event: {}\n", event));
        }
        if let Some(id) = &self.id {
            frame.push_str(&format!("id: {}\n", id));
        }
        if let Some(retry) = self.retry {
            frame.push_str(&format!("retry: {}\n", retry));
        }
        for line in self.data.split('\n') {
            frame.push_str(&format!("data: {}\n", line));
        }
        frame.push('\n');
        frame
    }
}

/// Incremental parser for Server-Sent Events.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    /// Trailing bytes of a UTF-8 sequence split across chunks.
    partial: Vec<u8>,
    events: VecDeque<SseEvent>,
    last_event_id: Option<String>,
}

impl SseParser {
    /// Create a new SSE parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes into the parser.
    ///
    /// A multi-byte character split across chunks is held back until the
    /// rest of it arrives. Invalid sequences decode to U+FFFD.
    ///
    /// Returns the number of events completed by this chunk.
    pub fn feed(&mut self, bytes: &Bytes) -> StreamResult<usize> {
        self.partial.extend_from_slice(bytes);
        let text = decode_utf8_prefix(&mut self.partial);
        self.feed_str(&text)
    }

    /// Feed text into the parser.
    ///
    /// Returns the number of events completed by this chunk.
    pub fn feed_str(&mut self, s: &str) -> StreamResult<usize> {
        self.buffer.push_str(s);
        let completed = self.drain_complete();

        if self.buffer.len() > MAX_BUFFER_SIZE {
            return Err(StreamError::BufferOverflow {
                limit: MAX_BUFFER_SIZE,
            });
        }

        Ok(completed)
    }

    /// Flush a trailing event that was not followed by a blank line.
    ///
    /// Call once the underlying stream has ended.
    pub fn finish(&mut self) -> usize {
        if !self.partial.is_empty() {
            let tail = std::mem::take(&mut self.partial);
            self.buffer.push_str(&String::from_utf8_lossy(&tail));
        }
        let mut completed = self.drain_complete();
        let rest = std::mem::take(&mut self.buffer);
        if !rest.trim().is_empty() && self.push_block(&rest) {
            completed += 1;
        }
        completed
    }

    /// Take the next completed event.
    pub fn next_event(&mut self) -> Option<SseEvent> {
        self.events.pop_front()
    }

    /// Check if there are completed events waiting.
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// The most recent `id:` seen.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    fn drain_complete(&mut self) -> usize {
        let mut completed = 0;
        while let Some((pos, delimiter_len)) = find_event_boundary(&self.buffer) {
            let block: String = self.buffer.drain(..pos + delimiter_len).collect();
            if self.push_block(&block[..pos]) {
                completed += 1;
            }
        }
        completed
    }

    fn push_block(&mut self, block: &str) -> bool {
        match parse_block(block) {
            Some(event) => {
                if let Some(id) = &event.id {
                    self.last_event_id = Some(id.clone());
                }
                self.events.push_back(event);
                true
            }
            None => false,
        }
    }
}

/// Decode the longest complete prefix of `bytes`, leaving an unfinished
/// trailing sequence in place.
fn decode_utf8_prefix(bytes: &mut Vec<u8>) -> String {
    let mut text = String::with_capacity(bytes.len());
    let mut start = 0;
    loop {
        match std::str::from_utf8(&bytes[start..]) {
            Ok(valid) => {
                text.push_str(valid);
                bytes.clear();
                return text;
            }
            Err(e) => {
                let valid_end = start + e.valid_up_to();
                text.push_str(std::str::from_utf8(&bytes[start..valid_end]).unwrap_or_default());
                match e.error_len() {
                    Some(len) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        start = valid_end + len;
                    }
                    None => {
                        bytes.drain(..valid_end);
                        return text;
                    }
                }
            }
        }
    }
}

fn find_event_boundary(buffer: &str) -> Option<(usize, usize)> {
    ["\r\n\r\n", "\n\n", "\r\r"]
        .iter()
        .filter_map(|delimiter| buffer.find(delimiter).map(|pos| (pos, delimiter.len())))
        .min_by_key(|(pos, _)| *pos)
}

fn parse_block(block: &str) -> Option<SseEvent> {
    let mut event = None;
    let mut data_lines: Vec<&str> = Vec::new();
    let mut id = None;
    let mut retry = None;

    for line in block.split(['\n', '\r']) {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => event = Some(value.to_string()),
            "data" => data_lines.push(value),
            "id" => id = Some(value.to_string()),
            "retry" => retry = value.trim().parse().ok(),
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    Some(SseEvent {
        event,
        data: data_lines.join("\n"),
        id,
        retry,
    })
}

pin_project! {
    /// Stream adapter that parses SSE from a byte stream.
    pub struct SseStream<S> {
        #[pin]
        inner: S,
        parser: SseParser,
        finished: bool,
    }
}

impl<S> SseStream<S>
where
    S: Stream<Item = Result<Bytes, std::io::Error>>,
{
    /// Create a new SSE stream from a byte stream.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            parser: SseParser::new(),
            finished: false,
        }
    }
}

impl<S> Stream for SseStream<S>
where
    S: Stream<Item = Result<Bytes, std::io::Error>> + Unpin,
{
    type Item = StreamResult<SseEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(event) = this.parser.next_event() {
                return Poll::Ready(Some(Ok(event)));
            }

            if *this.finished {
                return Poll::Ready(None);
            }

            match this.inner.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    if let Err(error) = this.parser.feed(&bytes) {
                        *this.finished = true;
                        return Poll::Ready(Some(Err(error)));
                    }
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(StreamError::Io(e)))),
                Poll::Ready(None) => {
                    *this.finished = true;
                    this.parser.finish();
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_sse_parser_basic() {
        let mut parser = SseParser::new();
        assert_eq!(parser.feed_str("data: hello\n\n").unwrap(), 1);

        let event = parser.next_event().unwrap();
        assert_eq!(event.data, "hello");
        assert!(event.event.is_none());
    }

    #[test]
    fn test_sse_parser_with_event_name() {
        let mut parser = SseParser::new();
        parser.feed_str("event: message\ndata: hello\n\n").unwrap();

        let event = parser.next_event().unwrap();
        assert_eq!(event.event.as_deref(), Some("message"));
        assert_eq!(event.data, "hello");
    }

    #[test]
    fn test_sse_parser_multiline_data() {
        let mut parser = SseParser::new();
        parser.feed_str("data: line1\ndata: line2\n\n").unwrap();
        assert_eq!(parser.next_event().unwrap().data, "line1\nline2");
    }

    #[test]
    fn test_sse_parser_crlf_boundaries() {
        let mut parser = SseParser::new();
        parser
            .feed_str("data: first\r\n\r\ndata: second\r\n\r\n")
            .unwrap();

        assert_eq!(parser.next_event().unwrap().data, "first");
        assert_eq!(parser.next_event().unwrap().data, "second");
        assert!(parser.next_event().is_none());
    }

    #[test]
    fn test_sse_parser_keeps_json_colons() {
        let mut parser = SseParser::new();
        parser
            .feed_str("data: {\"type\":\"RUN_STARTED\"}\n\n")
            .unwrap();
        assert_eq!(parser.next_event().unwrap().data, r#"{"type":"RUN_STARTED"}"#);
    }

    #[test]
    fn test_sse_parser_id_and_retry() {
        let mut parser = SseParser::new();
        parser.feed_str("id: 123\nretry: 5000\ndata: hello\n\n").unwrap();

        let event = parser.next_event().unwrap();
        assert_eq!(event.id.as_deref(), Some("123"));
        assert_eq!(event.retry, Some(5000));
        assert_eq!(parser.last_event_id(), Some("123"));
    }

    #[test]
    fn test_sse_parser_ignores_comments_and_dataless_blocks() {
        let mut parser = SseParser::new();
        parser
            .feed_str(": keep-alive\n\nevent: ping\n\n: note\ndata: hello\n\n")
            .unwrap();

        assert_eq!(parser.next_event().unwrap().data, "hello");
        assert!(!parser.has_events());
    }

    #[test]
    fn test_sse_parser_incremental() {
        let mut parser = SseParser::new();

        assert_eq!(parser.feed_str("data: hel").unwrap(), 0);
        assert!(parser.next_event().is_none());

        assert_eq!(parser.feed_str("lo\n").unwrap(), 0);
        assert_eq!(parser.feed_str("\n").unwrap(), 1);
        assert_eq!(parser.next_event().unwrap().data, "hello");
    }

    #[test]
    fn test_sse_parser_finish_flushes_trailing_event() {
        let mut parser = SseParser::new();
        parser.feed_str("data: tail").unwrap();
        assert_eq!(parser.finish(), 1);
        assert_eq!(parser.next_event().unwrap().data, "tail");
    }

    #[test]
    fn test_sse_parser_overflow() {
        let mut parser = SseParser::new();
        let huge = "x".repeat(MAX_BUFFER_SIZE + 1);
        let err = parser.feed_str(&huge).unwrap_err();
        assert!(matches!(err, StreamError::BufferOverflow { .. }));
    }

    #[test]
    fn test_sse_event_to_frame_reparses() {
        let original = SseEvent::data("a\nb").with_event("message");
        let mut parser = SseParser::new();
        parser.feed_str(&original.to_frame()).unwrap();
        assert_eq!(parser.next_event().unwrap(), original);
    }

    #[tokio::test]
    async fn test_sse_stream_across_chunks() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: {\"a\":")),
            Ok(Bytes::from_static(b"1}\n\ndata: two\n")),
            Ok(Bytes::from_static(b"\ndata: three")),
        ];
        let events: Vec<_> = SseStream::new(stream::iter(chunks)).collect().await;

        let data: Vec<String> = events.into_iter().map(|e| e.unwrap().data).collect();
        assert_eq!(data, vec![r#"{"a":1}"#, "two", "three"]);
    }

    #[test]
    fn test_sse_parser_holds_split_utf8() {
        let frame = "data: {\"delta\":\"café\"}\n\n".as_bytes();
        let split = frame.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut parser = SseParser::new();
        assert_eq!(parser.feed(&Bytes::copy_from_slice(&frame[..split])).unwrap(), 0);
        assert_eq!(parser.feed(&Bytes::copy_from_slice(&frame[split..])).unwrap(), 1);
        assert_eq!(parser.next_event().unwrap().data, r#"{"delta":"café"}"#);
    }

    #[test]
    fn test_sse_parser_replaces_invalid_utf8() {
        let mut parser = SseParser::new();
        parser.feed(&Bytes::from_static(b"data: a\xFFb\n\n")).unwrap();
        assert_eq!(parser.next_event().unwrap().data, "a\u{FFFD}b");

        parser.feed(&Bytes::from_static(b"data: cut\xE2\x82")).unwrap();
        assert_eq!(parser.finish(), 1);
        assert_eq!(parser.next_event().unwrap().data, "cut\u{FFFD}");
    }

    #[tokio::test]
    async fn test_sse_stream_multibyte_split_across_chunks() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: {\"delta\":\"caf\xC3")),
            Ok(Bytes::from_static(b"\xA9 \xF0\x9F")),
            Ok(Bytes::from_static(b"\x8C\x99\"}\n\n")),
        ];
        let events: Vec<_> = SseStream::new(stream::iter(chunks)).collect().await;

        let data: Vec<String> = events.into_iter().map(|e| e.unwrap().data).collect();
        assert_eq!(data, vec!["{\"delta\":\"café 🌙\"}"]);
    }

    #[tokio::test]
    async fn test_sse_stream_surfaces_io_errors() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: one\n\n")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let mut stream = SseStream::new(stream::iter(chunks));

        assert_eq!(stream.next().await.unwrap().unwrap().data, "one");
        assert!(matches!(stream.next().await, Some(Err(StreamError::Io(_)))));
    }
}
