//! Event framing for transmission.

use crate::event::Event;

/// Output format for encoded events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Server-Sent Events format.
    #[default]
    Sse,
    /// Newline-delimited JSON format.
    Ndjson,
}

/// Encode an event as a single frame.
///
/// # Errors
///
/// Returns an error if the event cannot be serialized.
pub fn encode_event(event: &Event, format: OutputFormat) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(match format {
        OutputFormat::Sse => format!("data: {}\n\n", json),
        OutputFormat::Ndjson => format!("{}\n", json),
    })
}

/// Encode a sequence of events into one body.
///
/// # Errors
///
/// Returns the first serialization error encountered.
pub fn encode_events<'a, I>(events: I, format: OutputFormat) -> Result<String, serde_json::Error>
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .map(|event| encode_event(event, format))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{RunFinishedEvent, TextMessageEndEvent};

    #[test]
    fn test_encode_event_sse() {
        let event: Event = TextMessageEndEvent::new("m1").into();
        let encoded = encode_event(&event, OutputFormat::Sse).unwrap();
        assert!(encoded.starts_with("data: {"));
        assert!(encoded.ends_with("}\n\n"));
    }

    #[test]
    fn test_encode_event_ndjson() {
        let event: Event = TextMessageEndEvent::new("m1").into();
        let encoded = encode_event(&event, OutputFormat::Ndjson).unwrap();
        assert!(encoded.starts_with('{'));
        assert!(encoded.ends_with("}\n"));
        assert_eq!(encoded.matches('\n').count(), 1);
    }

    #[test]
    fn test_encode_events_concatenates_frames() {
        let events: Vec<Event> = vec![
            TextMessageEndEvent::new("m1").into(),
            RunFinishedEvent::new().into(),
        ];
        let body = encode_events(&events, OutputFormat::Sse).unwrap();
        assert_eq!(body.matches("data: ").count(), 2);
        assert!(body.contains("RUN_FINISHED"));
    }
}
