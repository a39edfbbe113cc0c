//! ID generation utilities.
//!
//! Threads, runs, messages and tool calls are all addressed by string
//! identifiers. Server-issued identifiers are taken verbatim; identifiers the
//! client has to mint itself come from the generators below.

use uuid::Uuid;

/// Generate a thread ID.
///
/// Threads use a bare hyphenated UUID v4, matching what browser clients send.
///
/// # Example
///
/// ```rust
/// use threadline_core::identifier::generate_thread_id;
///
/// let id = generate_thread_id();
/// assert_eq!(id.len(), 36);
/// ```
#[must_use]
pub fn generate_thread_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a unique run ID.
///
/// Returns a UUID v4 string prefixed with "run_".
///
/// # Example
///
/// ```rust
/// use threadline_core::identifier::generate_run_id;
///
/// let id = generate_run_id();
/// assert!(id.starts_with("run_"));
/// ```
#[must_use]
pub fn generate_run_id() -> String {
    format!("run_{}", Uuid::new_v4().simple())
}

/// Generate a unique message ID, prefixed with "msg_".
#[must_use]
pub fn generate_message_id() -> String {
    format!("msg_{}", Uuid::new_v4().simple())
}

/// Generate a unique tool call ID, prefixed with "call_".
#[must_use]
pub fn generate_tool_call_id() -> String {
    format!("call_{}", Uuid::new_v4().simple())
}

/// Milliseconds since the Unix epoch, as carried in event timestamps.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $generate:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mint a fresh identifier.
            #[must_use]
            pub fn new() -> Self {
                Self($generate())
            }

            /// Wrap an existing identifier.
            #[must_use]
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is the empty string.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Consume the wrapper, returning the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifies a conversation. Created client-side before any run starts.
    ThreadId,
    generate_thread_id
);

string_id!(
    /// Identifies one request/response cycle within a thread.
    RunId,
    generate_run_id
);

string_id!(
    /// Identifies a message within a transcript.
    MessageId,
    generate_message_id
);

string_id!(
    /// Identifies a tool call within a run.
    ToolCallId,
    generate_tool_call_id
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_generate_prefixes() {
        assert!(generate_run_id().starts_with("run_"));
        assert!(generate_message_id().starts_with("msg_"));
        assert_eq!(generate_tool_call_id().len(), 37);
    }

    #[test]
    fn test_thread_id_is_plain_uuid() {
        let id = ThreadId::new();
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_generate_unique_ids() {
        assert_ne!(MessageId::new(), MessageId::new());
    }

    #[test]
    fn test_from_string_keeps_value() {
        let id = ToolCallId::from_string("t1");
        assert_eq!(id.as_str(), "t1");
        assert_eq!(id.to_string(), "t1");
        assert!(!id.is_empty());
        assert!(ToolCallId::from("").is_empty());
    }

    #[test]
    fn test_borrow_allows_str_lookup() {
        let mut map = HashMap::new();
        map.insert(MessageId::from("m1"), 1);
        assert_eq!(map.get("m1"), Some(&1));
    }

    #[test]
    fn test_serializes_transparently() {
        let id = RunId::from("run_abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""run_abc""#);
    }
}
