//! # threadline-core
//!
//! Core types shared by every threadline crate.
//!
//! - **Identifiers**: type-safe IDs for threads, runs, messages and tool calls
//! - **Messages**: the role-tagged transcript model
//!
//! ## Example
//!
//! ```rust
//! use threadline_core::{Message, Role, ToolCall};
//!
//! let mut msg = Message::assistant("m1", None);
//! if let Some(assistant) = msg.as_assistant_mut() {
//!     assistant.tool_calls.push(ToolCall::new("t1", "setTheme"));
//! }
//! assert_eq!(msg.role(), Role::Assistant);
//! assert_eq!(msg.tool_calls().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod identifier;
pub mod message;

pub use identifier::{MessageId, RunId, ThreadId, ToolCallId};
pub use message::{
    AssistantMessage, Message, Role, TextMessage, ToolCall, ToolCallState, ToolMessage,
};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::identifier::{
        generate_message_id, MessageId, RunId, ThreadId, ToolCallId,
    };
    pub use crate::message::{Message, Role, ToolCall, ToolCallState};
}
